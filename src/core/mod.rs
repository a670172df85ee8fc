//! Core console types, independent of any transport.
//!
//! This module provides the fundamental building blocks:
//! - [`Command`] - The contract every console command implements
//! - [`CommandRegistry`] - Shared registry of commands keyed by token path
//! - [`TokenTrie`] - Token-keyed prefix tree backing the registry
//! - [`resolve`] - Maps an input line to a command and its arguments
//! - [`Console`] - What a command may do with its user

mod command;
mod registry;
mod trie;
mod matcher;
mod tokenizer;
mod resolver;
pub(crate) mod console;

pub use command::{Command, CommandError, CommandHandler, FnCommand};
pub use registry::{CommandRegistry, Lookup, RegistryError};
pub use trie::{Step, TokenTrie, TrieNode};
pub use matcher::{MatchScore, best_match, subsequence_score};
pub use tokenizer::{Token, Tokens, ends_with_separator, rest_after, tokenize};
pub use resolver::{Resolution, complete, resolve};
pub use console::{Console, OutputLevel};
