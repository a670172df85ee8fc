//! A Cisco-style command console for network controllers, served over SSH.
//!
//! Users log in with a password and type hierarchical commands such as
//! `show switch` or `sh ho 10.0.0.1`. The crate provides:
//!
//! - **Command**: the contract every console command implements
//! - **CommandRegistry**: token trie of commands, shared by all sessions
//! - **Resolver**: prefix matching with exact-match tie-break and verbatim arguments
//! - **Session**: one read-execute-print loop per connection, over any async byte stream
//! - **Commands**: `exit`, `help`, `show switch`, `show host`, `show logging`, ...
//!
//! # Features
//!
//! - `ssh` (default): `russh` server front end and the `ctl-console` binary
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ctl_console::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let logs = ctl_console::logging::init("info")?;
//!     let config = ConsoleConfig::load_or_default("console.ron");
//!
//!     let registry = Arc::new(CommandRegistry::new());
//!     register_builtin_commands(&registry)?;
//!     register_controller_commands(
//!         &registry,
//!         Arc::new(InMemoryInventory::new()),
//!         Arc::new(HttpSwitchStatus::new(&config.rest_url, config.rest_timeout())?),
//!         logs,
//!     )?;
//!
//!     ConsoleServer::new(config, registry).run().await?;
//!     Ok(())
//! }
//! ```

// Core module (transport independent)
pub mod core;

pub mod backend;
pub mod commands;
pub mod config;
pub mod logging;
pub mod session;
pub mod table;

// SSH front end (feature-gated)
#[cfg(feature = "ssh")]
pub mod ssh;

// Re-export core types at crate root for convenience
pub use crate::core::{
    Command, CommandError, CommandHandler, FnCommand,
    CommandRegistry, Lookup, RegistryError,
    TokenTrie, TrieNode, Step,
    Resolution, resolve, complete,
    best_match, subsequence_score, MatchScore,
    tokenize, Token, Tokens,
    Console, OutputLevel,
};

pub use config::{ConfigError, ConsoleConfig};
pub use session::{LineOutcome, Session, SessionConfig, SessionState, StreamConsole};
pub use table::StringTable;

#[cfg(feature = "ssh")]
pub use ssh::{ConsoleServer, ServerError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::{
        Command, CommandError, FnCommand,
        CommandRegistry, RegistryError,
        Resolution, resolve,
        Console, OutputLevel,
    };
    pub use crate::backend::{Device, DeviceService, HttpSwitchStatus, InMemoryInventory, SwitchStatusSource};
    pub use crate::commands::{register_builtin_commands, register_controller_commands};
    pub use crate::config::ConsoleConfig;
    pub use crate::session::{LineOutcome, Session, SessionConfig, SessionState};
    pub use crate::table::StringTable;
    #[cfg(feature = "ssh")]
    pub use crate::ssh::ConsoleServer;
}
