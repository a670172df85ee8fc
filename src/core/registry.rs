//! Command registry.
//!
//! Central storage for all commands, shared read-only by every session.
//! Commands live in a [`TokenTrie`] behind a `RwLock`: lookups take the read
//! lock only long enough to clone an `Arc` out, registration takes the write
//! lock.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use super::{Command, Step, TokenTrie, tokenize};

/// Errors raised while building the registry.
///
/// Both are programming errors in start-up code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A command is already bound at this path.
    #[error("duplicate command path '{0}'")]
    DuplicatePath(String),

    /// The command name has no tokens.
    #[error("invalid command path '{0}'")]
    InvalidPath(String),
}

/// Result of walking the registry with a sequence of input tokens.
pub enum Lookup {
    /// A command was found after consuming `consumed` tokens.
    Found {
        /// The command.
        command: Arc<dyn Command>,
        /// Number of input tokens that named the command.
        consumed: usize,
    },
    /// The walk stopped at a token that matched several siblings, or the
    /// input ended on a node that is only a prefix of longer commands.
    Ambiguous {
        /// Full paths of the candidate commands or command groups.
        candidates: Vec<String>,
        /// Number of input tokens consumed before the ambiguity.
        consumed: usize,
    },
    /// Nothing matched.
    NotFound,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Found { command, consumed } => f
                .debug_struct("Found")
                .field("command", &command.name())
                .field("consumed", consumed)
                .finish(),
            Lookup::Ambiguous { candidates, consumed } => f
                .debug_struct("Ambiguous")
                .field("candidates", candidates)
                .field("consumed", consumed)
                .finish(),
            Lookup::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Central registry for console commands.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ctl_console::core::{CommandRegistry, FnCommand, Lookup};
///
/// let registry = CommandRegistry::new();
/// registry.register(Arc::new(FnCommand::new("show host", |_| Ok(String::new())))).unwrap();
///
/// assert!(matches!(registry.lookup(&["sh", "ho"]), Lookup::Found { consumed: 2, .. }));
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    trie: RwLock<TokenTrie<Arc<dyn Command>>>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TokenTrie<Arc<dyn Command>>> {
        // A panicking writer cannot leave the trie half-updated, so a
        // poisoned lock is still safe to read.
        self.trie.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TokenTrie<Arc<dyn Command>>> {
        self.trie.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a command at the path given by its name.
    pub fn register(&self, command: Arc<dyn Command>) -> Result<(), RegistryError> {
        let name = command.name().to_string();
        let path: Vec<&str> = tokenize(&name).iter().map(|t| t.text).collect();

        if path.is_empty() {
            return Err(RegistryError::InvalidPath(name));
        }

        let mut trie = self.write();
        if trie.contains(&path) {
            return Err(RegistryError::DuplicatePath(path.join(" ")));
        }

        trie.insert(&path, command);
        debug!("Console: registered command '{}'", path.join(" "));
        Ok(())
    }

    /// Remove the command bound at `name`.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Command>> {
        let path: Vec<&str> = tokenize(name).iter().map(|t| t.text).collect();
        if path.is_empty() {
            return None;
        }
        self.write().remove(&path)
    }

    /// Get the command bound at exactly `path` (case-insensitive, no prefixes).
    pub fn get(&self, path: &[&str]) -> Option<Arc<dyn Command>> {
        self.read().get(path).cloned()
    }

    /// Check if a command is bound at exactly `path`.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.read().contains(path)
    }

    /// Get the number of registered commands.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All commands with their display paths, sorted by path.
    pub fn commands(&self) -> Vec<(String, Arc<dyn Command>)> {
        self.read()
            .iter()
            .map(|(path, cmd)| (path, Arc::clone(cmd)))
            .collect()
    }

    /// Display paths of all commands, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.read().iter().map(|(path, _)| path).collect()
    }

    /// Walk the trie with `tokens`.
    ///
    /// At each node the next token descends on an exact match, or on a
    /// prefix of exactly one child. When the walk stops at a command, the
    /// remaining tokens become its arguments; stopping anywhere else is
    /// either an incomplete command or no command at all.
    pub fn lookup(&self, tokens: &[&str]) -> Lookup {
        let trie = self.read();
        let mut node = trie.root();
        let mut path: Vec<&str> = Vec::new();

        for token in tokens {
            match node.step(token) {
                Step::Descend(child) => {
                    node = child;
                    path.push(child.token());
                }
                Step::Ambiguous(siblings) => {
                    return Lookup::Ambiguous {
                        candidates: join_candidates(&path, &siblings),
                        consumed: path.len(),
                    };
                }
                Step::NoMatch => break,
            }
        }

        if let Some(command) = node.value() {
            return Lookup::Found {
                command: Arc::clone(command),
                consumed: path.len(),
            };
        }

        if !path.is_empty() && path.len() == tokens.len() {
            // Ran out of input on a prefix of longer commands.
            return Lookup::Ambiguous {
                candidates: join_candidates(&path, &node.child_tokens()),
                consumed: path.len(),
            };
        }

        Lookup::NotFound
    }

    /// Completion candidates for the token following `complete`.
    ///
    /// `complete` must name an existing node exactly or via unique prefixes;
    /// returns full display tokens of that node's children starting with
    /// `partial`.
    pub fn candidates(&self, complete: &[&str], partial: &str) -> Vec<String> {
        let trie = self.read();
        let mut node = trie.root();

        for token in complete {
            match node.step(token) {
                Step::Descend(child) => node = child,
                _ => return Vec::new(),
            }
        }

        node.children_with_prefix(partial)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.paths())
            .finish()
    }
}

fn join_candidates(prefix: &[&str], tokens: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            if prefix.is_empty() {
                t.to_string()
            } else {
                format!("{} {}", prefix.join(" "), t)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FnCommand;

    fn cmd(name: &'static str) -> Arc<dyn Command> {
        Arc::new(FnCommand::new(name, move |_| Ok(name.to_string())))
    }

    fn registry(names: &[&'static str]) -> CommandRegistry {
        let registry = CommandRegistry::new();
        for &name in names {
            registry.register(cmd(name)).unwrap();
        }
        registry
    }

    fn found(lookup: Lookup) -> (String, usize) {
        match lookup {
            Lookup::Found { command, consumed } => (command.name().to_string(), consumed),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry(&["show", "show host"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&["SHOW", "Host"]));
        assert_eq!(registry.get(&["show"]).unwrap().name(), "show");
        assert!(registry.get(&["sh"]).is_none());
    }

    #[test]
    fn test_duplicate_path() {
        let registry = registry(&["show host"]);
        let err = registry.register(cmd("show  HOST")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicatePath("show HOST".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_path() {
        let registry = CommandRegistry::new();
        let err = registry.register(cmd("   ")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = registry(&["show", "show host"]);
        assert!(registry.unregister("show host").is_some());
        assert!(registry.unregister("show host").is_none());
        assert_eq!(registry.paths(), vec!["show"]);
    }

    #[test]
    fn test_lookup_exact_and_prefix() {
        let registry = registry(&["show", "show switch", "show host", "exit"]);
        assert_eq!(found(registry.lookup(&["show", "switch"])), ("show switch".into(), 2));
        assert_eq!(found(registry.lookup(&["sh", "sw"])), ("show switch".into(), 2));
        assert_eq!(found(registry.lookup(&["sh"])), ("show".into(), 1));
        assert_eq!(found(registry.lookup(&["e"])), ("exit".into(), 1));
    }

    #[test]
    fn test_lookup_extra_tokens_are_arguments() {
        let registry = registry(&["show", "show switch"]);
        assert_eq!(found(registry.lookup(&["show", "switch", "all"])), ("show switch".into(), 2));
        assert_eq!(found(registry.lookup(&["show", "xyz"])), ("show".into(), 1));
    }

    #[test]
    fn test_lookup_ambiguous() {
        let registry = registry(&["show host", "show history", "show switch"]);
        match registry.lookup(&["show", "h"]) {
            Lookup::Ambiguous { candidates, consumed } => {
                assert_eq!(candidates, vec!["show history", "show host"]);
                assert_eq!(consumed, 1);
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_incomplete_command() {
        let registry = registry(&["show host", "show switch"]);
        match registry.lookup(&["show"]) {
            Lookup::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["show host", "show switch"]);
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
        assert!(matches!(registry.lookup(&["show", "vlan"]), Lookup::NotFound));
    }

    #[test]
    fn test_lookup_unmatched_token_below_command() {
        let registry = registry(&["show", "show ip route"]);
        assert!(matches!(registry.lookup(&["show", "ip", "bgp"]), Lookup::NotFound));
        assert_eq!(found(registry.lookup(&["show", "vlan", "10"])), ("show".into(), 1));
        assert_eq!(found(registry.lookup(&["show", "ip", "ro", "x"])), ("show ip route".into(), 3));
        assert!(matches!(registry.lookup(&["show", "ip"]), Lookup::Ambiguous { consumed: 2, .. }));
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = registry(&["show", "exit"]);
        assert!(matches!(registry.lookup(&["reload"]), Lookup::NotFound));
        assert!(matches!(registry.lookup(&[]), Lookup::NotFound));
    }

    #[test]
    fn test_candidates() {
        let registry = registry(&["show host", "show history", "show switch", "exit"]);
        assert_eq!(registry.candidates(&[], "s"), vec!["show"]);
        assert_eq!(registry.candidates(&["sh"], "h"), vec!["history", "host"]);
        assert!(registry.candidates(&["nope"], "").is_empty());
    }

    #[test]
    fn test_concurrent_lookups_during_registration() {
        let registry = Arc::new(registry(&["show"]));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        assert_eq!(found(registry.lookup(&["show"])).0, "show");
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let name: &'static str = Box::leak(format!("extra {i}").into_boxed_str());
            registry.register(cmd(name)).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.len(), 51);
    }
}
