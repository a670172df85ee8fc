//! Line resolution.
//!
//! [`resolve`] turns a raw input line into a [`Resolution`]: the command it
//! names plus the untouched argument tail, a list of ambiguous candidates, or
//! nothing. It is side-effect free and holds no state of its own.

use std::sync::Arc;

use super::{Command, CommandRegistry, Lookup, best_match, ends_with_separator, rest_after, tokenize};

/// Result of resolving one input line.
pub enum Resolution {
    /// The line names a command.
    Resolved {
        /// The command to run.
        command: Arc<dyn Command>,
        /// Everything after the command tokens, internal spacing preserved.
        args: String,
    },
    /// The line matches more than one command.
    Ambiguous {
        /// Full paths of the candidates, sorted.
        candidates: Vec<String>,
        /// The part of the input that was being matched.
        prefix: String,
    },
    /// Nothing matches.
    NotFound {
        /// The input line, trimmed.
        input: String,
        /// Closest registered path, if any looks similar.
        suggestion: Option<String>,
    },
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Resolved { command, args } => f
                .debug_struct("Resolved")
                .field("command", &command.name())
                .field("args", args)
                .finish(),
            Resolution::Ambiguous { candidates, prefix } => f
                .debug_struct("Ambiguous")
                .field("candidates", candidates)
                .field("prefix", prefix)
                .finish(),
            Resolution::NotFound { input, suggestion } => f
                .debug_struct("NotFound")
                .field("input", input)
                .field("suggestion", suggestion)
                .finish(),
        }
    }
}

/// Resolve `line` against `registry`.
///
/// Only as many leading tokens as the matched command path has are treated
/// as the command; the rest of the line is passed through as its argument
/// string.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ctl_console::core::{CommandRegistry, FnCommand, Resolution, resolve};
///
/// let registry = CommandRegistry::new();
/// registry.register(Arc::new(FnCommand::new("show switch", |_| Ok(String::new())))).unwrap();
///
/// match resolve(&registry, "sh sw  00:00:00:00:00:00:00:01") {
///     Resolution::Resolved { command, args } => {
///         assert_eq!(command.name(), "show switch");
///         assert_eq!(args, "00:00:00:00:00:00:00:01");
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn resolve(registry: &CommandRegistry, line: &str) -> Resolution {
    let tokens = tokenize(line);
    let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();

    match registry.lookup(&texts) {
        Lookup::Found { command, consumed } => {
            let end = tokens[consumed - 1].end;
            Resolution::Resolved {
                command,
                args: rest_after(line, end).to_string(),
            }
        }
        Lookup::Ambiguous { candidates, consumed } => {
            // The ambiguous token is included unless the input simply ran out.
            let shown = (consumed + 1).min(tokens.len());
            let prefix = match shown {
                0 => String::new(),
                n => line[tokens[0].start..tokens[n - 1].end].to_string(),
            };
            Resolution::Ambiguous { candidates, prefix }
        }
        Lookup::NotFound => {
            let input = line.trim().to_string();
            let suggestion = if input.is_empty() {
                None
            } else {
                let paths = registry.paths();
                best_match(&input, paths.iter().map(String::as_str)).map(str::to_string)
            };
            Resolution::NotFound { input, suggestion }
        }
    }
}

/// Completion candidates for the last token of `line`.
///
/// When the line ends in whitespace the candidates are every token that may
/// follow; otherwise they are the tokens the last word is a prefix of.
/// Candidates are single tokens, sorted.
pub fn complete(registry: &CommandRegistry, line: &str) -> Vec<String> {
    let tokens = tokenize(line);
    let mut texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();

    let partial = if ends_with_separator(line) || texts.is_empty() {
        ""
    } else {
        texts.pop().unwrap_or("")
    };

    registry.candidates(&texts, partial)
}
