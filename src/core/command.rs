//! The command contract.
//!
//! A command has a hierarchical, space-separated name such as `"show host"`,
//! optional usage and help text, and one entry point that runs it against a
//! [`Console`] with the argument string the user typed after the name.

use async_trait::async_trait;
use thiserror::Error;

use super::Console;

/// Errors a command reports back to its session.
///
/// These never end a session: the session prints a single error line and
/// shows the next prompt.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The arguments did not fit the command's usage.
    #[error("invalid arguments: {0}")]
    Usage(String),

    /// A backend query failed.
    #[error("backend unavailable: {0}")]
    Backend(String),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A backend answered with something that could not be parsed.
    #[error("malformed response ({reason}): {payload}")]
    Parse {
        /// What was wrong with the payload.
        reason: String,
        /// The raw payload as received.
        payload: String,
    },
}

impl CommandError {
    /// Build a [`CommandError::Parse`] keeping the offending payload.
    pub fn parse(reason: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            payload: payload.into(),
        }
    }
}

/// An executable console command.
///
/// Implementations are registered once in a
/// [`CommandRegistry`](super::CommandRegistry) and shared by every session,
/// so they take `&self` and must be `Send + Sync`.
///
/// # Examples
///
/// ```ignore
/// struct Uptime(std::time::Instant);
///
/// #[async_trait]
/// impl Command for Uptime {
///     fn name(&self) -> &str { "show uptime" }
///
///     async fn execute(&self, _console: &mut dyn Console, _args: &str)
///         -> Result<String, CommandError>
///     {
///         Ok(format!("{:?}", self.0.elapsed()))
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync {
    /// The full command path, tokens separated by single spaces.
    fn name(&self) -> &str;

    /// Argument synopsis, e.g. `"[SWITCH]"`.
    fn usage(&self) -> Option<&str> {
        None
    }

    /// One-line description.
    fn help(&self) -> Option<&str> {
        None
    }

    /// Run the command and return the text to print.
    async fn execute(&self, console: &mut dyn Console, args: &str) -> Result<String, CommandError>;
}

/// Type alias for [`FnCommand`] handlers.
///
/// Handlers receive the argument string and return the output text.
pub type CommandHandler = Box<dyn Fn(&str) -> Result<String, CommandError> + Send + Sync>;

/// A command backed by a synchronous closure.
///
/// # Examples
///
/// ```
/// use ctl_console::core::{Command, FnCommand};
///
/// let echo = FnCommand::new("echo", |args| Ok(args.to_string()))
///     .with_usage("TEXT")
///     .with_help("Print the arguments");
///
/// assert_eq!(echo.name(), "echo");
/// assert_eq!(echo.usage(), Some("TEXT"));
/// ```
pub struct FnCommand {
    name: Box<str>,
    usage: Option<&'static str>,
    help: Option<&'static str>,
    handler: CommandHandler,
}

impl FnCommand {
    /// Create a new command with the given path and handler.
    pub fn new<F>(name: impl Into<Box<str>>, handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            usage: None,
            help: None,
            handler: Box::new(handler),
        }
    }

    /// Set the argument synopsis.
    pub fn with_usage(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

#[async_trait]
impl Command for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn usage(&self) -> Option<&str> {
        self.usage
    }

    fn help(&self) -> Option<&str> {
        self.help
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}
