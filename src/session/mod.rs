//! Per-connection read-execute-print loop.
//!
//! A [`Session`] owns everything one connected user has: their console, line
//! buffer and history. The only thing it shares with other sessions is the
//! [`CommandRegistry`], which it reads.

mod editor;
mod stream;

pub use editor::{DEFAULT_MAX_LINE_LENGTH, History, Input, LineEditor};
pub use stream::StreamConsole;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::core::{CommandRegistry, Console, OutputLevel, Resolution, resolve};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Authenticated and waiting for input.
    Connected,
    /// A command is running.
    Executing,
    /// Exit was requested or the peer went away.
    Closing,
    /// Terminal state; the console has been released.
    Closed,
}

/// How a single input line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line; nothing ran.
    Skipped,
    /// The command ran and succeeded.
    Succeeded,
    /// The command ran and returned an error.
    Failed,
    /// The line was ambiguous or named no command.
    Unresolved,
}

impl LineOutcome {
    /// Exit status reported for a non-interactive command.
    pub fn exit_status(self) -> u32 {
        match self {
            LineOutcome::Skipped | LineOutcome::Succeeded => 0,
            LineOutcome::Failed => 1,
            LineOutcome::Unresolved => 127,
        }
    }
}

/// Presentation settings for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prompt written before every line.
    pub prompt: String,
    /// Text written once when the session starts.
    pub banner: Option<String>,
    /// Number of lines kept in the history.
    pub history_size: usize,
    /// Longest input line accepted, in bytes; further input is dropped.
    pub max_line_length: usize,
    /// Echo typed characters and interpret editing keys (PTY clients).
    pub echo: bool,
    /// Render error lines in color.
    pub colored: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: "controller> ".to_string(),
            banner: None,
            history_size: 100,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            echo: false,
            colored: false,
        }
    }
}

/// One connected user's console loop.
pub struct Session<R, W> {
    id: u64,
    registry: Arc<CommandRegistry>,
    console: StreamConsole<R, W>,
    prompt: String,
    banner: Option<String>,
    state: SessionState,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a session for an already authenticated `user`.
    pub fn new(
        id: u64,
        user: impl Into<String>,
        registry: Arc<CommandRegistry>,
        config: &SessionConfig,
        reader: R,
        writer: W,
    ) -> Self {
        let editor = LineEditor::new(config.echo, config.history_size).with_max_line(config.max_line_length);
        Self {
            id,
            registry,
            console: StreamConsole::new(user, reader, writer, editor, config.colored),
            prompt: config.prompt.clone(),
            banner: config.banner.clone(),
            state: SessionState::Connected,
        }
    }

    /// Session identifier, unique per server.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the loop until exit, EOF or disconnect and return the final state.
    pub async fn run(&mut self) -> SessionState {
        info!(session = self.id, user = self.console.user(), "session started");

        if let Some(banner) = self.banner.clone() {
            self.console.write_line(&banner).await;
        }

        while self.state == SessionState::Connected {
            let Some(line) = self.console.read_command(&self.prompt, &self.registry).await else {
                self.state = SessionState::Closing;
                break;
            };
            self.execute_line(&line).await;
        }

        self.finish().await
    }

    /// Run a single line and report how it went.
    ///
    /// Blank lines are skipped. Resolution failures and command errors are
    /// written as one line each and never end the session; whether it goes
    /// on is visible through [`Session::state`].
    pub async fn execute_line(&mut self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            self.settle();
            return LineOutcome::Skipped;
        }
        self.console.record(line);

        let outcome = match resolve(&self.registry, line) {
            Resolution::Resolved { command, args } => {
                debug!(session = self.id, command = command.name(), args = %args, "executing");
                self.state = SessionState::Executing;
                match command.execute(&mut self.console, &args).await {
                    Ok(output) => {
                        let output = output.trim_end_matches(['\r', '\n']);
                        if !output.is_empty() {
                            self.console.write_line(output).await;
                        }
                        LineOutcome::Succeeded
                    }
                    Err(e) => {
                        debug!(session = self.id, command = command.name(), "command failed: {}", e);
                        self.console
                            .write_level(OutputLevel::Error, &format!("% Error: {e}"))
                            .await;
                        LineOutcome::Failed
                    }
                }
            }
            Resolution::Ambiguous { candidates, prefix } => {
                let message = format!(
                    "% Ambiguous command: \"{}\" ({})",
                    prefix,
                    candidates.join(", ")
                );
                self.console.write_level(OutputLevel::Warn, &message).await;
                LineOutcome::Unresolved
            }
            Resolution::NotFound { input, suggestion } => {
                let message = match suggestion {
                    Some(hint) => format!("% Unrecognized command: \"{input}\" (did you mean \"{hint}\"?)"),
                    None => format!("% Unrecognized command: \"{input}\""),
                };
                self.console.write_level(OutputLevel::Error, &message).await;
                LineOutcome::Unresolved
            }
        };

        self.settle();
        outcome
    }

    /// Move to `Closing` and release the console.
    pub async fn finish(&mut self) -> SessionState {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closing;
            self.console.shutdown().await;
            self.state = SessionState::Closed;
            info!(session = self.id, user = self.console.user(), "session closed");
        }
        self.state
    }

    fn settle(&mut self) {
        self.state = if self.console.is_closed() {
            SessionState::Closing
        } else {
            SessionState::Connected
        };
    }
}
