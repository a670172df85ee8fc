//! The capability a command uses to talk to its user.
//!
//! A [`Console`] hides the transport: a command writes lines and may prompt
//! for one more line, and never sees whether the bytes travel over an SSH
//! channel, a TCP socket, or an in-memory pipe in a test.

use async_trait::async_trait;

/// Kind of an output line.
///
/// Consoles that render color use this to pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLevel {
    /// Regular text.
    #[default]
    Info,
    /// A warning, e.g. an ambiguous command.
    Warn,
    /// An error line.
    Error,
}

/// Line-oriented access to the user of one session.
#[async_trait]
pub trait Console: Send {
    /// Identity of the authenticated user.
    fn user(&self) -> &str;

    /// Write one line of text.
    ///
    /// Once the remote side has gone away this is a no-op.
    async fn write_line(&mut self, line: &str) {
        self.write_level(OutputLevel::Info, line).await;
    }

    /// Write one line with a given [`OutputLevel`].
    async fn write_level(&mut self, level: OutputLevel, line: &str);

    /// Prompt for and read one more line.
    ///
    /// Returns `None` when the remote side disconnected.
    async fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// The lines this session has entered so far, oldest first.
    fn history(&self) -> Vec<String>;

    /// Ask the session to terminate after the current command.
    fn close(&mut self);

    /// Whether the session is closing or the peer is gone.
    fn is_closed(&self) -> bool;
}
