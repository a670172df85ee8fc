//! [`Console`] over an async byte stream.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::editor::{Input, LineEditor};
use crate::core::{CommandRegistry, Console, OutputLevel, complete, ends_with_separator, tokenize};

const READ_CHUNK: usize = 1024;

/// A console reading keystrokes from `R` and writing terminal output to `W`.
///
/// Output lines are terminated with CRLF. After a write fails the peer is
/// considered gone and every further write is dropped.
pub struct StreamConsole<R, W> {
    user: String,
    reader: R,
    writer: W,
    editor: LineEditor,
    pending: VecDeque<u8>,
    colored: bool,
    closing: bool,
    eof: bool,
    broken: bool,
}

impl<R, W> StreamConsole<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a console for `user`.
    pub fn new(user: impl Into<String>, reader: R, writer: W, editor: LineEditor, colored: bool) -> Self {
        Self {
            user: user.into(),
            reader,
            writer,
            editor,
            pending: VecDeque::new(),
            colored,
            closing: false,
            eof: false,
            broken: false,
        }
    }

    /// Whether the peer has gone away, as opposed to the session closing itself.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.broken
    }

    /// Whether input has ended.
    #[inline]
    pub fn input_ended(&self) -> bool {
        self.eof
    }

    /// Record a command line in the session history.
    pub fn record(&mut self, line: &str) {
        self.editor.record(line);
    }

    /// Read a command line, completing on Tab against `registry`.
    pub async fn read_command(&mut self, prompt: &str, registry: &CommandRegistry) -> Option<String> {
        self.read_with(prompt, Some(registry)).await
    }

    /// Write raw bytes, e.g. a banner.
    pub async fn write_raw(&mut self, text: &str) {
        self.send(text.as_bytes()).await;
    }

    /// Flush and shut down the write half.
    pub async fn shutdown(&mut self) {
        if !self.broken {
            let _ = self.writer.flush().await;
            let _ = self.writer.shutdown().await;
        }
    }

    async fn read_with(&mut self, prompt: &str, registry: Option<&CommandRegistry>) -> Option<String> {
        if self.eof || self.broken {
            return None;
        }
        self.editor.begin(prompt);
        self.send(prompt.as_bytes()).await;

        loop {
            match self.next_input().await? {
                Input::Line(line) => return Some(line),
                Input::Interrupt => {
                    self.editor.begin(prompt);
                    self.send(prompt.as_bytes()).await;
                }
                Input::Eof => {
                    self.eof = true;
                    return None;
                }
                Input::Complete => {
                    if let Some(registry) = registry {
                        self.complete_buffer(registry).await;
                    }
                }
            }
        }
    }

    async fn next_input(&mut self) -> Option<Input> {
        let mut echo = Vec::new();
        loop {
            while let Some(byte) = self.pending.pop_front() {
                if let Some(input) = self.editor.feed(byte, &mut echo) {
                    self.send(&echo).await;
                    return Some(input);
                }
            }
            self.send(&echo).await;
            echo.clear();

            if self.eof {
                return None;
            }
            let mut chunk = [0u8; READ_CHUNK];
            match self.reader.read(&mut chunk).await {
                Ok(0) => {
                    self.eof = true;
                    return None;
                }
                Ok(n) => self.pending.extend(&chunk[..n]),
                Err(e) => {
                    debug!("read from {} failed: {}", self.user, e);
                    self.eof = true;
                    return None;
                }
            }
        }
    }

    async fn complete_buffer(&mut self, registry: &CommandRegistry) {
        let buffer = self.editor.buffer().to_string();
        let candidates = complete(registry, &buffer);
        let partial = if ends_with_separator(&buffer) {
            ""
        } else {
            tokenize(&buffer).last().map(|t| t.text).unwrap_or("")
        };

        let mut out = Vec::new();
        match candidates.as_slice() {
            [] => out.push(0x07),
            [only] => {
                let tail = only.get(partial.len()..).unwrap_or("");
                self.editor.insert_str(&format!("{tail} "), &mut out);
            }
            many => {
                let common = common_prefix(many);
                if common.len() > partial.len() {
                    let tail = common.get(partial.len()..).unwrap_or("");
                    self.editor.insert_str(tail, &mut out);
                } else {
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(many.join("  ").as_bytes());
                    out.extend_from_slice(b"\r\n");
                    self.editor.redraw(&mut out);
                }
            }
        }
        if self.editor.echo() {
            self.send(&out).await;
        }
    }

    async fn send(&mut self, bytes: &[u8]) {
        if self.broken || bytes.is_empty() {
            return;
        }
        let result = async {
            self.writer.write_all(bytes).await?;
            self.writer.flush().await
        }
        .await;
        if let Err(e) = result {
            debug!("peer {} gone: {}", self.user, e);
            self.broken = true;
        }
    }
}

#[async_trait]
impl<R, W> Console for StreamConsole<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn user(&self) -> &str {
        &self.user
    }

    async fn write_level(&mut self, level: OutputLevel, line: &str) {
        let color = match (self.colored, level) {
            (true, OutputLevel::Warn) => Some("\x1b[33m"),
            (true, OutputLevel::Error) => Some("\x1b[31m"),
            _ => None,
        };

        let mut out = String::with_capacity(line.len() + 16);
        for part in line.split('\n') {
            let part = part.strip_suffix('\r').unwrap_or(part);
            match color {
                Some(code) => {
                    out.push_str(code);
                    out.push_str(part);
                    out.push_str("\x1b[0m");
                }
                None => out.push_str(part),
            }
            out.push_str("\r\n");
        }
        self.send(out.as_bytes()).await;
    }

    async fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.read_with(prompt, None).await
    }

    fn history(&self) -> Vec<String> {
        self.editor.history().entries()
    }

    fn close(&mut self) {
        self.closing = true;
    }

    fn is_closed(&self) -> bool {
        self.closing || self.broken
    }
}

fn common_prefix(words: &[String]) -> String {
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };
    let mut len = first.len();
    for word in rest {
        len = first
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a.eq_ignore_ascii_case(b))
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FnCommand;
    use std::sync::Arc;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};

    type TestConsole = StreamConsole<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn console(echo: bool, colored: bool) -> (TestConsole, DuplexStream) {
        let (server, client) = duplex(4096);
        let (reader, writer) = split(server);
        let console = StreamConsole::new("root", reader, writer, LineEditor::new(echo, 10), colored);
        (console, client)
    }

    async fn drain(client: &mut DuplexStream) -> String {
        let mut buf = vec![0u8; 4096];
        let n = client.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[tokio::test]
    async fn test_write_line_uses_crlf() {
        let (mut console, mut client) = console(false, false);
        console.write_line("a\nb\r\nc").await;
        assert_eq!(drain(&mut client).await, "a\r\nb\r\nc\r\n");
    }

    #[tokio::test]
    async fn test_colored_error() {
        let (mut console, mut client) = console(false, true);
        console.write_level(OutputLevel::Error, "% boom").await;
        assert_eq!(drain(&mut client).await, "\x1b[31m% boom\x1b[0m\r\n");
    }

    #[tokio::test]
    async fn test_uncolored_error_is_plain() {
        let (mut console, mut client) = console(false, false);
        console.write_level(OutputLevel::Error, "% boom").await;
        assert_eq!(drain(&mut client).await, "% boom\r\n");
    }

    #[tokio::test]
    async fn test_read_line_keeps_buffered_input() {
        let (mut console, mut client) = console(false, false);
        client.write_all(b"show host\nexit\n").await.unwrap();

        assert_eq!(console.read_line("> ").await.as_deref(), Some("show host"));
        assert_eq!(console.read_line("> ").await.as_deref(), Some("exit"));
    }

    #[tokio::test]
    async fn test_read_after_eof_is_none() {
        let (mut console, client) = console(false, false);
        drop(client);
        assert_eq!(console.read_line("> ").await, None);
        assert!(console.input_ended());
        assert_eq!(console.read_line("> ").await, None);
    }

    #[tokio::test]
    async fn test_writes_after_disconnect_are_noops() {
        let (mut console, client) = console(false, false);
        drop(client);
        console.write_line("into the void").await;
        console.write_line("again").await;
        assert!(console.is_disconnected());
        assert!(console.is_closed());
    }

    #[tokio::test]
    async fn test_ctrl_d_ends_input() {
        let (mut console, mut client) = console(true, false);
        client.write_all(b"\x04").await.unwrap();
        assert_eq!(console.read_line("> ").await, None);
        assert!(!console.is_disconnected());
    }

    #[tokio::test]
    async fn test_tab_completes_unique_token() {
        let registry = CommandRegistry::new();
        for name in ["show host", "show switch", "exit"] {
            registry
                .register(Arc::new(FnCommand::new(name, |_| Ok(String::new()))))
                .unwrap();
        }

        let (mut console, mut client) = console(true, false);
        client.write_all(b"sh\tsw\t\r").await.unwrap();
        let line = console.read_command("> ", &registry).await;
        assert_eq!(line.as_deref(), Some("show switch "));

        let echoed = drain(&mut client).await;
        assert!(echoed.starts_with("> show switch "));
    }

    #[tokio::test]
    async fn test_tab_lists_ambiguous_candidates() {
        let registry = CommandRegistry::new();
        for name in ["show host", "show history"] {
            registry
                .register(Arc::new(FnCommand::new(name, |_| Ok(String::new()))))
                .unwrap();
        }

        let (mut console, mut client) = console(true, false);
        client.write_all(b"show h\t\x03").await.unwrap();
        client.write_all(b"x\r").await.unwrap();
        assert_eq!(console.read_command("> ", &registry).await.as_deref(), Some("x"));

        let echoed = drain(&mut client).await;
        assert!(echoed.contains("history  host"));
    }

    #[test]
    fn test_common_prefix() {
        let words = vec!["history".to_string(), "host".to_string()];
        assert_eq!(common_prefix(&words), "h");
        assert_eq!(common_prefix(&["abc".to_string()]), "abc");
        assert_eq!(common_prefix(&[]), "");
    }
}
