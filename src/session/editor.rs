//! Line editing over a raw byte stream.
//!
//! PTY clients send keystrokes one by one and expect the server to echo them,
//! so the editor interprets control keys, keeps the line buffer and writes the
//! echo into an output buffer. Without echo it still assembles lines, which is
//! what piped input and tests rely on.

use std::collections::VecDeque;

const BS: u8 = 0x08;
const DEL: u8 = 0x7f;
const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const CTRL_U: u8 = 0x15;
const TAB: u8 = b'\t';
const CR: u8 = b'\r';
const LF: u8 = b'\n';
const BEL: u8 = 0x07;

/// Longest line the editor accepts, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// What a fed byte completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A submitted line, without its terminator.
    Line(String),
    /// Ctrl-C: the current line was discarded.
    Interrupt,
    /// Ctrl-D on an empty line.
    Eof,
    /// Tab: the caller should complete the current buffer.
    Complete,
}

/// Bounded, ordered list of previously entered lines.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    /// Create a history holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Record a line.
    ///
    /// Blank lines and repeats of the newest entry are not recorded.
    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    /// Number of recorded lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry `back` steps from the newest (1 = newest).
    pub fn recent(&self, back: usize) -> Option<&str> {
        let index = self.entries.len().checked_sub(back)?;
        self.entries.get(index).map(String::as_str)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Esc,
    Csi,
}

/// Line editor state for one session.
#[derive(Debug)]
pub struct LineEditor {
    buffer: String,
    prompt: String,
    echo: bool,
    max_line: usize,
    history: History,
    /// Steps back into history while browsing (0 = editing the draft).
    browse: usize,
    draft: String,
    escape: Escape,
    last_cr: bool,
    utf8: Vec<u8>,
}

impl LineEditor {
    /// Create an editor; `echo` enables terminal echo and redraws.
    pub fn new(echo: bool, history_size: usize) -> Self {
        Self {
            buffer: String::new(),
            prompt: String::new(),
            echo,
            max_line: DEFAULT_MAX_LINE_LENGTH,
            history: History::new(history_size),
            browse: 0,
            draft: String::new(),
            escape: Escape::None,
            last_cr: false,
            utf8: Vec::new(),
        }
    }

    /// Limit the line buffer to `bytes`; input past it is dropped.
    pub fn with_max_line(mut self, bytes: usize) -> Self {
        self.max_line = bytes;
        self
    }

    /// The line typed so far.
    #[inline]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether keystrokes are echoed.
    #[inline]
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// The session history.
    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Record a line in the history.
    pub fn record(&mut self, line: &str) {
        self.history.push(line);
    }

    /// Start a new line behind `prompt`.
    pub fn begin(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
        self.buffer.clear();
        self.browse = 0;
        self.draft.clear();
        self.escape = Escape::None;
        self.utf8.clear();
    }

    /// Append text to the buffer, echoing it.
    ///
    /// Text that does not fit below the line limit is refused with a bell.
    pub fn insert_str(&mut self, text: &str, out: &mut Vec<u8>) {
        if !self.fits(text.len(), out) {
            return;
        }
        self.buffer.push_str(text);
        if self.echo {
            out.extend_from_slice(text.as_bytes());
        }
    }

    /// Redraw the prompt and the current buffer on a fresh line.
    pub fn redraw(&self, out: &mut Vec<u8>) {
        if self.echo {
            out.extend_from_slice(b"\r\x1b[K");
            out.extend_from_slice(self.prompt.as_bytes());
            out.extend_from_slice(self.buffer.as_bytes());
        }
    }

    /// Feed one byte; echo goes to `out`.
    pub fn feed(&mut self, byte: u8, out: &mut Vec<u8>) -> Option<Input> {
        let after_cr = std::mem::replace(&mut self.last_cr, false);

        match self.escape {
            Escape::Esc => {
                self.escape = if byte == b'[' || byte == b'O' {
                    Escape::Csi
                } else {
                    Escape::None
                };
                return None;
            }
            Escape::Csi => {
                // Parameters and intermediates until a final byte.
                if (0x40..=0x7e).contains(&byte) {
                    self.escape = Escape::None;
                    match byte {
                        b'A' => self.history_back(out),
                        b'B' => self.history_forward(out),
                        _ => {}
                    }
                }
                return None;
            }
            Escape::None => {}
        }

        if byte >= 0x80 {
            self.feed_utf8(byte, out);
            return None;
        }

        match byte {
            CR => {
                self.last_cr = true;
                Some(self.submit(out))
            }
            LF if after_cr => None,
            LF => Some(self.submit(out)),
            BS | DEL => {
                if self.buffer.pop().is_some() && self.echo {
                    out.extend_from_slice(b"\x08 \x08");
                }
                None
            }
            CTRL_C => {
                self.buffer.clear();
                if self.echo {
                    out.extend_from_slice(b"^C\r\n");
                }
                Some(Input::Interrupt)
            }
            CTRL_D if self.buffer.is_empty() => Some(Input::Eof),
            CTRL_U => {
                if self.echo {
                    for _ in self.buffer.chars() {
                        out.extend_from_slice(b"\x08 \x08");
                    }
                }
                self.buffer.clear();
                None
            }
            TAB => Some(Input::Complete),
            ESC => {
                self.escape = Escape::Esc;
                None
            }
            0x20..=0x7e => {
                if !self.fits(1, out) {
                    return None;
                }
                self.buffer.push(byte as char);
                if self.echo {
                    out.push(byte);
                }
                None
            }
            _ => None,
        }
    }

    fn feed_utf8(&mut self, byte: u8, out: &mut Vec<u8>) {
        self.utf8.push(byte);
        match std::str::from_utf8(&self.utf8) {
            Ok(text) => {
                if !self.fits(text.len(), out) {
                    self.utf8.clear();
                    return;
                }
                self.buffer.push_str(text);
                if self.echo {
                    out.extend_from_slice(&self.utf8);
                }
                self.utf8.clear();
            }
            // Incomplete sequence: wait for more bytes.
            Err(e) if e.error_len().is_none() => {}
            Err(_) => self.utf8.clear(),
        }
    }

    fn fits(&self, extra: usize, out: &mut Vec<u8>) -> bool {
        if self.buffer.len() + extra <= self.max_line {
            return true;
        }
        if self.echo {
            out.push(BEL);
        }
        false
    }

    fn submit(&mut self, out: &mut Vec<u8>) -> Input {
        if self.echo {
            out.extend_from_slice(b"\r\n");
        }
        self.browse = 0;
        self.draft.clear();
        Input::Line(std::mem::take(&mut self.buffer))
    }

    fn history_back(&mut self, out: &mut Vec<u8>) {
        if self.browse >= self.history.len() {
            return;
        }
        if self.browse == 0 {
            self.draft = self.buffer.clone();
        }
        self.browse += 1;
        if let Some(line) = self.history.recent(self.browse) {
            self.buffer = line.to_string();
        }
        self.redraw(out);
    }

    fn history_forward(&mut self, out: &mut Vec<u8>) {
        if self.browse == 0 {
            return;
        }
        self.browse -= 1;
        self.buffer = if self.browse == 0 {
            std::mem::take(&mut self.draft)
        } else {
            self.history.recent(self.browse).unwrap_or_default().to_string()
        };
        self.redraw(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(editor: &mut LineEditor, bytes: &[u8]) -> (Vec<Input>, Vec<u8>) {
        let mut out = Vec::new();
        let inputs = bytes.iter().filter_map(|&b| editor.feed(b, &mut out)).collect();
        (inputs, out)
    }

    #[test]
    fn test_history_bounded_and_deduplicated() {
        let mut history = History::new(2);
        history.push("show host");
        history.push("show host");
        history.push("   ");
        assert_eq!(history.len(), 1);

        history.push("show switch");
        history.push("exit");
        assert_eq!(history.entries(), vec!["show switch", "exit"]);
        assert_eq!(history.recent(1), Some("exit"));
        assert_eq!(history.recent(2), Some("show switch"));
        assert_eq!(history.recent(3), None);
    }

    #[test]
    fn test_history_zero_capacity() {
        let mut history = History::new(0);
        history.push("show");
        assert!(history.is_empty());
    }

    #[test]
    fn test_lines_without_echo() {
        let mut editor = LineEditor::new(false, 10);
        let (inputs, out) = feed_all(&mut editor, b"show host\nexit\r\n");
        assert_eq!(
            inputs,
            vec![Input::Line("show host".into()), Input::Line("exit".into())]
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_crlf_submits_once() {
        let mut editor = LineEditor::new(false, 10);
        let (inputs, _) = feed_all(&mut editor, b"a\r\n\r\nb\n");
        assert_eq!(
            inputs,
            vec![
                Input::Line("a".into()),
                Input::Line("".into()),
                Input::Line("b".into())
            ]
        );
    }

    #[test]
    fn test_echo_and_backspace() {
        let mut editor = LineEditor::new(true, 10);
        let (inputs, out) = feed_all(&mut editor, b"shx\x7fow\r");
        assert_eq!(inputs, vec![Input::Line("show".into())]);
        assert_eq!(out, b"shx\x08 \x08ow\r\n");
    }

    #[test]
    fn test_backspace_on_empty_line_is_silent() {
        let mut editor = LineEditor::new(true, 10);
        let (inputs, out) = feed_all(&mut editor, b"\x7f\x08");
        assert!(inputs.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_ctrl_c_discards_line() {
        let mut editor = LineEditor::new(true, 10);
        let (inputs, _) = feed_all(&mut editor, b"show\x03");
        assert_eq!(inputs, vec![Input::Interrupt]);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_ctrl_d_only_on_empty_line() {
        let mut editor = LineEditor::new(false, 10);
        let (inputs, _) = feed_all(&mut editor, b"x\x04");
        assert!(inputs.is_empty());

        let (inputs, _) = feed_all(&mut editor, b"\x7f\x04");
        assert_eq!(inputs, vec![Input::Eof]);
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut editor = LineEditor::new(false, 10);
        let (inputs, _) = feed_all(&mut editor, b"garbage\x15exit\n");
        assert_eq!(inputs, vec![Input::Line("exit".into())]);
    }

    #[test]
    fn test_tab_requests_completion() {
        let mut editor = LineEditor::new(true, 10);
        let (inputs, _) = feed_all(&mut editor, b"sh\t");
        assert_eq!(inputs, vec![Input::Complete]);
        assert_eq!(editor.buffer(), "sh");

        let mut out = Vec::new();
        editor.insert_str("ow ", &mut out);
        assert_eq!(editor.buffer(), "show ");
        assert_eq!(out, b"ow ");
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut editor = LineEditor::new(false, 10);
        editor.record("show host");
        editor.record("show switch");
        editor.begin("> ");

        feed_all(&mut editor, b"dra");
        feed_all(&mut editor, b"\x1b[A");
        assert_eq!(editor.buffer(), "show switch");
        feed_all(&mut editor, b"\x1b[A");
        assert_eq!(editor.buffer(), "show host");
        feed_all(&mut editor, b"\x1b[A");
        assert_eq!(editor.buffer(), "show host");
        feed_all(&mut editor, b"\x1b[B");
        assert_eq!(editor.buffer(), "show switch");
        feed_all(&mut editor, b"\x1b[B");
        assert_eq!(editor.buffer(), "dra");
    }

    #[test]
    fn test_history_redraw_with_echo() {
        let mut editor = LineEditor::new(true, 10);
        editor.record("exit");
        editor.begin("> ");
        let (_, out) = feed_all(&mut editor, b"\x1bOA");
        assert_eq!(out, b"\r\x1b[K> exit");
    }

    #[test]
    fn test_unknown_escape_ignored() {
        let mut editor = LineEditor::new(false, 10);
        let (inputs, _) = feed_all(&mut editor, b"a\x1b[3~b\x1b[Cc\n");
        assert_eq!(inputs, vec![Input::Line("abc".into())]);
    }

    #[test]
    fn test_line_length_bounded() {
        let mut editor = LineEditor::new(false, 10).with_max_line(8);
        let long = vec![b'a'; 1 << 20];
        let (inputs, out) = feed_all(&mut editor, &long);
        assert!(inputs.is_empty());
        assert!(out.is_empty());
        assert_eq!(editor.buffer(), "aaaaaaaa");

        let (inputs, _) = feed_all(&mut editor, b"\x7fb\n");
        assert_eq!(inputs, vec![Input::Line("aaaaaaab".into())]);
    }

    #[test]
    fn test_line_limit_rings_bell_with_echo() {
        let mut editor = LineEditor::new(true, 10).with_max_line(3);
        let (_, out) = feed_all(&mut editor, "abcdü".as_bytes());
        assert_eq!(out, b"abc\x07\x07");
        assert_eq!(editor.buffer(), "abc");

        let mut out = Vec::new();
        editor.insert_str("ow ", &mut out);
        assert_eq!(out, b"\x07");
        assert_eq!(editor.buffer(), "abc");
    }

    #[test]
    fn test_default_line_limit() {
        let mut editor = LineEditor::new(false, 10);
        let long = vec![b'x'; DEFAULT_MAX_LINE_LENGTH + 100];
        feed_all(&mut editor, &long);
        assert_eq!(editor.buffer().len(), DEFAULT_MAX_LINE_LENGTH);
    }

    #[test]
    fn test_utf8_input() {
        let mut editor = LineEditor::new(true, 10);
        let (inputs, out) = feed_all(&mut editor, "grüß\n".as_bytes());
        assert_eq!(inputs, vec![Input::Line("grüß".into())]);
        assert_eq!(out, "grüß\r\n".as_bytes());
    }
}
