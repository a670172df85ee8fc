//! Whitespace tokenizer for console input lines.
//!
//! Only the leading tokens of a line name a command; whatever follows is an
//! opaque argument string. Tokens therefore carry their byte span so the
//! resolver can hand the untouched tail of the line to the command.

/// A single whitespace-delimited token and its byte span in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The token text.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

/// Iterator over the tokens of an input line.
///
/// # Examples
///
/// ```
/// use ctl_console::core::Tokens;
///
/// let tokens: Vec<_> = Tokens::new("show   switch all").map(|t| t.text).collect();
/// assert_eq!(tokens, vec!["show", "switch", "all"]);
/// ```
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    /// Start tokenizing `input` from its beginning.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        let start = self.pos + skipped;

        if start >= self.input.len() {
            self.pos = self.input.len();
            return None;
        }

        let end = self.input[start..]
            .find(char::is_whitespace)
            .map(|i| start + i)
            .unwrap_or(self.input.len());

        self.pos = end;
        Some(Token {
            text: &self.input[start..end],
            start,
            end,
        })
    }
}

/// Tokenize a whole line.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Tokens::new(input).collect()
}

/// The argument string that follows the byte offset `end`.
///
/// Leading and trailing whitespace is dropped, internal spacing is kept as typed.
///
/// # Examples
///
/// ```
/// use ctl_console::core::rest_after;
///
/// let line = "show host   10.0.0.1   and  more ";
/// assert_eq!(rest_after(line, 9), "10.0.0.1   and  more");
/// ```
pub fn rest_after(input: &str, end: usize) -> &str {
    input.get(end..).unwrap_or("").trim()
}

/// Whether the line ends in whitespace, i.e. the last token is complete.
#[inline]
pub fn ends_with_separator(input: &str) -> bool {
    input.chars().next_back().is_some_and(char::is_whitespace)
}
