//! Token classes for displaying decompiled text
//!
//! Highlighting works one line at a time, but a string literal may span lines.
//! The [`ScanMode`] a line ends in is the mode the next line starts in.

use crate::script::decompile::STRING_DELIMITER;
use serde::Serialize;

/// Scanner state carried from one line to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Default,
    /// Inside an open string literal
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Mnemonic,
    Number,
    String,
}

/// A highlighted byte range of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
    pub class: TokenClass,
}

const DELIMITER: u8 = STRING_DELIMITER as u8;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii()
}

/// Classify the tokens of `line`, starting in `mode`
///
/// Returns the spans in order and the mode the line ends in.
pub fn highlight_line(line: &str, mode: ScanMode) -> (Vec<Span>, ScanMode) {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut mode = mode;
    let mut pos = 0;

    // A literal continued from the previous line
    if mode == ScanMode::String {
        let (end, closed) = scan_string(bytes, 0);
        spans.push(Span { start: 0, len: end, class: TokenClass::String });
        if !closed {
            return (spans, mode);
        }
        mode = ScanMode::Default;
        pos = end;
    } else if let Some(len) = mnemonic_len(bytes) {
        spans.push(Span { start: 0, len, class: TokenClass::Mnemonic });
        pos = len;
    }

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == DELIMITER {
            let (end, closed) = scan_string(bytes, pos + 1);
            spans.push(Span { start: pos, len: end - pos, class: TokenClass::String });
            if !closed {
                mode = ScanMode::String;
            }
            pos = end;
        } else if b.is_ascii_digit() && (pos == 0 || !is_word_byte(bytes[pos - 1])) {
            let end = number_end(bytes, pos);
            match end {
                Some(end) => {
                    spans.push(Span { start: pos, len: end - pos, class: TokenClass::Number });
                    pos = end;
                }
                None => pos = word_end(bytes, pos),
            }
        } else if is_word_byte(b) {
            pos = word_end(bytes, pos);
        } else {
            pos += 1;
        }
    }

    (spans, mode)
}

/// Length of a mnemonic at the start of the line
fn mnemonic_len(bytes: &[u8]) -> Option<usize> {
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return None,
    }
    let len = bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .unwrap_or(bytes.len());
    match bytes.get(len) {
        None | Some(b' ') | Some(b'\t') => Some(len),
        _ => None,
    }
}

/// End of a string body starting at `from`, and whether the closing delimiter was found
fn scan_string(bytes: &[u8], from: usize) -> (usize, bool) {
    let mut pos = from;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            DELIMITER => return (pos + 1, true),
            _ => pos += 1,
        }
    }
    (bytes.len(), false)
}

fn word_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| !is_word_byte(b))
        .map_or(bytes.len(), |n| from + n)
}

/// End of a hex, binary or decimal literal at `from`, if the word is one
fn number_end(bytes: &[u8], from: usize) -> Option<usize> {
    let run = |start: usize, pred: fn(&u8) -> bool| {
        bytes[start..].iter().position(|b| !pred(b)).map_or(bytes.len(), |n| start + n)
    };

    let end = match (bytes[from], bytes.get(from + 1)) {
        (b'0', Some(b'x')) => run(from + 2, u8::is_ascii_hexdigit),
        (b'0', Some(b'b')) => run(from + 2, |b: &u8| *b == b'0' || *b == b'1'),
        (b'0', _) => from + 1,
        _ => run(from, u8::is_ascii_digit),
    };

    let empty_prefix = end == from + 2 && bytes[from] == b'0';
    let at_boundary = bytes.get(end).map_or(true, |&b| !is_word_byte(b));
    if empty_prefix || !at_boundary {
        None
    } else {
        Some(end)
    }
}

/// Line-by-line highlighter that remembers the mode between calls
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    mode: ScanMode,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn highlight(&mut self, line: &str) -> Vec<Span> {
        let (spans, mode) = highlight_line(line, self.mode);
        self.mode = mode;
        spans
    }

    pub fn reset(&mut self) {
        self.mode = ScanMode::Default;
    }
}

/// Spans for every line of `text`
pub fn highlight_text(text: &str) -> Vec<Vec<Span>> {
    let mut highlighter = Highlighter::new();
    text.lines().map(|line| highlighter.highlight(line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes<'a>(line: &'a str, spans: &[Span]) -> Vec<(&'a str, TokenClass)> {
        spans
            .iter()
            .map(|s| (&line[s.start..s.start + s.len], s.class))
            .collect()
    }

    #[test]
    fn test_instruction_line() {
        let line = "change_ui 16, 0x2a";
        let (spans, mode) = highlight_line(line, ScanMode::Default);
        assert_eq!(mode, ScanMode::Default);
        assert_eq!(
            classes(line, &spans),
            vec![
                ("change_ui", TokenClass::Mnemonic),
                ("16", TokenClass::Number),
                ("0x2a", TokenClass::Number),
            ]
        );
    }

    #[test]
    fn test_mnemonic_rules() {
        let (spans, _) = highlight_line("wait_input", ScanMode::Default);
        assert_eq!(spans, vec![Span { start: 0, len: 10, class: TokenClass::Mnemonic }]);

        // Not followed by whitespace or end of line
        let (spans, _) = highlight_line("text,", ScanMode::Default);
        assert!(spans.is_empty());
        let (spans, _) = highlight_line(" text", ScanMode::Default);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_numbers_need_word_boundaries() {
        let line = "raw 0x70, 0b101, 0, 007, a12, 12b, 0x";
        let (spans, _) = highlight_line(line, ScanMode::Default);
        assert_eq!(
            classes(line, &spans),
            vec![
                ("raw", TokenClass::Mnemonic),
                ("0x70", TokenClass::Number),
                ("0b101", TokenClass::Number),
                ("0", TokenClass::Number),
            ]
        );
    }

    #[test]
    fn test_string_on_one_line() {
        let line = "text `a \\` 12` 3";
        let (spans, mode) = highlight_line(line, ScanMode::Default);
        assert_eq!(mode, ScanMode::Default);
        assert_eq!(
            classes(line, &spans),
            vec![
                ("text", TokenClass::Mnemonic),
                ("`a \\` 12`", TokenClass::String),
                ("3", TokenClass::Number),
            ]
        );
    }

    #[test]
    fn test_string_mode_crosses_lines() {
        let text = "text `first\nsecond 42\nthird` 7\nformat 1";
        let mut highlighter = Highlighter::new();
        let lines: Vec<&str> = text.lines().collect();

        let first = highlighter.highlight(lines[0]);
        assert_eq!(highlighter.mode(), ScanMode::String);
        assert_eq!(classes(lines[0], &first)[1], ("`first", TokenClass::String));

        // No numbers or mnemonics inside the literal
        let second = highlighter.highlight(lines[1]);
        assert_eq!(classes(lines[1], &second), vec![("second 42", TokenClass::String)]);
        assert_eq!(highlighter.mode(), ScanMode::String);

        let third = highlighter.highlight(lines[2]);
        assert_eq!(
            classes(lines[2], &third),
            vec![("third`", TokenClass::String), ("7", TokenClass::Number)]
        );
        assert_eq!(highlighter.mode(), ScanMode::Default);

        let fourth = highlighter.highlight(lines[3]);
        assert_eq!(fourth[0].class, TokenClass::Mnemonic);

        assert_eq!(highlight_text(text).len(), 4);
    }

    #[test]
    fn test_non_ascii_text() {
        let line = "text `日向 創` 1";
        let (spans, _) = highlight_line(line, ScanMode::Default);
        assert_eq!(
            classes(line, &spans),
            vec![
                ("text", TokenClass::Mnemonic),
                ("`日向 創`", TokenClass::String),
                ("1", TokenClass::Number),
            ]
        );
    }
}
