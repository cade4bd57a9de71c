//! Pattern buffer with efficient tail-search optimization.
//!
//! Inbound device output accumulates here until a prompt is seen. Only the
//! last N bytes are searched for prompt patterns, so long listings do not
//! make every poll rescan the whole capture.

use std::ops::Range;

use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer for accumulating output and searching it for prompts.
///
/// Control sequences (colors, cursor movement) and carriage returns are
/// dropped on the way in; newlines and tabs are kept.
pub struct PatternBuffer {
    /// The accumulated, cleaned output.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence parser, kept across chunks so split sequences are handled.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PrintableSink {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returns the byte range of the match within the full buffer.
    pub fn find_tail(&self, pattern: &Regex) -> Option<Range<usize>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[start..])
            .map(|m| (start + m.start())..(start + m.end()))
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.find_tail(pattern).is_some()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Collects printable output from the escape-sequence parser.
struct PrintableSink<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for PrintableSink<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\t') {
            self.out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.take(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_and_carriage_return_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mEPON0/1:1\x1b[0m online\r\n");
        assert_eq!(buffer.take(), b"EPON0/1:1 online\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"OLT\x1b[");
        buffer.extend(b"0m#");
        assert_eq!(buffer.take(), b"OLT#");
    }

    #[test]
    fn test_tail_search_reports_absolute_range() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nOLT#");

        let pattern = Regex::new(r"OLT#").unwrap();
        assert_eq!(buffer.find_tail(&pattern), Some(101..105));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"OLT#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"OLT#").unwrap();
        assert!(!buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.take().is_empty());
    }
}
