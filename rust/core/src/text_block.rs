// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text Blocks - bounded runs of lines captured by start/end markers
//!
//! `TextBlock::from_pattern` doubles as a dispatch test: it returns `None`
//! when the start marker does not match the current line, so a caller can try
//! many block kinds against each line in turn (see [`crate::grammar`]).
//!
//! ```rust,ignore
//! use simout_core::{BlockSpec, LineSource, LineStream, TextBlock};
//!
//! let mut stream = LineStream::from_text("run.log", "*** Foo ***\nbody\n*** End ***\n");
//! let spec = BlockSpec::literal("Foo", "End");
//! let first = stream.next_line()?.unwrap();
//! let block = TextBlock::from_pattern(&first, &mut stream, &spec)?.unwrap();
//! assert_eq!(block.len(), 3);
//! ```

use crate::error::{Error, Position, Result};
use crate::line_stream::LineSource;
use crate::pattern::{LinePattern, Pattern};
use std::ops::Index;

/// Start/end markers for one kind of block
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub start: Pattern,
    pub end: Pattern,
    /// Number of `end` matches that close the block (at least 1)
    pub n_end: usize,
    /// Accept running out of input before the block closes
    pub eof_possible: bool,
}

impl BlockSpec {
    pub fn new(start: Pattern, end: Pattern) -> Self {
        Self {
            start,
            end,
            n_end: 1,
            eof_possible: false,
        }
    }

    /// Both markers as regular expressions
    pub fn regex(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(Pattern::regex(start)?, Pattern::regex(end)?))
    }

    /// Both markers as plain substrings
    pub fn literal(start: &str, end: &str) -> Self {
        Self::new(Pattern::literal(start), Pattern::literal(end))
    }

    pub fn n_end(mut self, n_end: usize) -> Self {
        self.n_end = n_end.max(1);
        self
    }

    pub fn eof_possible(mut self, eof_possible: bool) -> Self {
        self.eof_possible = eof_possible;
        self
    }
}

/// Captured, immutable run of lines with its own read cursor
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    lines: Vec<String>,
    /// Index of the next line `next_line` returns
    next: usize,
    can_rewind: bool,
    source_name: String,
    /// Line number of `lines[0]` in the source
    start_line: usize,
}

impl TextBlock {
    /// Build a block from already-captured lines
    pub fn from_lines(source_name: impl Into<String>, start_line: usize, lines: Vec<String>) -> Self {
        Self {
            lines,
            next: 0,
            can_rewind: false,
            source_name: source_name.into(),
            start_line,
        }
    }

    /// Capture from `init_line` (already read from `stream`) through the
    /// `spec.n_end`-th line matching `spec.end`.
    ///
    /// Returns `Ok(None)` when `spec.start` does not match `init_line`.
    /// The init line itself is never tested against the end marker.
    pub fn from_pattern<S>(init_line: &str, stream: &mut S, spec: &BlockSpec) -> Result<Option<Self>>
    where
        S: LineSource + ?Sized,
    {
        if !spec.start.is_match(init_line) {
            return Ok(None);
        }

        let start_line = stream.line_number();
        let mut lines = vec![init_line.to_string()];
        let mut found = 0;

        while found < spec.n_end {
            match stream.next_line()? {
                Some(line) => {
                    if spec.end.is_match(&line) {
                        found += 1;
                    }
                    lines.push(line);
                }
                None if spec.eof_possible => {
                    tracing::debug!(
                        source = stream.source_name(),
                        start_line,
                        found,
                        expected = spec.n_end,
                        "block closed by end of input"
                    );
                    break;
                }
                None => {
                    return Err(Error::UnexpectedEof {
                        source_name: stream.source_name().to_string(),
                        at: Position::Line(stream.line_number()),
                        context: format!(
                            "block starting at line {} matched end marker {:?} {} of {} times",
                            start_line, spec.end, found, spec.n_end
                        ),
                    });
                }
            }
        }

        tracing::trace!(
            source = stream.source_name(),
            start_line,
            lines = lines.len(),
            "captured block"
        );

        Ok(Some(Self::from_lines(stream.source_name(), start_line, lines)))
    }

    /// Capture `init_line` plus the next `n` lines, whatever they contain
    pub fn take_lines<S>(init_line: &str, stream: &mut S, n: usize, eof_possible: bool) -> Result<Self>
    where
        S: LineSource + ?Sized,
    {
        let start_line = stream.line_number();
        let mut lines = Vec::with_capacity(n + 1);
        lines.push(init_line.to_string());

        for taken in 0..n {
            match stream.next_line()? {
                Some(line) => lines.push(line),
                None if eof_possible => break,
                None => {
                    return Err(Error::UnexpectedEof {
                        source_name: stream.source_name().to_string(),
                        at: Position::Line(stream.line_number()),
                        context: format!("expected {} lines after line {}, got {}", n, start_line, taken),
                    });
                }
            }
        }

        Ok(Self::from_lines(stream.source_name(), start_line, lines))
    }

    /// Drop `front` leading and `back` trailing lines (typically the
    /// delimiter lines). The cursor is reset.
    pub fn remove_bounds(mut self, front: usize, back: usize) -> Self {
        let len = self.lines.len();
        let front = front.min(len);
        let back = back.min(len - front);
        self.lines.truncate(len - back);
        self.lines.drain(..front);
        self.start_line += front;
        self.reset();
        self
    }

    /// Drop lines that are empty after trimming. The cursor is reset.
    pub fn remove_blank(mut self) -> Self {
        self.lines.retain(|line| !line.trim().is_empty());
        self.reset();
        self
    }

    /// True if at least one line is non-blank
    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Line number of the first line in the source
    #[inline]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Lines joined with `\n`
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Move the read cursor back before the first line
    pub fn reset(&mut self) {
        self.next = 0;
        self.can_rewind = false;
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl LineSource for TextBlock {
    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.get(self.next) {
            Some(line) => {
                self.next += 1;
                self.can_rewind = true;
                Ok(Some(line.clone()))
            }
            None => {
                self.can_rewind = false;
                Ok(None)
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.can_rewind {
            return Err(Error::RewindUnderflow(format!(
                "block from {} line {}: no line read since the last rewind",
                self.source_name, self.start_line
            )));
        }
        self.next -= 1;
        self.can_rewind = false;
        Ok(())
    }

    fn line_number(&self) -> usize {
        (self.start_line + self.next).saturating_sub(1)
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl Index<usize> for TextBlock {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.lines[index]
    }
}

impl<'a> IntoIterator for &'a TextBlock {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_stream::LineStream;

    fn first_line(stream: &mut LineStream<std::io::Cursor<Vec<u8>>>) -> String {
        stream.next_line().unwrap().unwrap()
    }

    #[test]
    fn test_matching_block_is_captured() {
        let mut stream = LineStream::from_text("run.log", "*** Foo ***\nbody\n*** End ***\nafter\n");
        let init = first_line(&mut stream);

        let block = TextBlock::from_pattern(&init, &mut stream, &BlockSpec::literal("Foo", "End"))
            .unwrap()
            .unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(&block[1], "body");
        assert_eq!(block.start_line(), 1);
        assert!(block.has_content());
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("after"));
    }

    #[test]
    fn test_non_matching_start_consumes_nothing() {
        let mut stream = LineStream::from_text("run.log", "*** Foo ***\nbody\n*** End ***\n");
        let init = first_line(&mut stream);

        let block = TextBlock::from_pattern(&init, &mut stream, &BlockSpec::literal("Bar", "End")).unwrap();
        assert!(block.is_none());
        assert_eq!(stream.line_number(), 1);
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("body"));
    }

    #[test]
    fn test_n_end_waits_for_second_match() {
        let text = "+---- table ----+\n| a |\n+---------------+\n| b |\n+---------------+\ntail\n";
        let mut stream = LineStream::from_text("run.log", text);
        let init = first_line(&mut stream);
        let spec = BlockSpec::regex(r"^\+-+ table", r"^\+-+\+$").unwrap().n_end(2);

        let block = TextBlock::from_pattern(&init, &mut stream, &spec).unwrap().unwrap();
        assert_eq!(block.len(), 5);
        assert_eq!(block.last(), Some("+---------------+"));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("tail"));
    }

    #[test]
    fn test_eof_before_end_marker() {
        let mut stream = LineStream::from_text("short.log", "BEGIN\nx\ny\n");
        let init = first_line(&mut stream);

        let err = TextBlock::from_pattern(&init, &mut stream, &BlockSpec::literal("BEGIN", "END")).unwrap_err();
        match err {
            Error::UnexpectedEof { source_name, at, .. } => {
                assert_eq!(source_name, "short.log");
                assert_eq!(at, Position::Line(3));
            }
            other => panic!("expected UnexpectedEof, got {other:?}"),
        }

        let mut stream = LineStream::from_text("short.log", "BEGIN\nx\ny\n");
        let init = first_line(&mut stream);
        let spec = BlockSpec::literal("BEGIN", "END").eof_possible(true);
        let block = TextBlock::from_pattern(&init, &mut stream, &spec).unwrap().unwrap();
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn test_remove_bounds_tracks_line_numbers() {
        let mut stream = LineStream::from_text("run.log", "pre\n== Cell ==\n1 0 0\n0 1 0\n== end ==\n");
        stream.next_line().unwrap();
        let init = first_line(&mut stream);
        let block = TextBlock::from_pattern(&init, &mut stream, &BlockSpec::literal("== Cell", "== end"))
            .unwrap()
            .unwrap();
        assert_eq!(block.start_line(), 2);

        let body = block.remove_bounds(1, 1);
        assert_eq!(body.len(), 2);
        assert_eq!(body.first(), Some("1 0 0"));
        assert_eq!(body.start_line(), 3);

        let gone = body.remove_bounds(5, 5);
        assert!(gone.is_empty());
        assert!(!gone.has_content());
    }

    #[test]
    fn test_block_is_a_line_source() {
        let mut block = TextBlock::from_lines(
            "run.log",
            10,
            vec!["outer".into(), "  inner start".into(), "  x".into(), "  inner end".into(), "tail".into()],
        );
        assert_eq!(block.line_number(), 9);
        block.next_line().unwrap();
        let init = block.next_line().unwrap().unwrap();
        assert_eq!(block.line_number(), 11);

        let inner = TextBlock::from_pattern(&init, &mut block, &BlockSpec::literal("inner start", "inner end"))
            .unwrap()
            .unwrap();
        assert_eq!(inner.len(), 3);
        assert_eq!(inner.start_line(), 11);

        assert_eq!(block.next_line().unwrap().as_deref(), Some("tail"));
        block.rewind().unwrap();
        assert!(block.rewind().is_err());
        assert_eq!(block.next_line().unwrap().as_deref(), Some("tail"));
        assert_eq!(block.next_line().unwrap(), None);
    }

    #[test]
    fn test_take_lines_and_remove_blank() {
        let mut stream = LineStream::from_text("run.log", "header\n\na\n\nb\n");
        let init = first_line(&mut stream);
        let block = TextBlock::take_lines(&init, &mut stream, 4, false).unwrap();
        assert_eq!(block.len(), 5);
        assert_eq!(block.remove_blank().into_lines(), vec!["header", "a", "b"]);

        let mut stream = LineStream::from_text("run.log", "header\nonly\n");
        let init = first_line(&mut stream);
        assert!(TextBlock::take_lines(&init, &mut stream, 3, false).is_err());
    }

    #[test]
    fn test_blank_block_has_no_content() {
        let block = TextBlock::from_lines("x", 1, vec!["   ".into(), "".into()]);
        assert!(!block.has_content());
        assert_eq!(block.to_text(), "   \n");
    }
}
