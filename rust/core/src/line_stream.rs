// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line Stream - line reader with one-line pushback
//!
//! Block parsers only ever need to ask "does the next line NOT belong to me?"
//! and put it back, so the stream remembers exactly one position: the byte
//! offset before the last line it returned.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;

/// A pull-based source of lines that can un-read its last line once.
///
/// Implemented by [`LineStream`] and by captured
/// [`TextBlock`](crate::text_block::TextBlock)s, so blocks can be scanned for
/// nested sub-blocks with the same machinery as files.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input
    fn next_line(&mut self) -> Result<Option<String>>;

    /// Un-read the most recently returned line.
    /// Fails with [`Error::RewindUnderflow`] unless the previous call was a
    /// successful `next_line`.
    fn rewind(&mut self) -> Result<()>;

    /// 1-based number of the last line returned (0 before the first read)
    fn line_number(&self) -> usize;

    /// Name used in diagnostics (usually a file path)
    fn source_name(&self) -> &str;
}

/// Line reader over any seekable buffered source
pub struct LineStream<R> {
    name: String,
    reader: R,
    /// Byte offset of the next unread line
    offset: u64,
    line: usize,
    /// `(offset, line)` before the last returned line; cleared by rewind
    previous: Option<(u64, usize)>,
    buf: Vec<u8>,
}

impl LineStream<BufReader<File>> {
    /// Open a file for line reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::new(path.display().to_string(), BufReader::new(file))
    }
}

impl LineStream<Cursor<Vec<u8>>> {
    /// Line stream over in-memory text
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: Cursor::new(text.into().into_bytes()),
            offset: 0,
            line: 0,
            previous: None,
            buf: Vec::with_capacity(128),
        }
    }
}

impl<R: BufRead + Seek> LineStream<R> {
    /// Wrap a reader; lines are counted from its current position
    pub fn new(name: impl Into<String>, mut reader: R) -> Result<Self> {
        let offset = reader.stream_position()?;
        Ok(Self {
            name: name.into(),
            reader,
            offset,
            line: 0,
            previous: None,
            buf: Vec::with_capacity(128),
        })
    }

    /// Byte offset of the next unread line
    #[inline]
    pub fn position(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead + Seek> LineSource for LineStream<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let consumed = read_line_bytes(&mut self.reader, &mut self.buf)?;
        if consumed == 0 {
            self.previous = None;
            return Ok(None);
        }

        self.previous = Some((self.offset, self.line));
        self.offset += consumed as u64;
        self.line += 1;

        Ok(Some(decode_line(&self.buf)))
    }

    fn rewind(&mut self) -> Result<()> {
        let (offset, line) = self.previous.take().ok_or_else(|| {
            Error::RewindUnderflow(format!(
                "{} past line {}: no line read since the last rewind",
                self.name, self.line
            ))
        })?;
        self.reader.seek(SeekFrom::Start(offset))?;
        tracing::trace!(source = %self.name, offset, line, "rewound line stream");
        self.offset = offset;
        self.line = line;
        Ok(())
    }

    #[inline]
    fn line_number(&self) -> usize {
        self.line
    }

    #[inline]
    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Read through the next `\n` (inclusive) using SIMD newline search.
/// Returns the number of bytes consumed; 0 means end of input.
fn read_line_bytes<R: BufRead>(reader: &mut R, out: &mut Vec<u8>) -> io::Result<usize> {
    let mut total = 0;
    loop {
        let (done, used) = {
            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            match memchr::memchr(b'\n', available) {
                Some(i) => {
                    out.extend_from_slice(&available[..=i]);
                    (true, i + 1)
                }
                None => {
                    out.extend_from_slice(available);
                    (available.is_empty(), available.len())
                }
            }
        };
        reader.consume(used);
        total += used;
        if done {
            return Ok(total);
        }
    }
}

/// Strip `\n` / `\r\n` and decode (lossily) as UTF-8
#[inline]
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
