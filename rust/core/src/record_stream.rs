// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record Stream - Fortran unformatted sequential records
//!
//! Each record on disk is framed as
//!
//! ```text
//! [u32 BE length][length bytes payload][u32 BE length]
//! ```
//!
//! and the trailer must repeat the header. Offsets are never stored in the
//! file: skipping forward reads headers, stepping backward reads the trailer
//! just before the cursor. Both directions verify header == trailer, since a
//! single bad length silently shifts every offset after it.
//!
//! Sequential reading and indexed access are independent: [`RecordStream::get`]
//! seeks, reads and restores the sequential cursor.

use crate::error::{Error, Result};
use crate::value::{Decode, Value, ValueKind};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Size of each length field
const LEN_FIELD: u64 = 4;
/// Header + trailer
const FRAME_OVERHEAD: u64 = 2 * LEN_FIELD;

/// One framed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Offset of the record's header in the source
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Record {
    /// Declared payload length
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload as UTF-8 text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Offset just past this record's trailer
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.offset + FRAME_OVERHEAD + self.data.len() as u64
    }

    /// Decode the payload per a schema tag
    pub fn decode(&self, kind: ValueKind) -> Result<Value> {
        Value::from_be_payload(&self.data, kind)
    }

    /// Decode every element of the payload as `T`
    pub fn decode_as<T: Decode>(&self) -> Result<Vec<T>> {
        T::from_be_payload(&self.data)
    }
}

/// Position and payload length of one record, from [`RecordStream::index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEntry {
    pub offset: u64,
    pub len: u32,
}

/// Cursor over framed records in a seekable source
pub struct RecordStream<R> {
    reader: R,
    /// Offset of the first record
    origin: u64,
    /// End of input
    end: u64,
    /// Offset of the next record header; the reader is kept here
    pos: u64,
    /// Records between `origin` and `pos`
    ordinal: usize,
    /// `(offset, ordinal)` of the record just returned by `next_record`
    last: Option<(u64, usize)>,
    index: Option<Vec<RecordEntry>>,
    labels: FxHashMap<String, usize>,
    /// Set once the iterator has surfaced an error
    failed: bool,
}

impl RecordStream<BufReader<File>> {
    /// Open an unformatted file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl RecordStream<Cursor<Vec<u8>>> {
    /// Read records from an in-memory buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let end = bytes.len() as u64;
        Self::with_bounds(Cursor::new(bytes), 0, end)
    }
}

impl<R: Read + Seek> RecordStream<R> {
    /// Wrap a reader; records start at its current position
    pub fn new(mut reader: R) -> Result<Self> {
        let origin = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(origin))?;
        Ok(Self::with_bounds(reader, origin, end))
    }

    fn with_bounds(reader: R, origin: u64, end: u64) -> Self {
        Self {
            reader,
            origin,
            end,
            pos: origin,
            ordinal: 0,
            last: None,
            index: None,
            labels: FxHashMap::default(),
            failed: false,
        }
    }

    /// Byte offset of the next record header
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Number of records before the cursor
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// True when the cursor sits at end of input
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Read the next record, or `None` at a clean end of input
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let start = self.pos;
        match self.read_frame() {
            Ok(Some(record)) => {
                self.last = Some((start, self.ordinal));
                self.pos = record.end_offset();
                self.ordinal += 1;
                tracing::trace!(offset = start, len = record.len(), ordinal = self.ordinal - 1, "read record");
                Ok(Some(record))
            }
            Ok(None) => {
                self.last = None;
                Ok(None)
            }
            Err(e) => {
                self.last = None;
                self.resync();
                Err(e)
            }
        }
    }

    /// Read the next record without consuming it
    pub fn peek(&mut self) -> Result<Option<Record>> {
        let record = self.read_frame();
        self.resync();
        record
    }

    /// Step back so the next read returns the record just read again
    pub fn unread(&mut self) -> Result<()> {
        let (offset, ordinal) = self.last.take().ok_or_else(|| {
            Error::RewindUnderflow(format!(
                "record stream at offset {}: no record read since the last reposition",
                self.pos
            ))
        })?;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        self.ordinal = ordinal;
        Ok(())
    }

    /// Reposition by whole records: `+k` skips `k` records unread, `-k`
    /// walks back `k` records so the next read yields the one stepped onto.
    pub fn seek_records(&mut self, delta: i64) -> Result<()> {
        let count = delta.unsigned_abs() as usize;
        match delta.signum() {
            1 => self.skip(count),
            -1 => self.rewind(count),
            _ => Ok(()),
        }
    }

    /// Skip `count` records without reading their payloads. On failure the
    /// cursor is left where it was.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.last = None;
        let saved = (self.pos, self.ordinal);
        for _ in 0..count {
            let result = if self.at_end() {
                Err(Error::RecordOutOfRange {
                    ordinal: saved.1 + count,
                    count: self.ordinal,
                })
            } else {
                let start = self.pos;
                self.skip_one(start)
            };
            if let Err(e) = result {
                tracing::debug!(offset = self.pos, "record skip failed");
                self.pos = saved.0;
                self.ordinal = saved.1;
                self.resync();
                return Err(e);
            }
        }
        Ok(())
    }

    fn skip_one(&mut self, start: u64) -> Result<()> {
        let len = self.read_header(start)?;
        let trailer_at = start + LEN_FIELD + len as u64;
        self.reader.seek(SeekFrom::Start(trailer_at))?;
        let trailer = self.read_u32(start)?;
        check_trailer(start, len, trailer)?;
        self.pos = trailer_at + LEN_FIELD;
        self.ordinal += 1;
        Ok(())
    }

    /// Walk back `count` records using the trailer before the cursor
    pub fn rewind(&mut self, count: usize) -> Result<()> {
        self.last = None;
        let saved = (self.pos, self.ordinal);
        for step in 0..count {
            if let Err(e) = self.rewind_one() {
                tracing::debug!(step, offset = self.pos, "record rewind failed");
                self.pos = saved.0;
                self.ordinal = saved.1;
                self.resync();
                return Err(e);
            }
        }
        self.reader.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }

    fn rewind_one(&mut self) -> Result<()> {
        if self.pos < self.origin + FRAME_OVERHEAD {
            return Err(Error::RewindUnderflow(format!(
                "record stream past its first record (offset {})",
                self.pos
            )));
        }

        let trailer_at = self.pos - LEN_FIELD;
        self.reader.seek(SeekFrom::Start(trailer_at))?;
        let len = self.read_u32(trailer_at)? as u64;

        // Record start = end - trailer - payload - header
        let start = trailer_at
            .checked_sub(len + LEN_FIELD)
            .filter(|&s| s >= self.origin)
            .ok_or_else(|| {
                Error::framing(
                    trailer_at,
                    format!("trailer length {} points before start of input", len),
                )
            })?;

        self.reader.seek(SeekFrom::Start(start))?;
        let header = self.read_u32(start)?;
        check_trailer(start, header, len as u32)?;

        self.pos = start;
        self.ordinal = self.ordinal.saturating_sub(1);
        Ok(())
    }

    /// Offsets and lengths of every record, built on first use by one pass
    /// over the whole input. The sequential cursor is not moved.
    pub fn index(&mut self) -> Result<&[RecordEntry]> {
        if self.index.is_none() {
            let entries = self.build_index();
            self.resync();
            let entries = entries?;
            tracing::debug!(records = entries.len(), bytes = self.end - self.origin, "indexed record stream");
            self.index = Some(entries);
        }
        Ok(self.index.as_deref().unwrap_or_default())
    }

    fn build_index(&mut self) -> Result<Vec<RecordEntry>> {
        let mut entries = Vec::new();
        let mut offset = self.origin;
        self.reader.seek(SeekFrom::Start(offset))?;
        while offset < self.end {
            let len = self.read_header(offset)?;
            let trailer_at = offset + LEN_FIELD + len as u64;
            self.reader.seek(SeekFrom::Start(trailer_at))?;
            let trailer = self.read_u32(offset)?;
            check_trailer(offset, len, trailer)?;
            entries.push(RecordEntry { offset, len });
            offset = trailer_at + LEN_FIELD;
        }
        Ok(entries)
    }

    /// Total number of records (builds the index)
    pub fn record_count(&mut self) -> Result<usize> {
        Ok(self.index()?.len())
    }

    /// Attach labels to records in order; extra labels are ignored
    pub fn label<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let count = self.index()?.len();
        self.labels = names
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(ordinal, name)| (name.into(), ordinal))
            .collect();
        Ok(())
    }

    /// Read record `ordinal` without moving the sequential cursor
    pub fn get(&mut self, ordinal: usize) -> Result<Record> {
        let entry = {
            let index = self.index()?;
            *index.get(ordinal).ok_or(Error::RecordOutOfRange {
                ordinal,
                count: index.len(),
            })?
        };

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let record = self.read_frame_at(entry.offset);
        self.resync();
        match record? {
            Some(record) => Ok(record),
            None => Err(Error::framing(entry.offset, "indexed record missing")),
        }
    }

    /// Read the record attached to `name` by [`label`](Self::label)
    pub fn get_labelled(&mut self, name: &str) -> Result<Record> {
        let ordinal = *self
            .labels
            .get(name)
            .ok_or_else(|| Error::UnknownLabel(name.to_string()))?;
        self.get(ordinal)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Put the reader back at `pos` after a lookahead or a failure
    fn resync(&mut self) {
        if let Err(e) = self.reader.seek(SeekFrom::Start(self.pos)) {
            tracing::warn!(offset = self.pos, error = %e, "failed to restore record stream position");
        }
    }

    fn read_frame(&mut self) -> Result<Option<Record>> {
        self.read_frame_at(self.pos)
    }

    /// Read a whole frame; the reader must already be at `start`
    fn read_frame_at(&mut self, start: u64) -> Result<Option<Record>> {
        if start >= self.end {
            return Ok(None);
        }
        let len = self.read_header(start)?;

        let mut data = vec![0u8; len as usize];
        self.reader
            .read_exact(&mut data)
            .map_err(|e| truncated(e, start, "payload"))?;

        let trailer = self.read_u32(start)?;
        check_trailer(start, len, trailer)?;

        Ok(Some(Record { offset: start, data }))
    }

    /// Read a header and check the whole frame fits in the input
    fn read_header(&mut self, start: u64) -> Result<u32> {
        if self.end - start < LEN_FIELD {
            return Err(Error::framing(start, "truncated length header"));
        }
        let len = self.read_u32(start)?;
        let frame_end = start + FRAME_OVERHEAD + len as u64;
        if frame_end > self.end {
            return Err(Error::framing(
                start,
                format!(
                    "record of {} bytes runs past end of input at {}",
                    len, self.end
                ),
            ));
        }
        Ok(len)
    }

    fn read_u32(&mut self, record_start: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| truncated(e, record_start, "length field"))?;
        Ok(u32::from_be_bytes(buf))
    }
}

impl<R: Read + Seek> Iterator for RecordStream<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_record().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

#[inline]
fn check_trailer(start: u64, header: u32, trailer: u32) -> Result<()> {
    if header != trailer {
        return Err(Error::framing(
            start,
            format!("header length {} does not match trailer length {}", header, trailer),
        ));
    }
    Ok(())
}

fn truncated(e: io::Error, start: u64, what: &str) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::framing(start, format!("end of input inside record {}", what))
    } else {
        Error::Io(e)
    }
}

/// Writes framed records
pub struct RecordWriter<W> {
    writer: W,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Write one framed record
    pub fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record payload of {} bytes exceeds u32 framing", payload.len()),
            )
        })?;
        let len = len.to_be_bytes();
        self.writer.write_all(&len)?;
        self.writer.write_all(payload)?;
        self.writer.write_all(&len)?;
        self.records += 1;
        Ok(())
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.write_record(text.as_bytes())
    }

    pub fn write_f64s(&mut self, values: &[f64]) -> Result<()> {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(&payload)
    }

    pub fn write_i32s(&mut self, values: &[i32]) -> Result<()> {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(&payload)
    }

    pub fn write_bools(&mut self, values: &[bool]) -> Result<()> {
        let payload: Vec<u8> = values
            .iter()
            .flat_map(|&v| (v as i32).to_be_bytes())
            .collect();
        self.write_record(&payload)
    }

    /// Records written so far
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(payloads: &[&[u8]]) -> RecordStream<Cursor<Vec<u8>>> {
        let mut writer = RecordWriter::new(Vec::new());
        for payload in payloads {
            writer.write_record(payload).unwrap();
        }
        RecordStream::from_bytes(writer.into_inner())
    }

    fn payloads(stream: &mut RecordStream<Cursor<Vec<u8>>>) -> Vec<Vec<u8>> {
        stream.map(|r| r.unwrap().data).collect()
    }

    #[test]
    fn test_frames_round_trip() {
        let mut stream = stream_of(&[b"alpha", b"", b"gamma-gamma"]);
        assert_eq!(
            payloads(&mut stream),
            vec![b"alpha".to_vec(), Vec::new(), b"gamma-gamma".to_vec()]
        );
        assert!(stream.at_end());
        assert_eq!(stream.ordinal(), 3);
    }

    #[test]
    fn test_record_offsets_chain() {
        let mut stream = stream_of(&[b"abc", b"de"]);
        let first = stream.next_record().unwrap().unwrap();
        let second = stream.next_record().unwrap().unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(first.end_offset(), 11);
        assert_eq!(second.offset, first.end_offset());
        assert_eq!(stream.position(), 21);
        assert_eq!(stream.next_record().unwrap(), None);
    }

    #[test]
    fn test_unread_yields_same_record() {
        let mut stream = stream_of(&[b"one", b"two", b"three"]);
        stream.next_record().unwrap();
        let two = stream.next_record().unwrap().unwrap();
        stream.unread().unwrap();
        assert_eq!(stream.next_record().unwrap().unwrap(), two);
        assert_eq!(stream.ordinal(), 2);

        stream.unread().unwrap();
        assert!(matches!(stream.unread(), Err(Error::RewindUnderflow(_))));
    }

    #[test]
    fn test_rewind_one_matches_unread() {
        let mut stream = stream_of(&[b"one", b"two", b"three"]);
        stream.next_record().unwrap();
        let two = stream.next_record().unwrap().unwrap();
        stream.seek_records(-1).unwrap();
        assert_eq!(stream.next_record().unwrap().unwrap(), two);
    }

    #[test]
    fn test_skip_then_continue() {
        let names: Vec<Vec<u8>> = (0..6).map(|i| format!("rec{i}").into_bytes()).collect();
        let refs: Vec<&[u8]> = names.iter().map(|n| n.as_slice()).collect();
        let mut stream = stream_of(&refs);

        stream.next_record().unwrap();
        stream.seek_records(3).unwrap();
        // 1 read + 3 skipped: the next is the fifth record
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"rec4");
        assert_eq!(stream.ordinal(), 5);
    }

    #[test]
    fn test_rewind_several_records() {
        let mut stream = stream_of(&[b"a", b"bb", b"ccc", b"dddd"]);
        for _ in 0..4 {
            stream.next_record().unwrap();
        }
        stream.seek_records(-3).unwrap();
        assert_eq!(stream.ordinal(), 1);
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"bb");

        stream.seek_records(0).unwrap();
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"ccc");
    }

    #[test]
    fn test_rewind_past_start_underflows() {
        let mut stream = stream_of(&[b"a", b"b"]);
        stream.next_record().unwrap();
        let err = stream.seek_records(-2).unwrap_err();
        assert!(matches!(err, Error::RewindUnderflow(_)));
        // Failed rewind leaves the cursor where it was
        assert_eq!(stream.ordinal(), 1);
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"b");
    }

    #[test]
    fn test_skip_past_end() {
        let mut stream = stream_of(&[b"a", b"b"]);
        assert!(matches!(
            stream.seek_records(3),
            Err(Error::RecordOutOfRange { ordinal: 3, count: 2 })
        ));
        // A partial skip leaves the cursor untouched
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.ordinal(), 0);
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"a");
    }

    #[test]
    fn test_skip_into_corrupt_record_restores_cursor() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_str("first").unwrap();
        writer.write_str("second").unwrap();
        let mut bytes = writer.into_inner();
        let n = bytes.len();
        bytes[n - 4..].copy_from_slice(&5u32.to_be_bytes());

        let mut stream = RecordStream::from_bytes(bytes);
        assert!(matches!(RecordStream::skip(&mut stream, 2), Err(Error::Framing { .. })));
        assert_eq!(stream.ordinal(), 0);
        assert_eq!(stream.next_record().unwrap().unwrap().as_text(), Some("first"));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut stream = stream_of(&[b"x", b"y"]);
        assert_eq!(stream.peek().unwrap().unwrap().data, b"x");
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"x");
        assert_eq!(stream.peek().unwrap().unwrap().data, b"y");
        // peek does not disturb unread of the last real read
        stream.unread().unwrap();
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"x");
    }

    #[test]
    fn test_trailer_mismatch_is_framing_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        let mut stream = RecordStream::from_bytes(bytes);

        match stream.next() {
            Some(Err(Error::Framing { offset, .. })) => assert_eq!(offset, 0),
            other => panic!("expected framing error, got {other:?}"),
        }
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_truncated_record_is_framing_error() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_str("complete").unwrap();
        writer.write_str("cut short").unwrap();
        let mut bytes = writer.into_inner();
        bytes.truncate(bytes.len() - 6);

        let mut stream = RecordStream::from_bytes(bytes);
        assert_eq!(stream.next_record().unwrap().unwrap().as_text(), Some("complete"));
        let err = stream.next_record().unwrap_err();
        assert!(matches!(err, Error::Framing { offset: 16, .. }));
        assert!(err.is_fatal_position());

        let mut stream = RecordStream::from_bytes(vec![0, 0]);
        assert!(matches!(stream.next_record(), Err(Error::Framing { .. })));
    }

    #[test]
    fn test_corrupt_trailer_detected_when_rewinding() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_str("first").unwrap();
        writer.write_str("second").unwrap();
        let mut bytes = writer.into_inner();
        // Corrupt the second record's trailer to claim 5 bytes
        let n = bytes.len();
        bytes[n - 4..].copy_from_slice(&5u32.to_be_bytes());

        let mut stream = RecordStream::from_bytes(bytes);
        stream.next_record().unwrap();
        assert!(stream.next_record().is_err());
        // Cursor is still after the first record; stepping back works
        stream.seek_records(-1).unwrap();
        assert_eq!(stream.next_record().unwrap().unwrap().as_text(), Some("first"));
    }

    #[test]
    fn test_indexed_access_is_independent() {
        let mut stream = stream_of(&[b"header", b"cell", b"wave"]);
        stream.next_record().unwrap();

        assert_eq!(stream.record_count().unwrap(), 3);
        assert_eq!(
            stream.index().unwrap()[2],
            RecordEntry { offset: 26, len: 4 }
        );

        stream.label(["version", "cell", "wave", "ignored"]).unwrap();
        assert_eq!(stream.get_labelled("wave").unwrap().data, b"wave");
        assert_eq!(stream.get(0).unwrap().data, b"header");
        assert!(matches!(stream.get_labelled("nope"), Err(Error::UnknownLabel(_))));
        assert!(matches!(stream.get(3), Err(Error::RecordOutOfRange { ordinal: 3, count: 3 })));

        // Sequential cursor untouched
        assert_eq!(stream.ordinal(), 1);
        assert_eq!(stream.next_record().unwrap().unwrap().data, b"cell");
    }

    #[test]
    fn test_typed_payload_helpers() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_f64s(&[1.0, 2.5]).unwrap();
        writer.write_i32s(&[7]).unwrap();
        writer.write_bools(&[true, false]).unwrap();
        assert_eq!(writer.records(), 3);

        let mut stream = RecordStream::from_bytes(writer.into_inner());
        let floats = stream.next_record().unwrap().unwrap();
        assert_eq!(floats.decode_as::<f64>().unwrap(), vec![1.0, 2.5]);
        let ints = stream.next_record().unwrap().unwrap();
        assert_eq!(ints.decode(ValueKind::Int).unwrap(), Value::Int(7));
        let bools = stream.next_record().unwrap().unwrap();
        assert_eq!(bools.decode(ValueKind::Bool).unwrap(), Value::BoolArray(vec![true, false]));
    }
}
