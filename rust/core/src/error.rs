// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for text and binary stream parsing.

use crate::schema::FormatVersion;
use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading text logs or unformatted checkpoints
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header/trailer length mismatch or a record cut short by EOF.
    /// The stream position can no longer be trusted.
    #[error("Framing error in record at offset {offset}: {reason}")]
    Framing { offset: u64, reason: String },

    #[error("Unexpected end of input in {source_name} at {at}: {context}")]
    UnexpectedEof {
        source_name: String,
        at: Position,
        context: String,
    },

    #[error("Structure mismatch: section '{opened}' closed by 'END_{closed}'")]
    StructureMismatch { opened: String, closed: String },

    #[error(
        "Field '{section}.{field}' requires format {required} but file declares {found}, yet a value is present"
    )]
    VersionInvariant {
        section: String,
        field: String,
        required: FormatVersion,
        found: FormatVersion,
    },

    #[error("Cannot rewind {0}")]
    RewindUnderflow(String),

    #[error("No schema entry for section '{0}'")]
    UnknownSection(String),

    #[error("Expected a section marker inside '{section}' at offset {offset}, found a data record")]
    UnexpectedRecord { section: String, offset: u64 },

    #[error("Cannot decode {input:?} as {kind}")]
    InvalidValue { kind: ValueKind, input: String },

    #[error("Invalid format version {0:?}")]
    InvalidVersion(String),

    #[error("Nesting deeper than {limit} levels at '{at}'")]
    RecursionLimit { limit: usize, at: String },

    #[error("Unknown record label '{0}'")]
    UnknownLabel(String),

    #[error("Record #{ordinal} out of range ({count} records)")]
    RecordOutOfRange { ordinal: usize, count: usize },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub fn framing(offset: u64, reason: impl Into<String>) -> Self {
        Error::Framing {
            offset,
            reason: reason.into(),
        }
    }

    pub fn invalid_value(kind: ValueKind, input: impl Into<String>) -> Self {
        Error::InvalidValue {
            kind,
            input: input.into(),
        }
    }

    /// True for errors after which the underlying cursor is unreliable
    pub fn is_fatal_position(&self) -> bool {
        matches!(self, Error::Framing { .. } | Error::Io(_))
    }
}

/// Where input ran out: a text line or a binary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// 1-based number of the last line read
    Line(usize),
    /// Number of records read
    Record(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Line(n) => write!(f, "line {}", n),
            Position::Record(n) => write!(f, "record #{}", n),
        }
    }
}
