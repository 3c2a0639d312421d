// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # simout Core
//!
//! Stream-parsing primitives for scientific simulation output.
//!
//! ## Overview
//!
//! Simulation codes write two kinds of output, and this crate provides the
//! generic machinery for both:
//!
//! - **Text logs**: a [`LineStream`] with one-line rewind, [`TextBlock`]s
//!   captured between start/end markers, and a [`BlockGrammar`] that
//!   dispatches blocks to handlers (recursively, for self-similar sections)
//! - **Unformatted checkpoints**: a [`RecordStream`] over
//!   `[u32 BE len][payload][u32 BE len]` records with skip/rewind and indexed
//!   access, and a [`CheckpointDecoder`] that walks `BEGIN_`/`END_` sections
//!   against a version-gated [`Schema`]
//! - **Values**: one "decode as T" operation ([`Decode`], [`Value`]) for text
//!   tokens and big-endian payloads
//!
//! ## Quick Start
//!
//! ```rust
//! use simout_core::{BlockSpec, LineSource, LineStream, TextBlock};
//!
//! let log = "header\nUnit Cell\n-----\n 1.0 0.0\n-----\ntrailer\n";
//! let mut stream = LineStream::from_text("run.log", log);
//! let spec = BlockSpec::literal("Unit Cell", "-----").n_end(2);
//!
//! while let Some(line) = stream.next_line().unwrap() {
//!     if let Some(block) = TextBlock::from_pattern(&line, &mut stream, &spec).unwrap() {
//!         assert_eq!(block.len(), 4);
//!     }
//! }
//! ```
//!
//! ## Checkpoints
//!
//! ```rust
//! use simout_core::{CheckpointDecoder, RecordStream, RecordWriter, Schema, Value, ValueKind};
//!
//! let mut writer = RecordWriter::new(Vec::new());
//! writer.write_str("1.0").unwrap();
//! writer.write_str("BEGIN_CELL").unwrap();
//! writer.write_f64s(&[5.43]).unwrap();
//! writer.write_str("END_CELL").unwrap();
//!
//! let schema = Schema::from_table(&[("cell", false, &[("alat", (1, 0), ValueKind::Float)])]);
//! let stream = RecordStream::from_bytes(writer.into_inner());
//! let checkpoint = CheckpointDecoder::new(stream, &schema).decode().unwrap();
//! assert_eq!(checkpoint.value("cell/alat"), Some(&Value::Float(5.43)));
//! ```
//!
//! ## Configuration
//!
//! [`ParseConfig::from_env`] reads `SIMOUT_MAX_DEPTH` and
//! `SIMOUT_MAX_MARKER_LEN`.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for decoded values and checkpoints

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod grammar;
pub mod line_stream;
pub mod pattern;
pub mod record_stream;
pub mod schema;
pub mod text_block;
pub mod value;

pub use checkpoint::{Checkpoint, CheckpointDecoder, Marker, Node};
pub use config::ParseConfig;
pub use error::{Error, Position, Result};
pub use grammar::{BlockGrammar, GrammarRule, GrammarRun, RunStats};
pub use line_stream::{LineSource, LineStream};
pub use pattern::{LinePattern, Pattern};
pub use record_stream::{Record, RecordEntry, RecordStream, RecordWriter};
pub use schema::{FieldDef, FormatVersion, Schema, SectionSchema};
pub use text_block::{BlockSpec, TextBlock};
pub use value::{determine_kind, normalise_key, parse_all, parse_as, Decode, Value, ValueKind};
