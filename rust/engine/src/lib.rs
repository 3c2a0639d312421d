// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # simout Engine
//!
//! File-level facade over [`simout_core`]: checkpoints are memory-mapped
//! and decoded against a schema, text logs are scanned with a block grammar,
//! and results can be rendered as JSON summaries.
//!
//! ```rust,no_run
//! use simout_engine::Engine;
//! use simout_core::{Schema, ValueKind};
//!
//! let schema = Schema::from_table(&[("cell", false, &[("real_lattice", (1, 0), ValueKind::Float)])]);
//! let engine = Engine::from_env();
//! let summary = engine.summarize_checkpoint("run.check", &schema).unwrap();
//! println!("{}", summary.to_json().unwrap());
//! ```

pub mod error;
pub mod mapped;
pub mod summary;
pub mod text_log;

pub use error::{Error, Result};
pub use mapped::MappedFile;
pub use summary::{checkpoint_to_json, CheckpointSummary, FieldSummary, LogScan, SectionSummary};

use simout_core::{
    BlockGrammar, BlockSpec, Checkpoint, CheckpointDecoder, ParseConfig, RecordEntry, Schema,
    TextBlock,
};
use std::path::Path;

/// Entry point holding the parse limits shared by every operation
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: ParseConfig,
}

impl Engine {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    /// Limits from `SIMOUT_MAX_DEPTH` / `SIMOUT_MAX_MARKER_LEN`
    pub fn from_env() -> Self {
        Self::new(ParseConfig::from_env())
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Empty grammar carrying this engine's limits
    pub fn grammar<C>(&self) -> BlockGrammar<C> {
        BlockGrammar::with_config(self.config.clone())
    }

    pub fn decode_checkpoint(&self, path: impl AsRef<Path>, schema: &Schema) -> Result<Checkpoint> {
        let mapped = MappedFile::open(path)?;
        self.decode_mapped(&mapped, schema)
    }

    pub fn decode_mapped(&self, mapped: &MappedFile, schema: &Schema) -> Result<Checkpoint> {
        let checkpoint = CheckpointDecoder::new(mapped.records()?, schema)
            .with_config(self.config.clone())
            .with_name(mapped.path().display().to_string())
            .decode()?;
        Ok(checkpoint)
    }

    /// Decode and reduce to a section/field summary
    pub fn summarize_checkpoint(&self, path: impl AsRef<Path>, schema: &Schema) -> Result<CheckpointSummary> {
        let mapped = MappedFile::open(path)?;
        let checkpoint = self.decode_mapped(&mapped, schema)?;
        let records = mapped.records()?.record_count()?;
        Ok(CheckpointSummary::from_checkpoint(
            mapped.path().display().to_string(),
            &checkpoint,
            records,
            mapped.len() as u64,
        ))
    }

    /// Offsets and lengths of every record in a file
    pub fn index_records(&self, path: impl AsRef<Path>) -> Result<Vec<RecordEntry>> {
        let mapped = MappedFile::open(path)?;
        let mut stream = mapped.records()?;
        Ok(stream.index()?.to_vec())
    }

    pub fn scan_log<C>(&self, path: impl AsRef<Path>, grammar: &BlockGrammar<C>, ctx: &mut C) -> Result<LogScan> {
        text_log::scan_log(path.as_ref(), grammar, ctx)
    }

    pub fn extract_blocks(&self, path: impl AsRef<Path>, spec: &BlockSpec) -> Result<Vec<TextBlock>> {
        text_log::extract_blocks(path.as_ref(), spec)
    }
}
