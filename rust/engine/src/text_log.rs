// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text log helpers over files on disk.

use simout_core::{BlockGrammar, BlockSpec, LineSource, LineStream, TextBlock};
use std::path::Path;

use crate::error::{Error, Result};
use crate::summary::LogScan;

fn open_log(path: &Path) -> Result<LineStream<std::io::BufReader<std::fs::File>>> {
    LineStream::open(path).map_err(|e| match e {
        simout_core::Error::Io(io) => Error::open(path, io),
        other => Error::Core(other),
    })
}

/// Run `grammar` over the whole log at `path`
pub fn scan_log<C>(path: &Path, grammar: &BlockGrammar<C>, ctx: &mut C) -> Result<LogScan> {
    let mut stream = open_log(path)?;
    let stats = grammar.run(&mut stream, ctx)?;
    let scan = LogScan::new(stream.line_number(), stats);
    tracing::debug!(
        path = %path.display(),
        lines = scan.lines,
        blocks = scan.blocks,
        "scanned text log"
    );
    Ok(scan)
}

/// Every non-overlapping block of the log matching `spec`, in file order
pub fn extract_blocks(path: &Path, spec: &BlockSpec) -> Result<Vec<TextBlock>> {
    let mut stream = open_log(path)?;
    let mut blocks = Vec::new();
    while let Some(line) = stream.next_line()? {
        if let Some(block) = TextBlock::from_pattern(&line, &mut stream, spec)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}
