// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only memory-mapped checkpoint files.

use memmap2::Mmap;
use simout_core::RecordStream;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A checkpoint file mapped into memory
pub struct MappedFile {
    path: PathBuf,
    /// `None` for empty files, which cannot be mapped
    map: Option<Mmap>,
}

impl MappedFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let len = file.metadata().map_err(|e| Error::open(path, e))?.len();

        let map = if len == 0 {
            None
        } else {
            // SAFETY: mapped read-only; the file is not modified while mapped.
            let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::open(path, e))?;
            Some(map)
        };

        tracing::debug!(path = %path.display(), bytes = len, "mapped checkpoint");
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// A record stream over the mapped bytes
    pub fn records(&self) -> Result<RecordStream<Cursor<&[u8]>>> {
        Ok(RecordStream::new(Cursor::new(self.bytes()))?)
    }
}
