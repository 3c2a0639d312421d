// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser limits, loadable from environment variables.

/// Limits shared by the text grammar and the checkpoint decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting of checkpoint sections or recursive block re-parses
    pub max_depth: usize,
    /// Records longer than this are never treated as section markers
    pub max_marker_len: usize,
}

impl ParseConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_MARKER_LEN: usize = 128;

    /// Load configuration from environment variables.
    ///
    /// - `SIMOUT_MAX_DEPTH`
    /// - `SIMOUT_MAX_MARKER_LEN`
    pub fn from_env() -> Self {
        Self {
            max_depth: std::env::var("SIMOUT_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v: &usize| v > 0)
                .unwrap_or(Self::DEFAULT_MAX_DEPTH),
            max_marker_len: std::env::var("SIMOUT_MAX_MARKER_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v: &usize| v > 0)
                .unwrap_or(Self::DEFAULT_MAX_MARKER_LEN),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_marker_len(mut self, max_marker_len: usize) -> Self {
        self.max_marker_len = max_marker_len;
        self
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_marker_len: Self::DEFAULT_MAX_MARKER_LEN,
        }
    }
}
