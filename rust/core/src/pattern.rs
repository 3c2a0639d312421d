// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line patterns for block start/end markers.
//!
//! Most delimiters in simulation logs are fixed banners, so literal markers
//! skip the regex engine and use [memchr](https://docs.rs/memchr)'s substring
//! search instead.

use crate::error::Result;
use memchr::memmem;
use regex::Regex;
use std::fmt;

/// Anything that can test a single line
pub trait LinePattern {
    fn is_match(&self, line: &str) -> bool;
}

impl LinePattern for Regex {
    #[inline]
    fn is_match(&self, line: &str) -> bool {
        Regex::is_match(self, line)
    }
}

impl<F: Fn(&str) -> bool> LinePattern for F {
    #[inline]
    fn is_match(&self, line: &str) -> bool {
        self(line)
    }
}

/// A concrete, clonable marker pattern
#[derive(Clone)]
pub enum Pattern {
    /// Unanchored regular expression search
    Regex(Regex),
    /// Substring search
    Literal(memmem::Finder<'static>),
    /// Arbitrary line predicate
    Predicate(fn(&str) -> bool),
}

impl Pattern {
    /// Compile a regex marker
    pub fn regex(expr: &str) -> Result<Self> {
        Ok(Pattern::Regex(Regex::new(expr)?))
    }

    /// Substring marker
    pub fn literal(needle: &str) -> Self {
        Pattern::Literal(memmem::Finder::new(needle).into_owned())
    }

    pub fn predicate(f: fn(&str) -> bool) -> Self {
        Pattern::Predicate(f)
    }

    /// Matches lines that are empty after trimming
    pub fn blank() -> Self {
        Pattern::Predicate(|line| line.trim().is_empty())
    }
}

impl LinePattern for Pattern {
    #[inline]
    fn is_match(&self, line: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(line),
            Pattern::Literal(finder) => finder.find(line.as_bytes()).is_some(),
            Pattern::Predicate(f) => f(line),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Pattern::Literal(finder) => write!(
                f,
                "Literal({:?})",
                String::from_utf8_lossy(finder.needle())
            ),
            Pattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
