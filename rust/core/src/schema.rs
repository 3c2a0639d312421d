// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checkpoint Schema
//!
//! Static per-format tables: which fields each section carries, in order,
//! and the file version each field first appeared in.

use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, rest},
    sequence::preceded,
    IResult,
};

use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::ValueKind;

/// `major.minor` file format version; patch levels are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatVersion(pub u16, pub u16);

impl FormatVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        FormatVersion(major, minor)
    }

    #[inline]
    pub fn major(&self) -> u16 {
        self.0
    }

    #[inline]
    pub fn minor(&self) -> u16 {
        self.1
    }

    /// Parse a version record such as `"2.2.1"`, `" 3.1 "` or `"4."`.
    ///
    /// Whitespace, NUL padding and trailing separators are stripped first.
    /// A bare major number means minor 0.
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned = input
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .trim_end_matches(['.', ',', ';', '-', '_']);

        match all_consuming(version)(cleaned) {
            Ok((_, v)) => Ok(v),
            Err(_) => Err(Error::InvalidVersion(input.trim().to_string())),
        }
    }
}

fn number(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |s: &str| s.parse::<u16>())(input)
}

/// `major[.minor[.anything]]`
fn version(input: &str) -> IResult<&str, FormatVersion> {
    let (input, major) = number(input)?;
    let (input, minor) = opt(preceded(char('.'), number))(input)?;
    match minor {
        Some(minor) => {
            let (input, _patch) = opt(preceded(char('.'), rest))(input)?;
            Ok((input, FormatVersion(major, minor)))
        }
        None => Ok((input, FormatVersion(major, 0))),
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<(u16, u16)> for FormatVersion {
    fn from((major, minor): (u16, u16)) -> Self {
        FormatVersion(major, minor)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// One field of a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    /// First file version that writes this field
    pub min_version: FormatVersion,
    pub kind: ValueKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, min_version: impl Into<FormatVersion>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            min_version: min_version.into(),
            kind,
        }
    }

    /// Whether a file of `version` writes this field
    #[inline]
    pub fn present_in(&self, version: FormatVersion) -> bool {
        self.min_version <= version
    }
}

/// Ordered fields of one named section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Sibling occurrences accumulate into a list instead of replacing
    pub repeated: bool,
}

impl SectionSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: section_key(name),
            fields: Vec::new(),
            repeated: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, min_version: (u16, u16), kind: ValueKind) -> Self {
        self.fields.push(FieldDef::new(name, min_version, kind));
        self
    }

    pub fn repeated(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields a file of `version` writes. Gating is positional: the list
    /// stops at the first field newer than the file.
    pub fn fields_for(&self, version: FormatVersion) -> &[FieldDef] {
        let n = self
            .fields
            .iter()
            .position(|f| !f.present_in(version))
            .unwrap_or(self.fields.len());
        &self.fields[..n]
    }
}

/// Row of a compact schema table: `(field, (major, minor), kind)`
pub type FieldRow<'a> = (&'a str, (u16, u16), ValueKind);

/// Row of a compact schema table: `(section, repeated, fields)`
pub type SectionRow<'a> = (&'a str, bool, &'a [FieldRow<'a>]);

/// Section name -> section layout, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    sections: IndexMap<String, SectionSchema>,
}

impl Schema {
    /// Key of the unlabelled top-level parameters
    pub const ROOT: &'static str = "root";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a static table
    ///
    /// ```
    /// use simout_core::{Schema, ValueKind};
    ///
    /// let schema = Schema::from_table(&[
    ///     ("root", false, &[("task", (1, 0), ValueKind::Str)]),
    ///     ("cell", false, &[
    ///         ("real_lattice", (1, 0), ValueKind::Float),
    ///         ("num_species", (2, 0), ValueKind::Int),
    ///     ]),
    /// ]);
    /// assert_eq!(schema.get("CELL").unwrap().fields.len(), 2);
    /// ```
    pub fn from_table(table: &[SectionRow<'_>]) -> Self {
        table
            .iter()
            .fold(Self::new(), |schema, &(name, repeated, fields)| {
                let section = fields
                    .iter()
                    .fold(SectionSchema::new(name).repeated(repeated), |s, &(field, since, kind)| {
                        s.field(field, since, kind)
                    });
                schema.section(section)
            })
    }

    /// Add or replace a section
    pub fn section(mut self, section: SectionSchema) -> Self {
        self.insert(section);
        self
    }

    pub fn insert(&mut self, section: SectionSchema) -> Option<SectionSchema> {
        self.sections.insert(section.name.clone(), section)
    }

    /// Look up a section; names are matched case-insensitively
    pub fn get(&self, name: &str) -> Option<&SectionSchema> {
        self.sections
            .get(name)
            .or_else(|| self.sections.get(&section_key(name)))
    }

    /// Like [`get`](Self::get) but an absent section is an error
    pub fn require(&self, name: &str) -> Result<&SectionSchema> {
        self.get(name)
            .ok_or_else(|| Error::UnknownSection(name.to_string()))
    }

    pub fn root(&self) -> Option<&SectionSchema> {
        self.sections.get(Self::ROOT)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionSchema> {
        self.sections.values()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Canonical section key, shared with marker parsing: trimmed and
/// ASCII-lowercased, nothing else
pub(crate) fn section_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
