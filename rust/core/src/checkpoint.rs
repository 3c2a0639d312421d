// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checkpoint Decoder - recursive, version-gated section walker
//!
//! A checkpoint is a version record followed by a flat run of records in
//! which `BEGIN_<NAME>` / `END_<NAME>` marker records delimit nested
//! sections. Inside a section the schema's fields come first, in declaration
//! order, followed by child sections.
//!
//! Fields are gated positionally: a file of version `v` writes every field up
//! to (not including) the first one whose `min_version > v`. A data record
//! where a gated field would sit means the file and schema disagree.

use indexmap::map::Entry;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::io::{Read, Seek};

use crate::config::ParseConfig;
use crate::error::{Error, Position, Result};
use crate::record_stream::{Record, RecordStream};
use crate::schema::{section_key, FormatVersion, Schema, SectionSchema};
use crate::value::{Value, ValueKind};

/// Decoded checkpoint tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Node {
    Scalar(Value),
    Group(IndexMap<String, Node>),
    /// Occurrences of a repeated section, in file order
    List(Vec<Node>),
}

impl Node {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Child by key (groups) or by index (lists)
    pub fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Group(g) => g.get(key),
            Node::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            Node::Scalar(_) => None,
        }
    }

    /// Walk a `/`-separated path, e.g. `"species/1/mass"`
    pub fn get(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, key| node.child(key))
    }
}

/// A fully decoded checkpoint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Checkpoint {
    pub version: FormatVersion,
    pub root: Node,
}

impl Checkpoint {
    /// Look up a node by path from the root
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.root.get(path)
    }

    /// Look up a scalar or array value by path
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.get(path).and_then(Node::as_value)
    }

    /// Top-level keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root
            .as_group()
            .into_iter()
            .flat_map(|g| g.keys().map(String::as_str))
    }
}

/// A section marker record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Begin(String),
    End(String),
}

impl Marker {
    /// Recognise a marker payload. Anything that is not one (too long,
    /// not UTF-8, no `BEGIN_`/`END_` prefix, empty name) is `None`.
    pub fn parse(payload: &[u8], max_len: usize) -> Option<Marker> {
        if payload.len() > max_len {
            return None;
        }
        let text = std::str::from_utf8(payload)
            .ok()?
            .trim_matches(|c: char| c.is_whitespace() || c == '\0');

        let (name, begin) = if let Some(rest) = strip_prefix_ci(text, "BEGIN_") {
            (rest, true)
        } else {
            (strip_prefix_ci(text, "END_")?, false)
        };

        let name = section_key(name);
        if name.is_empty() {
            return None;
        }
        Some(if begin { Marker::Begin(name) } else { Marker::End(name) })
    }
}

#[inline]
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// How the field phase of a section ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldPhase {
    /// Section's own END marker was consumed
    Closed,
    /// Body phase follows
    Continue,
}

/// Walks a record stream against a [`Schema`]
pub struct CheckpointDecoder<'s, R> {
    stream: RecordStream<R>,
    schema: &'s Schema,
    config: ParseConfig,
    name: String,
    version: FormatVersion,
    /// Currently open sections, outermost first (root excluded)
    open: SmallVec<[String; 8]>,
}

impl<'s, R: Read + Seek> CheckpointDecoder<'s, R> {
    pub fn new(stream: RecordStream<R>, schema: &'s Schema) -> Self {
        Self {
            stream,
            schema,
            config: ParseConfig::default(),
            name: "checkpoint".to_string(),
            version: FormatVersion::default(),
            open: SmallVec::new(),
        }
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in error messages
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Read the version record, then the rest of the stream as the root
    pub fn decode(&mut self) -> Result<Checkpoint> {
        let record = self
            .stream
            .next_record()?
            .ok_or_else(|| self.eof("missing version record"))?;
        self.version = FormatVersion::parse(&String::from_utf8_lossy(&record.data))?;
        tracing::debug!(source = %self.name, version = %self.version, "decoding checkpoint");

        let root = self.decode_section(Schema::ROOT, true)?;
        Ok(Checkpoint {
            version: self.version,
            root: Node::Group(root),
        })
    }

    /// Version read by [`decode`](Self::decode)
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn into_stream(self) -> RecordStream<R> {
        self.stream
    }

    fn decode_section(&mut self, name: &str, is_root: bool) -> Result<IndexMap<String, Node>> {
        let schema = self.schema;
        let section = if is_root {
            schema.root()
        } else {
            Some(schema.require(name)?)
        };

        if !is_root {
            if self.open.len() >= self.config.max_depth {
                return Err(Error::RecursionLimit {
                    limit: self.config.max_depth,
                    at: format!("{}/{}", self.path(), name),
                });
            }
            self.open.push(name.to_string());
            tracing::trace!(section = %self.path(), offset = self.stream.position(), "open section");
        }

        let mut group = IndexMap::new();
        let phase = match section {
            Some(section) => self.decode_fields(section, &mut group)?,
            None => FieldPhase::Continue,
        };
        if phase == FieldPhase::Continue {
            self.decode_body(name, is_root, &mut group)?;
        }

        if !is_root {
            self.open.pop();
        }
        Ok(group)
    }

    /// Positional field phase. A marker-shaped record ends it, except where
    /// a string field is expected: there only a `BEGIN_` of a known section
    /// or an `END_` of an open one counts, anything else is the field value.
    fn decode_fields(
        &mut self,
        section: &SectionSchema,
        group: &mut IndexMap<String, Node>,
    ) -> Result<FieldPhase> {
        let present = section.fields_for(self.version);
        for field in present {
            let Some(record) = self.stream.next_record()? else {
                return Ok(FieldPhase::Continue);
            };
            match self.structural(&record, section, field.kind) {
                Some(Marker::End(closed)) if closed == section.name => {
                    tracing::trace!(section = %section.name, field = %field.name, "section closed before field");
                    return Ok(FieldPhase::Closed);
                }
                Some(_) => {
                    self.stream.unread()?;
                    return Ok(FieldPhase::Continue);
                }
                None => {}
            }

            let value = record.decode(field.kind)?;
            group.insert(field.name.clone(), Node::Scalar(value));
        }

        // Fields from the first gated one on must be absent from the stream
        if let Some(gated) = section.fields.get(present.len()) {
            if let Some(record) = self.stream.next_record()? {
                self.stream.unread()?;
                if self.structural(&record, section, gated.kind).is_none() {
                    return Err(Error::VersionInvariant {
                        section: section.name.clone(),
                        field: gated.name.clone(),
                        required: gated.min_version,
                        found: self.version,
                    });
                }
            }
            tracing::trace!(section = %section.name, field = %gated.name, "field gated by version");
        }
        Ok(FieldPhase::Continue)
    }

    fn decode_body(&mut self, name: &str, is_root: bool, group: &mut IndexMap<String, Node>) -> Result<()> {
        loop {
            let Some(record) = self.stream.next_record()? else {
                if is_root {
                    return Ok(());
                }
                return Err(self.eof(&format!("section '{}' never closed", self.path())));
            };

            match self.marker(&record) {
                Some(Marker::End(closed)) if !is_root && closed == name => return Ok(()),
                Some(Marker::End(closed)) => {
                    return Err(Error::StructureMismatch {
                        opened: name.to_string(),
                        closed,
                    })
                }
                Some(Marker::Begin(child)) => {
                    let node = Node::Group(self.decode_section(&child, false)?);
                    self.attach(group, child, node);
                }
                None => {
                    return Err(Error::UnexpectedRecord {
                        section: name.to_string(),
                        offset: record.offset,
                    })
                }
            }
        }
    }

    fn attach(&self, group: &mut IndexMap<String, Node>, child: String, node: Node) {
        let repeated = self.schema.get(&child).map_or(false, |s| s.repeated);
        match group.entry(child) {
            Entry::Vacant(e) => {
                e.insert(if repeated { Node::List(vec![node]) } else { node });
            }
            Entry::Occupied(mut e) => {
                if repeated {
                    if let Node::List(items) = e.get_mut() {
                        items.push(node);
                        return;
                    }
                }
                tracing::warn!(
                    source = %self.name,
                    section = %e.key(),
                    "duplicate non-repeated section overwrites earlier one"
                );
                e.insert(node);
            }
        }
    }

    #[inline]
    fn marker(&self, record: &Record) -> Option<Marker> {
        Marker::parse(&record.data, self.config.max_marker_len)
    }

    /// Marker that ends the field phase where a `kind` value is expected
    fn structural(&self, record: &Record, section: &SectionSchema, kind: ValueKind) -> Option<Marker> {
        let marker = self.marker(record)?;
        if kind != ValueKind::Str {
            return Some(marker);
        }
        let known = match &marker {
            Marker::Begin(child) => self.schema.contains(child),
            Marker::End(closed) => *closed == section.name || self.open.iter().any(|o| o == closed),
        };
        known.then_some(marker)
    }

    fn path(&self) -> String {
        self.open.join("/")
    }

    fn eof(&self, context: &str) -> Error {
        Error::UnexpectedEof {
            source_name: self.name.clone(),
            at: Position::Record(self.stream.ordinal()),
            context: context.to_string(),
        }
    }
}
