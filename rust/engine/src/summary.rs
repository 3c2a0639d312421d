// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serializable summaries of decoded output.
//!
//! A summary lists every section path that occurs in a checkpoint, how often
//! it occurs and which fields it carries, without the field data itself.

use serde::{Deserialize, Serialize};
use simout_core::{Checkpoint, Node, RunStats, Schema, ValueKind};

use crate::error::{Error, Result};

/// Shape of one decoded checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub source: String,
    pub version: String,
    pub records: usize,
    pub bytes: u64,
    pub sections: Vec<SectionSummary>,
}

/// One section path, merged over all its occurrences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// `/`-separated path; the root is `root`
    pub path: String,
    pub occurrences: usize,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: ValueKind,
    /// Element count of the first occurrence
    pub len: usize,
}

impl CheckpointSummary {
    pub fn from_checkpoint(source: impl Into<String>, checkpoint: &Checkpoint, records: usize, bytes: u64) -> Self {
        let mut sections = Vec::new();
        collect_section(Schema::ROOT, &checkpoint.root, &mut sections);
        Self {
            source: source.into(),
            version: checkpoint.version.to_string(),
            records,
            bytes,
            sections,
        }
    }

    pub fn section(&self, path: &str) -> Option<&SectionSummary> {
        self.sections.iter().find(|s| s.path == path)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn collect_section(path: &str, node: &Node, out: &mut Vec<SectionSummary>) {
    let Some(group) = node.as_group() else {
        return;
    };

    let index = match out.iter().position(|s| s.path == path) {
        Some(i) => {
            out[i].occurrences += 1;
            i
        }
        None => {
            out.push(SectionSummary {
                path: path.to_string(),
                occurrences: 1,
                fields: Vec::new(),
            });
            out.len() - 1
        }
    };

    for (name, child) in group {
        match child {
            Node::Scalar(value) => {
                let fields = &mut out[index].fields;
                if !fields.iter().any(|f| &f.name == name) {
                    fields.push(FieldSummary {
                        name: name.clone(),
                        kind: value.kind(),
                        len: value.len(),
                    });
                }
            }
            Node::Group(_) => collect_section(&child_path(path, name), child, out),
            Node::List(items) => {
                let list_path = child_path(path, name);
                for item in items {
                    collect_section(&list_path, item, out);
                }
            }
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == Schema::ROOT {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Full decoded tree as JSON
pub fn checkpoint_to_json(checkpoint: &Checkpoint) -> Result<String> {
    serde_json::to_string_pretty(checkpoint).map_err(|e| Error::Serialization(e.to_string()))
}

/// Outcome of running a grammar over one text log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogScan {
    pub lines: usize,
    pub blocks: usize,
    pub unmatched_lines: usize,
    pub max_depth: usize,
}

impl LogScan {
    pub fn new(lines: usize, stats: RunStats) -> Self {
        Self {
            lines,
            blocks: stats.blocks,
            unmatched_lines: stats.unmatched_lines,
            max_depth: stats.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simout_core::{CheckpointDecoder, RecordStream, RecordWriter};

    fn sample() -> Checkpoint {
        let schema = Schema::from_table(&[
            ("root", false, &[("task", (1, 0), ValueKind::Str)]),
            ("ion", true, &[("pos", (1, 0), ValueKind::Float)]),
        ]);
        let mut w = RecordWriter::new(Vec::new());
        w.write_str("3.0").unwrap();
        w.write_str("singlepoint").unwrap();
        for pos in [[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]] {
            w.write_str("BEGIN_ION").unwrap();
            w.write_f64s(&pos).unwrap();
            w.write_str("END_ION").unwrap();
        }
        let stream = RecordStream::from_bytes(w.into_inner());
        CheckpointDecoder::new(stream, &schema).decode().unwrap()
    }

    #[test]
    fn test_summary_merges_repeated_sections() {
        let summary = CheckpointSummary::from_checkpoint("mem", &sample(), 8, 0);
        assert_eq!(summary.version, "3.0");

        let root = summary.section("root").unwrap();
        assert_eq!(root.fields[0].kind, ValueKind::Str);

        let ion = summary.section("ion").unwrap();
        assert_eq!(ion.occurrences, 2);
        assert_eq!(ion.fields.len(), 1);
        assert_eq!(ion.fields[0].len, 3);
    }

    #[test]
    fn test_json_rendering() {
        let checkpoint = sample();
        let json: serde_json::Value = serde_json::from_str(&checkpoint_to_json(&checkpoint).unwrap()).unwrap();
        assert_eq!(json["version"], serde_json::json!([3, 0]));
        assert_eq!(json["root"]["task"], "singlepoint");
        assert_eq!(json["root"]["ion"][1]["pos"][2], 0.5);

        let summary = CheckpointSummary::from_checkpoint("mem", &checkpoint, 8, 0);
        let back: CheckpointSummary = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(back, summary);
    }
}
