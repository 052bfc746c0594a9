//! Diagnostic dump of a registry subtree.
//!
//! The walk is lazy and recomputed on every call. It only performs reads, so
//! executable nodes are listed but never invoked.

use crate::registry::node::{KindTag, Node};
use crate::registry::value::Value;
use serde::Serialize;
use std::fmt;

/// One line of a subtree dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpEntry {
    /// Slash-delimited path relative to the dumped node
    pub path: String,
    pub kind: KindTag,
    /// Current value, for readable nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl DumpEntry {
    /// Nesting depth, 0 for direct children of the dumped node.
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

impl fmt::Display for DumpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path, self.kind)?;
        if let Some(value) = &self.value {
            write!(f, " = {}", value)?;
        }
        Ok(())
    }
}

/// Depth-first, pre-order iterator over the descendants of a node.
pub struct DumpIter<'a> {
    stack: Vec<(String, &'a Node)>,
}

impl<'a> DumpIter<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        let stack = root
            .children()
            .iter()
            .rev()
            .map(|child| (child.name().to_string(), child))
            .collect();
        Self { stack }
    }
}

impl Iterator for DumpIter<'_> {
    type Item = DumpEntry;

    fn next(&mut self) -> Option<DumpEntry> {
        let (path, node) = self.stack.pop()?;
        for child in node.children().iter().rev() {
            self.stack.push((format!("{}/{}", path, child.name()), child));
        }
        let value = if node.is_readable() {
            node.read().ok()
        } else {
            None
        };
        Some(DumpEntry {
            path,
            kind: node.tag(),
            value,
        })
    }
}

/// Render entries as an indented multi-line listing.
pub fn render(entries: impl IntoIterator<Item = DumpEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        let name = entry.path.rsplit('/').next().unwrap_or_default();
        out.push_str(&"  ".repeat(entry.depth()));
        out.push_str(name);
        out.push_str(&format!(" [{}]", entry.kind));
        if let Some(value) = &entry.value {
            out.push_str(&format!(" = {}", value));
        }
        out.push('\n');
    }
    out
}
