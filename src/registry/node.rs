//! Registry tree nodes.
//!
//! A [`Node`] owns its children in registration order. Kind-specific
//! behaviour lives in [`NodeKind`]; tree walking code only uses the uniform
//! `read` / `write` / `invoke` surface and never matches on the kind.

use crate::registry::binding::SignalBinding;
use crate::registry::bitfield::BitView;
use crate::registry::dump::DumpIter;
use crate::registry::enumeration::EnumNode;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::exec::ExecNode;
use crate::registry::value::{Value, ValueCell};
use serde::Serialize;
use std::fmt;

/// Capability carried by a node.
#[derive(Debug)]
pub enum NodeKind {
    /// Plain grouping node
    Group,
    Value(ValueCell),
    BitView(BitView),
    Enum(EnumNode),
    Exec(ExecNode),
    Signal(SignalBinding),
}

impl NodeKind {
    pub fn tag(&self) -> KindTag {
        match self {
            NodeKind::Group => KindTag::Group,
            NodeKind::Value(_) => KindTag::Value,
            NodeKind::BitView(_) => KindTag::BitView,
            NodeKind::Enum(_) => KindTag::Enum,
            NodeKind::Exec(_) => KindTag::Exec,
            NodeKind::Signal(_) => KindTag::SignalBinding,
        }
    }
}

/// Data-free discriminant of [`NodeKind`], used in dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Group,
    Value,
    BitView,
    Enum,
    Exec,
    SignalBinding,
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KindTag::Group => "group",
            KindTag::Value => "value",
            KindTag::BitView => "bit_view",
            KindTag::Enum => "enum",
            KindTag::Exec => "exec",
            KindTag::SignalBinding => "signal",
        })
    }
}

/// Split a slash-delimited path into its non-empty segments.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// An addressable element of the registry tree.
#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    /// Children in registration order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Attach `child` as the last child of this node.
    ///
    /// Fails with [`RegistryError::InvalidName`] if the child's name is not a
    /// single path segment, and with [`RegistryError::NameConflict`] if a
    /// sibling already has the same name. The tree is left untouched on
    /// failure.
    pub fn attach(&mut self, child: Node) -> RegistryResult<&mut Self> {
        if child.name.is_empty() || child.name.contains('/') {
            return Err(RegistryError::InvalidName { name: child.name });
        }
        if self.child(&child.name).is_some() {
            return Err(RegistryError::NameConflict {
                parent: self.name.clone(),
                name: child.name,
            });
        }
        self.children.push(child);
        Ok(self)
    }

    /// Remove the child named `name`, returning it with its subtree.
    pub fn detach(&mut self, name: &str) -> Option<Node> {
        let index = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(index))
    }

    /// Resolve a slash-delimited path relative to this node.
    ///
    /// An empty path resolves to the node itself.
    pub fn find(&self, path: &str) -> RegistryResult<&Node> {
        let mut node = self;
        for segment in segments(path) {
            node = node.child(segment).ok_or_else(|| not_found(path, segment))?;
        }
        Ok(node)
    }

    pub fn find_mut(&mut self, path: &str) -> RegistryResult<&mut Node> {
        let mut node = self;
        for segment in segments(path) {
            node = match node.children.iter_mut().find(|c| c.name == segment) {
                Some(child) => child,
                None => return Err(not_found(path, segment)),
            };
        }
        Ok(node)
    }

    /// Whether [`Node::read`] is meaningful for this kind.
    pub fn is_readable(&self) -> bool {
        !matches!(self.kind, NodeKind::Group | NodeKind::Exec(_))
    }

    pub fn read(&self) -> RegistryResult<Value> {
        match &self.kind {
            NodeKind::Value(cell) => Ok(cell.read()),
            NodeKind::BitView(view) => Ok(view.read()),
            NodeKind::Enum(e) => e.read(),
            NodeKind::Signal(binding) => binding.read(&self.name),
            NodeKind::Group | NodeKind::Exec(_) => Err(self.unsupported("read")),
        }
    }

    pub fn write(&self, value: Value) -> RegistryResult<()> {
        match &self.kind {
            NodeKind::Value(cell) => cell.write(value),
            NodeKind::BitView(view) => view.write(value),
            NodeKind::Enum(e) => e.write(value),
            NodeKind::Group | NodeKind::Exec(_) | NodeKind::Signal(_) => {
                Err(self.unsupported("write"))
            }
        }
    }

    pub fn invoke(&self) -> RegistryResult<()> {
        match &self.kind {
            NodeKind::Exec(exec) => {
                let result = exec.invoke(&self.name);
                if let Err(e) = &result {
                    tracing::warn!("{}", e);
                }
                result
            }
            _ => Err(self.unsupported("invoke")),
        }
    }

    /// Lazy depth-first, pre-order walk over every descendant.
    pub fn dump_subtree(&self) -> DumpIter<'_> {
        DumpIter::new(self)
    }

    /// Number of descendants (excluding this node).
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    fn unsupported(&self, operation: &'static str) -> RegistryError {
        RegistryError::Unsupported {
            node: self.name.clone(),
            operation,
        }
    }
}

fn not_found(path: &str, segment: &str) -> RegistryError {
    RegistryError::PathNotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}
