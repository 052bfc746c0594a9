//! Declarative subtree construction.
//!
//! A [`NodeBuilder`] accumulates children and is converted into an owned
//! [`Node`] in a single [`NodeBuilder::build`] step:
//!
//! ```ignore
//! let pll = NodeBuilder::group("pll")
//!     .child(NodeBuilder::boolean("locked", true))
//!     .child(NodeBuilder::int32("vcxo_offset", 100))
//!     .build()?;
//! ```
//!
//! Construction errors (bad bit ranges, unmapped enum codes, duplicate
//! sibling names) surface from `build`, never from the chained calls.

use crate::registry::binding::SignalBinding;
use crate::registry::bitfield::{BitView, SharedWord};
use crate::registry::enumeration::{EnumNode, RegEnum};
use crate::registry::error::RegistryResult;
use crate::registry::exec::ExecNode;
use crate::registry::node::{Node, NodeKind};
use crate::registry::value::{ScalarType, Value, ValueCell};
use crate::signal::SignalSource;
use std::sync::Arc;

pub struct NodeBuilder {
    name: String,
    kind: RegistryResult<NodeKind>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    fn with_kind(name: impl Into<String>, kind: RegistryResult<NodeKind>) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, Ok(NodeKind::Group))
    }

    pub fn value(name: impl Into<String>, scalar: ScalarType, initial: Value) -> Self {
        Self::with_kind(name, ValueCell::new(scalar, initial).map(NodeKind::Value))
    }

    pub fn boolean(name: impl Into<String>, initial: bool) -> Self {
        Self::value(name, ScalarType::Bool, Value::Bool(initial))
    }

    pub fn int32(name: impl Into<String>, initial: i32) -> Self {
        Self::value(name, ScalarType::Int32, Value::Int32(initial))
    }

    pub fn uint32(name: impl Into<String>, initial: u32) -> Self {
        Self::value(name, ScalarType::UInt32, Value::UInt32(initial))
    }

    pub fn uint64(name: impl Into<String>, initial: u64) -> Self {
        Self::value(name, ScalarType::UInt64, Value::UInt64(initial))
    }

    pub fn enumeration<T: RegEnum>(name: impl Into<String>, initial: T) -> Self {
        Self::with_kind(name, Ok(NodeKind::Enum(EnumNode::of(initial))))
    }

    /// View of `width` bits of `word` starting at `offset`.
    pub fn bits(name: impl Into<String>, word: &SharedWord, offset: u32, width: u32) -> Self {
        Self::with_kind(
            name,
            BitView::new(word.clone(), offset, width).map(NodeKind::BitView),
        )
    }

    pub fn exec<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::with_kind(name, Ok(NodeKind::Exec(ExecNode::new(action))))
    }

    pub fn signal(name: impl Into<String>, source: &Arc<dyn SignalSource>) -> Self {
        Self::with_kind(name, Ok(NodeKind::Signal(SignalBinding::new(source))))
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Convert into an owned node, attaching children in the order they were added.
    pub fn build(self) -> RegistryResult<Node> {
        let mut node = Node::new(self.name, self.kind?);
        for child in self.children {
            node.attach(child.build()?)?;
        }
        Ok(node)
    }
}
