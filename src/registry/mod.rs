//! Live configuration and telemetry registry.
//!
//! The registry is a tree of named [`Node`]s rooted at a single group. It is
//! the one namespace through which both writable configuration and read-only
//! telemetry are exposed:
//!
//! ```text
//! boards
//! +-- evrx2
//! |   +-- pll/locked          (value)
//! |   +-- events/t1/count     (value)
//! +-- raf5
//!     +-- conf/switching_source                 (enum)
//!     +-- interlock/status/il_status/reset      (exec)
//!     +-- interlock/status/il_status/x          (bit view)
//!     +-- signals/adc                           (signal binding)
//! ```
//!
//! # Components
//!
//! - [`Node`] / [`NodeKind`] - tree element and its capability
//! - [`NodeBuilder`] - declarative subtree construction
//! - [`SharedWord`] / [`BitView`] - bit-field aliasing of a status word
//! - [`EnumNode`] / [`RegEnum`] - symbolic enumerations
//! - [`ExecNode`] - triggerable actions
//! - [`SignalBinding`] - read-only exposure of a live signal source
//! - [`DumpIter`] - lazy pre-order diagnostic dump
//!
//! # Concurrency
//!
//! [`Registry`] guards the tree structure with a read/write lock. Structure
//! only changes on attach; reads, writes and invocations take the shared
//! lock, and each node kind synchronizes its own state.

pub mod binding;
pub mod bitfield;
pub mod builder;
pub mod dump;
pub mod enumeration;
pub mod error;
pub mod exec;
pub mod node;
pub mod value;

pub use binding::SignalBinding;
pub use bitfield::{BitView, SharedWord};
pub use builder::NodeBuilder;
pub use dump::{DumpEntry, DumpIter};
pub use enumeration::{EnumMap, EnumNode, RegEnum};
pub use error::{RegistryError, RegistryResult};
pub use exec::{Action, ExecNode};
pub use node::{KindTag, Node, NodeKind};
pub use value::{ScalarType, Value, ValueCell};

use crate::signal::SignalInfo;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Name of the registry's root group.
pub const ROOT_NAME: &str = "root";

/// Shared registry tree.
#[derive(Debug)]
pub struct Registry {
    root: RwLock<Node>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::group(ROOT_NAME)),
        }
    }

    fn tree(&self) -> RwLockReadGuard<'_, Node> {
        self.root.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn tree_mut(&self) -> RwLockWriteGuard<'_, Node> {
        self.root.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach `node` under the node at `path`.
    pub fn attach_at(&self, path: &str, node: Node) -> RegistryResult<()> {
        let name = node.name().to_string();
        self.tree_mut().find_mut(path)?.attach(node)?;
        tracing::debug!("Attached '{}' under '/{}'", name, path.trim_matches('/'));
        Ok(())
    }

    /// Remove the child `name` of the node at `path`, returning its subtree.
    pub fn detach_at(&self, path: &str, name: &str) -> RegistryResult<Node> {
        let mut root = self.tree_mut();
        let parent = root.find_mut(path)?;
        let node = parent.detach(name).ok_or_else(|| RegistryError::PathNotFound {
            path: format!("{}/{}", path.trim_matches('/'), name),
            segment: name.to_string(),
        })?;
        tracing::debug!("Detached '{}' from '/{}'", name, path.trim_matches('/'));
        Ok(node)
    }

    /// Make sure a group exists at `path`, creating missing segments.
    pub fn ensure_group(&self, path: &str) -> RegistryResult<()> {
        let mut root = self.tree_mut();
        let mut node = &mut *root;
        for segment in node::segments(path) {
            if node.child(segment).is_none() {
                node.attach(Node::group(segment))?;
            }
            node = node.find_mut(segment)?;
        }
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.tree().find(path).is_ok()
    }

    /// Run `f` against the node at `path` while holding the shared lock.
    pub fn with_node<R>(&self, path: &str, f: impl FnOnce(&Node) -> R) -> RegistryResult<R> {
        let root = self.tree();
        Ok(f(root.find(path)?))
    }

    pub fn read(&self, path: &str) -> RegistryResult<Value> {
        self.with_node(path, Node::read)?
    }

    pub fn write(&self, path: &str, value: impl Into<Value>) -> RegistryResult<()> {
        let value = value.into();
        self.with_node(path, |node| node.write(value))?
    }

    /// Invoke the executable node at `path`.
    ///
    /// The action runs after the tree lock is released, so it may itself
    /// access the registry.
    pub fn invoke(&self, path: &str) -> RegistryResult<()> {
        let exec = self.with_node(path, |node| match node.kind() {
            NodeKind::Exec(exec) => Some((node.name().to_string(), exec.clone())),
            _ => None,
        })?;
        match exec {
            Some((name, exec)) => {
                let result = exec.invoke(&name);
                if let Err(e) = &result {
                    tracing::warn!("{}", e);
                }
                result
            }
            None => self.with_node(path, Node::invoke)?,
        }
    }

    /// Metadata of the signal bound at `path`.
    pub fn signal_info(&self, path: &str) -> RegistryResult<SignalInfo> {
        self.with_node(path, |node| match node.kind() {
            NodeKind::Signal(binding) => binding.info(node.name()),
            _ => Err(RegistryError::Unsupported {
                node: node.name().to_string(),
                operation: "signal info",
            }),
        })?
    }

    /// Read `count` samples from the signal bound at `path`.
    pub fn read_signal(&self, path: &str, count: usize) -> RegistryResult<Vec<i32>> {
        self.with_node(path, |node| match node.kind() {
            NodeKind::Signal(binding) => binding.read_samples(node.name(), count),
            _ => Err(RegistryError::Unsupported {
                node: node.name().to_string(),
                operation: "signal read",
            }),
        })?
    }

    /// Snapshot of the full tree in pre-order.
    pub fn dump(&self) -> Vec<DumpEntry> {
        self.tree().dump_subtree().collect()
    }

    /// Snapshot of the subtree at `path` in pre-order.
    pub fn dump_at(&self, path: &str) -> RegistryResult<Vec<DumpEntry>> {
        self.with_node(path, |node| node.dump_subtree().collect())
    }

    pub fn dump_text(&self) -> String {
        dump::render(self.dump())
    }

    pub fn dump_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.dump())
    }
}
