//! Signal binding nodes.
//!
//! A binding exposes an externally owned [`SignalSource`] at a registry path.
//! It holds a weak reference: the device's signal list owns the source, and
//! no lifecycle operation is reachable from here.

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::value::Value;
use crate::signal::{SignalInfo, SignalSource};
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Clone)]
pub struct SignalBinding {
    source: Weak<dyn SignalSource>,
}

impl SignalBinding {
    pub fn new(source: &Arc<dyn SignalSource>) -> Self {
        Self {
            source: Arc::downgrade(source),
        }
    }

    fn upgrade(&self, node: &str) -> RegistryResult<Arc<dyn SignalSource>> {
        self.source.upgrade().ok_or_else(|| RegistryError::SignalGone {
            node: node.to_string(),
        })
    }

    pub fn is_alive(&self) -> bool {
        self.source.strong_count() > 0
    }

    pub fn info(&self, node: &str) -> RegistryResult<SignalInfo> {
        Ok(self.upgrade(node)?.info())
    }

    /// Node value: the bound source's identity.
    pub fn read(&self, node: &str) -> RegistryResult<Value> {
        Ok(Value::Text(self.upgrade(node)?.name()))
    }

    /// Read the next `count` samples from the bound source.
    pub fn read_samples(&self, node: &str, count: usize) -> RegistryResult<Vec<i32>> {
        self.upgrade(node)?
            .read(count)
            .map_err(|e| RegistryError::SignalRead {
                node: node.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Debug for SignalBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBinding")
            .field("alive", &self.is_alive())
            .finish()
    }
}
