//! Executable nodes: bound zero-argument actions.

use crate::registry::error::{RegistryError, RegistryResult};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Action bound to an executable node. `Ok(false)` reports failure.
pub type Action = Arc<dyn Fn() -> anyhow::Result<bool> + Send + Sync>;

/// A node that runs its bound action when invoked.
///
/// Errors, failure results and panics raised by the action are all turned
/// into [`RegistryError::ActionFailed`] at this boundary.
#[derive(Clone)]
pub struct ExecNode {
    action: Action,
}

impl ExecNode {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }

    /// Run the action. `node` names the node in the returned error.
    pub fn invoke(&self, node: &str) -> RegistryResult<()> {
        let failed = |reason: String| RegistryError::ActionFailed {
            node: node.to_string(),
            reason,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| (self.action)())) {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(failed("action reported failure".to_string())),
            Ok(Err(e)) => Err(failed(format!("{:#}", e))),
            Err(payload) => Err(failed(panic_message(payload.as_ref()))),
        }
    }
}

impl fmt::Debug for ExecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecNode").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
