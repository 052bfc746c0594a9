//! Live signal sources.
//!
//! A [`SignalSource`] is an opaque producer of streamed samples. It is
//! running as soon as it is constructed and stops on [`SignalSource::shut_down`],
//! which is idempotent. The device owns its sources in a [`SignalSet`], which
//! fixes the shutdown order to the creation order.
//!
//! The simulated producers used by the dummy device live in [`simulated`].

pub mod simulated;

pub use simulated::{SimulatedFactory, SimulatedSignal, WavePattern};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by signal sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Signal '{0}' is stopped")]
    Stopped(String),

    #[error("Signal '{name}': read of {requested} samples exceeds limit of {limit}")]
    ReadTooLarge {
        name: String,
        requested: usize,
        limit: usize,
    },

    #[error("Signal '{name}' failed to stop: {reason}")]
    StopFailed { name: String, reason: String },

    #[error("Failed to create signal '{name}': {reason}")]
    Create { name: String, reason: String },

    #[error("Shutdown incomplete, failed to stop: {}", failed.join(", "))]
    ShutdownIncomplete { failed: Vec<String> },
}

/// Lifecycle state of a signal source.
///
/// Sources are running from construction, so there is no separate
/// created state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Running,
    Stopped,
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalState::Running => "running",
            SignalState::Stopped => "stopped",
        })
    }
}

/// Identity and metadata of a signal source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalInfo {
    pub name: String,
    pub state: SignalState,
    /// Samples per second
    pub sample_rate_hz: f64,
    /// Samples produced so far
    pub samples_read: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

/// A producer of streamed samples with a start/stop lifecycle.
#[cfg_attr(test, mockall::automock)]
pub trait SignalSource: Send + Sync {
    /// Unique name, e.g. `raf5/adc`
    fn name(&self) -> String;

    fn state(&self) -> SignalState;

    fn info(&self) -> SignalInfo;

    /// Read the next `count` samples.
    ///
    /// Sources bound their read size and reject larger requests with
    /// [`SignalError::ReadTooLarge`].
    fn read(&self, count: usize) -> Result<Vec<i32>, SignalError>;

    /// Stop producing. Calling this on a stopped source succeeds.
    fn shut_down(&self) -> Result<(), SignalError>;
}

/// Slots in which a board creates its sources, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    /// Raw waveform producer (slow acquisition stream)
    Stream,
    Adc,
    DdcRaw,
    DdcSynthetic,
    PostmortemSynthetic,
}

impl SignalRole {
    /// Every role in creation order.
    pub const ALL: [SignalRole; 5] = [
        SignalRole::Stream,
        SignalRole::Adc,
        SignalRole::DdcRaw,
        SignalRole::DdcSynthetic,
        SignalRole::PostmortemSynthetic,
    ];

    /// Source name component for this role
    pub fn name(self) -> &'static str {
        match self {
            SignalRole::Stream => "sa",
            SignalRole::Adc => "adc",
            SignalRole::DdcRaw => "ddc_raw",
            SignalRole::DdcSynthetic => "ddc_synthetic",
            SignalRole::PostmortemSynthetic => "pm_ddc_synthetic",
        }
    }
}

/// Creates the sources a board needs.
pub trait SignalFactory: Send + Sync {
    fn create(&self, board: &str, role: SignalRole) -> Result<Arc<dyn SignalSource>, SignalError>;
}

/// Ordered list of owned signal sources.
#[derive(Default)]
pub struct SignalSet {
    sources: Vec<Arc<dyn SignalSource>>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `source`; it will be stopped after every source
    /// pushed before it.
    pub fn push(&mut self, source: Arc<dyn SignalSource>) {
        self.sources.push(source);
    }

    /// Move every source of `other` to the end of this set, keeping order.
    pub fn append(&mut self, other: &mut SignalSet) {
        self.sources.append(&mut other.sources);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignalSource>> {
        self.sources.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Stop every source in creation order and release them.
    ///
    /// A source that fails to stop is logged and skipped; the remaining
    /// sources are still stopped. The set is empty afterwards.
    pub fn shut_down_all(&mut self) -> Result<(), SignalError> {
        let mut failed = Vec::new();
        for source in self.sources.drain(..) {
            let name = source.name();
            match source.shut_down() {
                Ok(()) => tracing::debug!("Signal '{}' stopped", name),
                Err(e) => {
                    tracing::error!("Failed to stop signal '{}': {}", name, e);
                    failed.push(name);
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(SignalError::ShutdownIncomplete { failed })
        }
    }
}

impl fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
