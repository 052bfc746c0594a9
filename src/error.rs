//! Error handling for the dummy device
//!
//! This module defines the crate-level error type and a Result alias used by
//! configuration loading and the lifecycle controller. Registry operations
//! use [`RegistryError`](crate::registry::RegistryError) directly.

use crate::device::LifecycleState;
use crate::registry::RegistryError;
use crate::signal::SignalError;
use thiserror::Error;

/// Main error type for device operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Errors related to the registry tree
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Errors related to signal sources
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lifecycle step was requested out of order
    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DeviceError>,
    },
}

impl DeviceError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DeviceError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers
    pub fn root(&self) -> &DeviceError {
        match self {
            DeviceError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DeviceError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
