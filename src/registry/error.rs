//! Registry-specific error types.

use thiserror::Error;

/// Errors returned by registry tree and node operations.
///
/// Every variant leaves the tree and the addressed node unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node '{parent}' already has a child named '{name}'")]
    NameConflict { parent: String, name: String },

    #[error("Invalid node name '{name}': names must be non-empty and contain no '/'")]
    InvalidName { name: String },

    #[error("Path not found: '{path}' (missing segment '{segment}')")]
    PathNotFound { path: String, segment: String },

    #[error("Value {value} does not fit in {width} bit(s)")]
    ValueOutOfRange { value: String, width: u32 },

    #[error("Unknown enum name '{name}'")]
    UnknownEnumName { name: String },

    #[error("Unknown enum code {code}")]
    UnknownEnumCode { code: i64 },

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Node '{node}' does not support {operation}")]
    Unsupported {
        node: String,
        operation: &'static str,
    },

    #[error("Invalid bit range: offset {offset} + width {width} exceeds 64 bits or width is zero")]
    InvalidBitRange { offset: u32, width: u32 },

    #[error("Action '{node}' failed: {reason}")]
    ActionFailed { node: String, reason: String },

    #[error("Signal bound at '{node}' is no longer available")]
    SignalGone { node: String },

    #[error("Signal read at '{node}' failed: {reason}")]
    SignalRead { node: String, reason: String },
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
