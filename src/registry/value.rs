//! Scalar values carried by registry nodes.
//!
//! [`Value`] is the currency of every read and write in the registry. Plain
//! configuration nodes hold a [`ValueCell`], which pins a [`ScalarType`] at
//! construction and coerces incoming values to it.

use crate::registry::error::{RegistryError, RegistryResult};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A value read from or written to a registry node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    UInt64(u64),
    /// Symbolic name of an enumeration member
    Enum(String),
    /// Free-form text, used for signal identities
    Text(String),
}

impl Value {
    /// Create an enum value from its symbolic name
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Enum(name.into())
    }

    /// Short name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Enum(_) => "enum",
            Value::Text(_) => "text",
        }
    }

    /// Integer interpretation of the value, if it has one.
    ///
    /// Booleans map to 0/1. Symbolic and text values have none.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Bool(b) => Some(b as i128),
            Value::Int32(v) => Some(v as i128),
            Value::UInt32(v) => Some(v as i128),
            Value::UInt64(v) => Some(v as i128),
            Value::Enum(_) | Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Enum(v) | Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

/// Declared type of a plain value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int32,
    UInt32,
    UInt64,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
        }
    }

    fn width(self) -> u32 {
        match self {
            ScalarType::Bool => 1,
            ScalarType::Int32 | ScalarType::UInt32 => 32,
            ScalarType::UInt64 => 64,
        }
    }

    /// Convert `value` to this type.
    ///
    /// Integers of any width are accepted as long as they fit; symbolic and
    /// text values are rejected.
    pub fn coerce(self, value: Value) -> RegistryResult<Value> {
        let Some(raw) = value.as_integer() else {
            return Err(RegistryError::TypeMismatch {
                expected: self.name(),
                actual: value.type_name(),
            });
        };
        let out_of_range = || RegistryError::ValueOutOfRange {
            value: raw.to_string(),
            width: self.width(),
        };
        match self {
            ScalarType::Bool => match raw {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                _ => Err(out_of_range()),
            },
            ScalarType::Int32 => i32::try_from(raw)
                .map(Value::Int32)
                .map_err(|_| out_of_range()),
            ScalarType::UInt32 => u32::try_from(raw)
                .map(Value::UInt32)
                .map_err(|_| out_of_range()),
            ScalarType::UInt64 => u64::try_from(raw)
                .map(Value::UInt64)
                .map_err(|_| out_of_range()),
        }
    }
}

/// Storage of a plain configuration value.
#[derive(Debug)]
pub struct ValueCell {
    scalar: ScalarType,
    current: Mutex<Value>,
}

impl ValueCell {
    pub fn new(scalar: ScalarType, initial: Value) -> RegistryResult<Self> {
        let initial = scalar.coerce(initial)?;
        Ok(Self {
            scalar,
            current: Mutex::new(initial),
        })
    }

    pub fn read(&self) -> Value {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write(&self, value: Value) -> RegistryResult<()> {
        let value = self.scalar.coerce(value)?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = value;
        Ok(())
    }
}
