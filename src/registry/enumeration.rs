//! Enumeration nodes.
//!
//! An [`EnumNode`] stores an integral code constrained to a fixed
//! [`EnumMap`] and reads back as the member's symbolic name. Typed device
//! enums describe their members through [`RegEnum`].

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::value::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A Rust enum that can back an [`EnumNode`].
pub trait RegEnum: Copy + 'static {
    /// Ordered `(code, name)` members. Codes need not be contiguous.
    const ITEMS: &'static [(i64, &'static str)];

    fn code(self) -> i64;
}

/// Immutable ordered name <-> code mapping.
#[derive(Debug, Clone)]
pub struct EnumMap {
    items: Arc<[(i64, String)]>,
}

impl EnumMap {
    /// Build a mapping, rejecting duplicate names or codes.
    pub fn new<I, S>(items: I) -> RegistryResult<Self>
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let mut collected: Vec<(i64, String)> = Vec::new();
        for (code, name) in items {
            let name = name.into();
            if collected.iter().any(|(_, n)| *n == name) {
                return Err(RegistryError::NameConflict {
                    parent: "enum".to_string(),
                    name,
                });
            }
            if collected.iter().any(|(c, _)| *c == code) {
                return Err(RegistryError::NameConflict {
                    parent: "enum".to_string(),
                    name: code.to_string(),
                });
            }
            collected.push((code, name));
        }
        Ok(Self {
            items: collected.into(),
        })
    }

    pub fn of<T: RegEnum>() -> Self {
        Self {
            items: T::ITEMS
                .iter()
                .map(|&(code, name)| (code, name.to_string()))
                .collect(),
        }
    }

    pub fn name_of(&self, code: i64) -> Option<&str> {
        self.items
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, n)| n.as_str())
    }

    pub fn code_of(&self, name: &str) -> Option<i64> {
        self.items.iter().find(|(_, n)| n == name).map(|(c, _)| *c)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(_, n)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Node storage for an enumerated value.
#[derive(Debug)]
pub struct EnumNode {
    map: EnumMap,
    code: AtomicI64,
}

impl EnumNode {
    pub fn new(map: EnumMap, initial: i64) -> RegistryResult<Self> {
        if map.name_of(initial).is_none() {
            return Err(RegistryError::UnknownEnumCode { code: initial });
        }
        Ok(Self {
            map,
            code: AtomicI64::new(initial),
        })
    }

    pub fn of<T: RegEnum>(initial: T) -> Self {
        Self {
            map: EnumMap::of::<T>(),
            code: AtomicI64::new(initial.code()),
        }
    }

    pub fn map(&self) -> &EnumMap {
        &self.map
    }

    /// The underlying integral code.
    pub fn code(&self) -> i64 {
        self.code.load(Ordering::SeqCst)
    }

    pub fn read(&self) -> RegistryResult<Value> {
        let code = self.code();
        self.map
            .name_of(code)
            .map(Value::symbol)
            .ok_or(RegistryError::UnknownEnumCode { code })
    }

    /// Set by symbolic name or by numeric code.
    pub fn write(&self, value: Value) -> RegistryResult<()> {
        let code = match value {
            Value::Enum(name) | Value::Text(name) => self
                .map
                .code_of(&name)
                .ok_or(RegistryError::UnknownEnumName { name })?,
            other => {
                let raw = other.as_integer().unwrap_or_default();
                let code = i64::try_from(raw).map_err(|_| RegistryError::ValueOutOfRange {
                    value: raw.to_string(),
                    width: 64,
                })?;
                if self.map.name_of(code).is_none() {
                    return Err(RegistryError::UnknownEnumCode { code });
                }
                code
            }
        };
        self.code.store(code, Ordering::SeqCst);
        Ok(())
    }
}
