//! Bit-field views over a shared status word.
//!
//! A [`SharedWord`] is one 64-bit device status cell. Any number of
//! [`BitView`] nodes alias contiguous bit ranges of it:
//!
//! ```text
//! il_status word        ... 0 0 0 1 0 1
//!                               | | | |
//! adc_overflow (4,1) ---------- + | | |
//! attenuator   (2,1) ------------ + | |
//! y            (1,1) -------------- + |
//! x            (0,1) ---------------- +
//! ```
//!
//! Every mutation goes through a compare-and-swap loop on the underlying
//! atomic, so concurrent partial writes and whole-word resets never lose each
//! other's bits. Overlapping views are allowed; arranging disjoint ranges is
//! the caller's job.

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle to a 64-bit status word shared between views and its producer.
///
/// Cloning the handle shares the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedWord(Arc<AtomicU64>);

impl SharedWord {
    pub fn new(initial: u64) -> Self {
        Self(Arc::new(AtomicU64::new(initial)))
    }

    pub fn load(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn store(&self, value: u64) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Clear every bit of the word in one step.
    pub fn reset(&self) {
        self.store(0);
    }

    /// Atomically replace the word with `f(current)`, returning the previous value.
    pub fn update(&self, mut f: impl FnMut(u64) -> u64) -> u64 {
        match self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| Some(f(w)))
        {
            Ok(prev) | Err(prev) => prev,
        }
    }

    /// Set the bits in `mask`, returning the previous value.
    pub fn set_bits(&self, mask: u64) -> u64 {
        self.0.fetch_or(mask, Ordering::SeqCst)
    }
}

/// A contiguous bit range of a [`SharedWord`] exposed as a node value.
#[derive(Debug, Clone)]
pub struct BitView {
    word: SharedWord,
    offset: u32,
    width: u32,
}

impl BitView {
    /// Create a view of `width` bits starting at `offset` (0 = LSB).
    pub fn new(word: SharedWord, offset: u32, width: u32) -> RegistryResult<Self> {
        match offset.checked_add(width) {
            Some(end) if width > 0 && end <= 64 => {}
            _ => return Err(RegistryError::InvalidBitRange { offset, width }),
        }
        Ok(Self {
            word,
            offset,
            width,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn value_mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Mask of the view's bits in word coordinates
    pub fn mask(&self) -> u64 {
        self.value_mask() << self.offset
    }

    /// Extract the view's bits from the current word.
    pub fn get(&self) -> u64 {
        (self.word.load() >> self.offset) & self.value_mask()
    }

    /// Replace the view's bits, preserving every other bit of the word.
    pub fn set(&self, value: u64) -> RegistryResult<()> {
        if value > self.value_mask() {
            return Err(RegistryError::ValueOutOfRange {
                value: value.to_string(),
                width: self.width,
            });
        }
        let mask = self.mask();
        self.word
            .update(|w| (w & !mask) | ((value << self.offset) & mask));
        Ok(())
    }

    /// Node value: single-bit views read as booleans, wider ones as integers.
    pub fn read(&self) -> Value {
        let bits = self.get();
        if self.width == 1 {
            Value::Bool(bits != 0)
        } else {
            Value::UInt64(bits)
        }
    }

    pub fn write(&self, value: Value) -> RegistryResult<()> {
        let raw = value.as_integer().ok_or(RegistryError::TypeMismatch {
            expected: "bits",
            actual: value.type_name(),
        })?;
        let bits = u64::try_from(raw).map_err(|_| RegistryError::ValueOutOfRange {
            value: raw.to_string(),
            width: self.width,
        })?;
        self.set(bits)
    }
}
