//! # libera-dummy: live registry for a simulated instrumentation device
//!
//! A hierarchical configuration-and-telemetry registry together with the
//! lifecycle controller of a simulated beam position instrument. The device
//! exports its configuration values, interlock status bits, enumerations,
//! triggerable actions and live signal sources as one tree of named nodes.
//!
//! ## Architecture
//!
//! - **Registry**: tree of typed nodes addressed by slash-delimited paths
//! - **Bit-field views**: nodes aliasing bit ranges of a shared status word
//! - **Signals**: opaque sample producers with a start/stop lifecycle
//! - **Device**: lifecycle controller owning the status worker thread and
//!   the signal sources
//!
//! ## Example
//!
//! ```ignore
//! use libera_dummy::{DeviceConfig, DummyDevice, Registry, Value};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//! let mut device = DummyDevice::new(DeviceConfig::default(), Arc::clone(&registry));
//! device.pre_init()?;
//! device.post_init()?;
//! device.post_config()?;
//!
//! registry.write("boards/raf5/interlock/status/il_status/x", true)?;
//! assert_eq!(
//!     registry.read("boards/raf5/interlock/status/il_status/x")?,
//!     Value::Bool(true)
//! );
//! println!("{}", registry.dump_text());
//!
//! device.shutdown()?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod registry;
pub mod signal;

// Re-export commonly used types
pub use config::DeviceConfig;
pub use device::{DummyDevice, LifecycleState};
pub use error::{DeviceError, Result};
pub use registry::{Node, NodeBuilder, Registry, RegistryError, SharedWord, Value};
pub use signal::{SignalError, SignalSource, SignalState};
