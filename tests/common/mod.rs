//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use libera_dummy::{DeviceConfig, DummyDevice, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Device configuration with a fast status poll
pub fn fast_config() -> DeviceConfig {
    DeviceConfig {
        poll_interval_ms: 5,
        ..DeviceConfig::default()
    }
}

/// Run a device through pre-init, post-init and post-config
pub fn start_device(device: &mut DummyDevice) {
    device.pre_init().expect("pre_init");
    device.post_init().expect("post_init");
    device.post_config().expect("post_config");
}

/// A running device with simulated signals and its registry
pub fn running_device(config: DeviceConfig) -> (DummyDevice, Arc<Registry>) {
    let registry = Arc::new(Registry::new());
    let mut device = DummyDevice::new(config, Arc::clone(&registry));
    start_device(&mut device);
    (device, registry)
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
