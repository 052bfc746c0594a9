//! Integration tests for the device lifecycle

mod common;

use common::mock_helpers::RecordingFactory;
use common::{fast_config, running_device, start_device, wait_for};
use libera_dummy::device::il_status;
use libera_dummy::{
    DeviceConfig, DeviceError, DummyDevice, LifecycleState, Registry, RegistryError, SignalError,
    SignalState, Value,
};
use std::sync::Arc;
use std::time::Duration;

const STATUS: &str = "boards/raf5/interlock/status/il_status";

fn recorded_device(factory: RecordingFactory) -> (DummyDevice, Arc<Registry>) {
    let registry = Arc::new(Registry::new());
    let device =
        DummyDevice::with_signal_factory(fast_config(), Arc::clone(&registry), Box::new(factory));
    (device, registry)
}

#[test]
fn test_exported_tree() {
    let (mut device, registry) = running_device(fast_config());

    assert_eq!(registry.read("boards/evrx2/pll/locked").unwrap(), Value::Bool(true));
    assert_eq!(
        registry.read("boards/evrx2/events/t1/count").unwrap(),
        Value::UInt64(123)
    );
    assert_eq!(
        registry
            .read("boards/raf5/conditioning/tuning/agc/power_level")
            .unwrap(),
        Value::Int32(-66)
    );
    assert_eq!(
        registry
            .read("boards/raf5/signal_processing/position/Kx")
            .unwrap(),
        Value::UInt32(10_000_000)
    );
    assert_eq!(
        registry.read("boards/raf5/signals/sa").unwrap(),
        Value::Text("raf5/sa".to_string())
    );
    assert!(registry.read_signal("boards/raf5/signals/adc", 16).unwrap().len() == 16);

    device.shutdown().unwrap();
}

#[test]
fn test_oversized_signal_read_is_an_error() {
    let (mut device, registry) = running_device(fast_config());
    let limit = device.config().signals.max_samples_per_read;

    for count in [limit + 1, usize::MAX] {
        let err = registry
            .read_signal("boards/raf5/signals/adc", count)
            .unwrap_err();
        assert!(matches!(err, RegistryError::SignalRead { .. }));
    }
    assert_eq!(
        registry
            .read_signal("boards/raf5/signals/adc", limit)
            .unwrap()
            .len(),
        limit
    );

    device.shutdown().unwrap();
}

#[test]
fn test_signal_info_tracks_start_and_stop() {
    let (mut device, registry) = running_device(fast_config());
    let path = "boards/raf5/signals/ddc_raw";

    let info = registry.signal_info(path).unwrap();
    assert_eq!(info.name, "raf5/ddc_raw");
    assert_eq!(info.state, SignalState::Running);
    assert!(info.started_at.is_some());
    assert!(info.stopped_at.is_none());

    // Keep the source alive past shutdown to observe its final state
    let source = device
        .signals()
        .iter()
        .find(|s| s.name() == "raf5/ddc_raw")
        .cloned()
        .unwrap();
    device.shutdown().unwrap();

    let info = registry.signal_info(path).unwrap();
    assert_eq!(info.state, SignalState::Stopped);
    let (started, stopped) = (info.started_at.unwrap(), info.stopped_at.unwrap());
    assert!(stopped >= started);

    drop(source);
    assert!(matches!(
        registry.signal_info(path),
        Err(RegistryError::SignalGone { .. })
    ));
}

#[test]
fn test_client_writes_while_running() {
    let (mut device, registry) = running_device(fast_config());

    registry.write(&format!("{}/x", STATUS), true).unwrap();
    registry.write(&format!("{}/attenuator", STATUS), true).unwrap();
    let word = device.interlock_status("raf5").unwrap().clone();
    assert_eq!(word.load() & 0b111, 0b101);

    registry.invoke(&format!("{}/reset", STATUS)).unwrap();
    assert_eq!(registry.read(&format!("{}/x", STATUS)).unwrap(), Value::Bool(false));

    registry
        .write("boards/raf5/conf/switching_source", Value::symbol("External"))
        .unwrap();
    assert_eq!(
        registry.read("boards/raf5/conf/switching_source").unwrap(),
        Value::symbol("External")
    );

    device.shutdown().unwrap();
}

#[test]
fn test_worker_raises_overflow() {
    let mut config = fast_config();
    // The default sine amplitude always exceeds this threshold
    config.interlock.overflow_threshold = 100;
    let (mut device, registry) = running_device(config);
    let word = device.interlock_status("raf5").unwrap().clone();

    assert!(wait_for(Duration::from_secs(5), || {
        word.load() & (1 << il_status::ADC_OVERFLOW) != 0
    }));
    assert_eq!(
        registry.read(&format!("{}/adc_overflow", STATUS)).unwrap(),
        Value::Bool(true)
    );

    device.shutdown().unwrap();
    assert!(!device.is_worker_running());
}

#[test]
fn test_multiple_raf_boards() {
    let config = DeviceConfig {
        raf_boards: vec!["raf5".to_string(), "raf6".to_string()],
        ..fast_config()
    };
    let (mut device, registry) = running_device(config);

    assert_eq!(device.signals().len(), 10);
    registry
        .write("boards/raf6/interlock/status/il_status/y", true)
        .unwrap();
    assert_eq!(device.interlock_status("raf6").unwrap().load() & 0b10, 0b10);
    assert_eq!(device.interlock_status("raf5").unwrap().load() & 0b10, 0);

    device.shutdown().unwrap();
}

#[test]
fn test_sources_stopped_in_creation_order() {
    let factory = RecordingFactory::new();
    let created = Arc::clone(&factory.created);
    let stopped = Arc::clone(&factory.stopped);
    let (mut device, _registry) = recorded_device(factory);
    start_device(&mut device);

    device.shutdown().unwrap();
    let created = created.lock().unwrap().clone();
    assert_eq!(created.len(), 5);
    assert_eq!(*stopped.lock().unwrap(), created);
}

#[test]
fn test_failing_source_does_not_block_shutdown() {
    let factory = RecordingFactory::new().failing("raf5/adc");
    let stopped = Arc::clone(&factory.stopped);
    let (mut device, _registry) = recorded_device(factory);
    start_device(&mut device);

    let err = device.shutdown().unwrap_err();
    match err {
        DeviceError::Signal(SignalError::ShutdownIncomplete { failed }) => {
            assert_eq!(failed, vec!["raf5/adc".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(stopped.lock().unwrap().len(), 5);
    assert_eq!(device.state(), LifecycleState::Stopped);
    device.shutdown().unwrap();
}

#[test]
fn test_shutdown_before_post_config_stops_nothing() {
    let factory = RecordingFactory::new();
    let created = Arc::clone(&factory.created);
    let (mut device, _registry) = recorded_device(factory);
    device.pre_init().unwrap();
    device.post_init().unwrap();

    device.shutdown().unwrap();
    assert!(created.lock().unwrap().is_empty());
    assert_eq!(device.state(), LifecycleState::Stopped);
}

#[test]
fn test_create_failure_releases_earlier_sources() {
    let factory = RecordingFactory::new().refusing("raf5/ddc_raw");
    let stopped = Arc::clone(&factory.stopped);
    let (mut device, registry) = recorded_device(factory);
    device.pre_init().unwrap();
    device.post_init().unwrap();

    assert!(device.post_config().is_err());
    assert_eq!(
        *stopped.lock().unwrap(),
        vec!["raf5/sa".to_string(), "raf5/adc".to_string()]
    );
    assert!(!registry.contains("boards/evrx2"));
    assert_eq!(device.state(), LifecycleState::PostInit);
    assert!(!device.is_worker_running());
}

#[test]
fn test_drop_shuts_down() {
    let factory = RecordingFactory::new();
    let stopped = Arc::clone(&factory.stopped);
    {
        let (mut device, _registry) = recorded_device(factory);
        start_device(&mut device);
    }
    assert_eq!(stopped.lock().unwrap().len(), 5);
}
