//! Dummy device - Main Entry Point
//!
//! Runs the simulated device until stdin reaches end of file or a line is
//! entered. An optional first argument names a TOML configuration file.

use anyhow::Context;
use libera_dummy::{DeviceConfig, DummyDevice, Registry};
use std::io::BufRead;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,libera_dummy=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => DeviceConfig::load(&path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => DeviceConfig::default(),
    };
    tracing::info!("Starting {}", config.application_name);

    let registry = Arc::new(Registry::new());
    let mut device = DummyDevice::new(config, Arc::clone(&registry));
    device.pre_init()?;
    device.post_init()?;
    device.post_config()?;

    print!("{}", registry.dump_text());
    tracing::info!("Running, press Enter to stop");

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    tracing::info!("Shutting down...");
    device.shutdown()?;
    Ok(())
}
