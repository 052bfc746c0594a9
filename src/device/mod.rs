//! Device lifecycle controller
//!
//! [`DummyDevice`] walks the host-driven lifecycle of the simulated device:
//!
//! ```text
//! Constructed --pre_init--> PreInit --post_init--> PostInit
//!     --post_config--> Running --shutdown--> ShuttingDown --> Stopped
//! ```
//!
//! - **post_init** makes sure the `boards` group exists and logs a dump of
//!   the registry for operators.
//! - **post_config** creates the signal sources, attaches the timing and
//!   RAF subtrees under `boards`, and only then starts the status worker.
//!   Any failure aborts the step before the worker starts; subtrees attached
//!   so far are detached again and the new sources are stopped.
//! - **shutdown** stops and joins the worker, then stops every signal source
//!   in creation order. It is idempotent and valid from any state.
//!
//! # Example
//!
//! ```ignore
//! use libera_dummy::{config::DeviceConfig, device::DummyDevice, registry::Registry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//! let mut device = DummyDevice::new(DeviceConfig::default(), Arc::clone(&registry));
//! device.pre_init()?;
//! device.post_init()?;
//! device.post_config()?;
//!
//! registry.invoke("boards/raf5/interlock/status/il_status/reset")?;
//!
//! device.shutdown()?;
//! ```

pub mod layout;
pub mod worker;

pub use layout::{il_status, timing_subtree, AppliedCoefficients, RafBoard, SwitchingSource};
pub use worker::{MonitoredBoard, StatusMonitor, StatusWorker};

use crate::config::DeviceConfig;
use crate::error::{DeviceError, Result, ResultExt};
use crate::registry::{Registry, SharedWord};
use crate::signal::{SignalFactory, SignalRole, SignalSet, SimulatedFactory};
use std::sync::Arc;

/// Registry path under which the device attaches its boards.
pub const BOARDS_PATH: &str = "boards";

/// Lifecycle state of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    PreInit,
    PostInit,
    /// Post-config done; the status worker is running
    Running,
    ShuttingDown,
    Stopped,
}

/// The simulated instrumentation device.
pub struct DummyDevice {
    config: DeviceConfig,
    registry: Arc<Registry>,
    factory: Box<dyn SignalFactory>,
    state: LifecycleState,
    boards: Vec<RafBoard>,
    signals: SignalSet,
    worker: Option<StatusWorker>,
}

impl DummyDevice {
    /// Create a device with simulated signal sources.
    pub fn new(config: DeviceConfig, registry: Arc<Registry>) -> Self {
        let factory = SimulatedFactory::new(config.signals.clone());
        Self::with_signal_factory(config, registry, Box::new(factory))
    }

    pub fn with_signal_factory(
        config: DeviceConfig,
        registry: Arc<Registry>,
        factory: Box<dyn SignalFactory>,
    ) -> Self {
        Self {
            config,
            registry,
            factory,
            state: LifecycleState::Constructed,
            boards: Vec::new(),
            signals: SignalSet::new(),
            worker: None,
        }
    }

    pub fn application_name(&self) -> &str {
        &self.config.application_name
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Owned signal sources in creation order.
    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// Interlock status word of a RAF board.
    pub fn interlock_status(&self, board: &str) -> Option<&SharedWord> {
        self.boards
            .iter()
            .find(|b| b.name == board)
            .map(|b| &b.il_status)
    }

    pub fn is_worker_running(&self) -> bool {
        self.worker.as_ref().is_some_and(StatusWorker::is_running)
    }

    fn advance(&mut self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        if self.state != from {
            return Err(DeviceError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::info!("{}: {:?} -> {:?}", self.config.application_name, from, to);
        self.state = to;
        Ok(())
    }

    /// Called once boards are instantiated, before the registry is defined.
    pub fn pre_init(&mut self) -> Result<()> {
        self.advance(LifecycleState::Constructed, LifecycleState::PreInit)
    }

    /// Called once the registry is defined.
    pub fn post_init(&mut self) -> Result<()> {
        if self.state != LifecycleState::PreInit {
            return Err(DeviceError::InvalidTransition {
                from: self.state,
                to: LifecycleState::PostInit,
            });
        }
        self.registry
            .ensure_group(BOARDS_PATH)
            .context("Creating boards group")?;
        self.advance(LifecycleState::PreInit, LifecycleState::PostInit)?;

        tracing::debug!(
            "Exporting following nodes through the registry:\n{}",
            self.registry.dump_text()
        );
        Ok(())
    }

    /// Attach the device subtrees, create signal sources and start sampling.
    ///
    /// On failure the registry and the signal list are restored to their
    /// state before the call and the device stays in `PostInit`.
    pub fn post_config(&mut self) -> Result<()> {
        if self.state != LifecycleState::PostInit {
            return Err(DeviceError::InvalidTransition {
                from: self.state,
                to: LifecycleState::Running,
            });
        }
        self.config.validate()?;

        let mut created = SignalSet::new();
        let mut attached = Vec::new();
        match self.build(&mut created, &mut attached) {
            Ok(boards) => {
                self.signals.append(&mut created);
                self.boards = boards;
            }
            Err(e) => {
                tracing::error!("Post-config aborted: {}", e);
                for name in attached.iter().rev() {
                    if let Err(detach_err) = self.registry.detach_at(BOARDS_PATH, name) {
                        tracing::error!("{}", detach_err);
                    }
                }
                if let Err(stop_err) = created.shut_down_all() {
                    tracing::error!("{}", stop_err);
                }
                return Err(e);
            }
        }
        tracing::debug!(
            "Attached {} nodes under '{}'",
            self.registry.dump_at(BOARDS_PATH)?.len(),
            BOARDS_PATH
        );

        let monitor = StatusMonitor::new(
            self.boards
                .iter()
                .filter_map(|b| {
                    b.signal(SignalRole::Adc).map(|adc| MonitoredBoard {
                        name: b.name.clone(),
                        il_status: b.il_status.clone(),
                        adc: Arc::clone(adc),
                    })
                })
                .collect(),
            self.config.interlock.overflow_threshold,
            self.config.signals.samples_per_poll,
        );
        let worker = StatusWorker::spawn(monitor, self.config.poll_interval())
            .context("Starting status worker")?;
        self.worker = Some(worker);

        self.advance(LifecycleState::PostInit, LifecycleState::Running)
    }

    /// Create every board's sources and attach all subtrees, recording the
    /// names of attached subtrees in `attached`.
    fn build(
        &self,
        created: &mut SignalSet,
        attached: &mut Vec<String>,
    ) -> Result<Vec<RafBoard>> {
        let timing = timing_subtree(&self.config.timing_board).build()?;
        self.registry
            .attach_at(BOARDS_PATH, timing)
            .with_context(|| format!("Attaching '{}'", self.config.timing_board))?;
        attached.push(self.config.timing_board.clone());

        let mut boards = Vec::with_capacity(self.config.raf_boards.len());
        for name in &self.config.raf_boards {
            let board = RafBoard::create(name, self.factory.as_ref(), created)
                .with_context(|| format!("Creating signals of '{}'", name))?;
            let node = board.subtree(&self.config.interlock).build()?;
            self.registry
                .attach_at(BOARDS_PATH, node)
                .with_context(|| format!("Attaching '{}'", name))?;
            attached.push(name.clone());
            boards.push(board);
        }
        Ok(boards)
    }

    /// Stop the status worker, then every signal source in creation order.
    ///
    /// Safe to call in any state and more than once. Sources that fail to
    /// stop are reported as [`SignalError::ShutdownIncomplete`] after all
    /// others were stopped; the device is `Stopped` either way.
    ///
    /// [`SignalError::ShutdownIncomplete`]: crate::signal::SignalError::ShutdownIncomplete
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == LifecycleState::Stopped {
            return Ok(());
        }
        tracing::info!("{}: shutting down", self.config.application_name);
        self.state = LifecycleState::ShuttingDown;

        if let Some(mut worker) = self.worker.take() {
            let ticks = worker.stop();
            tracing::debug!("Status worker joined after {} samples", ticks);
        }

        self.boards.clear();
        let result = self.signals.shut_down_all();
        self.state = LifecycleState::Stopped;
        tracing::info!("{}: stopped", self.config.application_name);
        result.map_err(DeviceError::from)
    }
}

impl Drop for DummyDevice {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("Shutdown on drop: {}", e);
        }
    }
}
