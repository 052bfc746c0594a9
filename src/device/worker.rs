//! Background status sampling thread
//!
//! The worker wakes once per poll interval and samples device status into
//! the interlock status words. It is the only context besides registry
//! clients that mutates those words.
//!
//! # Cancellation
//!
//! The loop checks a running flag each iteration. The same stop request is
//! also sent over a channel, so a worker sleeping on its poll interval wakes
//! immediately instead of finishing the sleep.

use crate::device::layout::il_status;
use crate::registry::SharedWord;
use crate::signal::SignalSource;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Status inputs of one acquisition board.
pub struct MonitoredBoard {
    pub name: String,
    pub il_status: SharedWord,
    pub adc: Arc<dyn SignalSource>,
}

/// Samples ADC data and raises interlock bits.
pub struct StatusMonitor {
    boards: Vec<MonitoredBoard>,
    overflow_threshold: u32,
    samples_per_poll: usize,
}

impl StatusMonitor {
    pub fn new(
        boards: Vec<MonitoredBoard>,
        overflow_threshold: u32,
        samples_per_poll: usize,
    ) -> Self {
        Self {
            boards,
            overflow_threshold,
            samples_per_poll,
        }
    }

    /// Take one status sample of every board.
    pub fn sample(&self) {
        let mask = 1u64 << il_status::ADC_OVERFLOW;
        for board in &self.boards {
            let samples = match board.adc.read(self.samples_per_poll) {
                Ok(samples) => samples,
                Err(e) => {
                    tracing::trace!("Skipping status sample of '{}': {}", board.name, e);
                    continue;
                }
            };
            let overflow = samples
                .iter()
                .any(|s| s.unsigned_abs() > self.overflow_threshold);
            if overflow {
                let previous = board.il_status.set_bits(mask);
                if previous & mask == 0 {
                    tracing::debug!("ADC overflow on '{}'", board.name);
                }
            }
        }
    }
}

/// Handle to the running status worker thread.
pub struct StatusWorker {
    running: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<u64>>,
}

impl StatusWorker {
    /// Spawn the worker thread.
    pub fn spawn(monitor: StatusMonitor, interval: Duration) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = bounded(1);
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("status-worker".to_string())
            .spawn(move || run(monitor, interval, flag, stop_rx))?;
        Ok(Self {
            running,
            stop_tx,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread to stop and wait for it to terminate.
    ///
    /// Returns the number of completed sampling iterations.
    pub fn stop(&mut self) -> u64 {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(ticks)) => ticks,
            Some(Err(_)) => {
                tracing::error!("Status worker panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for StatusWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run(
    monitor: StatusMonitor,
    interval: Duration,
    running: Arc<AtomicBool>,
    stop_rx: Receiver<()>,
) -> u64 {
    tracing::info!("Status worker started ({:?} interval)", interval);
    let mut ticks = 0u64;

    while running.load(Ordering::SeqCst) {
        monitor.sample();
        ticks += 1;

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("Status worker stopped after {} samples", ticks);
    ticks
}
