//! Simulated signal sources for the dummy device.
//!
//! Each source generates samples from a simple [`WavePattern`] evaluated at
//! the sample's timestamp. Nothing here models real acquisition hardware.

use crate::config::{SignalSettings, DEFAULT_MAX_SAMPLES_PER_READ};
use crate::signal::{SignalError, SignalFactory, SignalInfo, SignalRole, SignalSource, SignalState};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Pattern for generating simulated samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WavePattern {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
}

impl WavePattern {
    /// Value of the pattern `t` seconds after the source started
    pub fn value_at(&self, t: f64) -> f64 {
        match *self {
            WavePattern::Constant(v) => v,
            WavePattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin(),
        }
    }
}

#[derive(Debug)]
struct Progress {
    state: SignalState,
    samples_read: u64,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
}

/// A signal source producing samples from a [`WavePattern`].
#[derive(Debug)]
pub struct SimulatedSignal {
    name: String,
    pattern: WavePattern,
    sample_rate_hz: f64,
    max_read: usize,
    progress: Mutex<Progress>,
}

impl SimulatedSignal {
    /// Create a running source.
    pub fn new(name: impl Into<String>, pattern: WavePattern, sample_rate_hz: f64) -> Self {
        Self {
            name: name.into(),
            pattern,
            sample_rate_hz,
            max_read: DEFAULT_MAX_SAMPLES_PER_READ,
            progress: Mutex::new(Progress {
                state: SignalState::Running,
                samples_read: 0,
                started_at: Some(Utc::now()),
                stopped_at: None,
            }),
        }
    }

    /// Limit the number of samples a single read may request.
    pub fn with_read_limit(mut self, max_read: usize) -> Self {
        self.max_read = max_read;
        self
    }

    fn progress(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SignalSource for SimulatedSignal {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn state(&self) -> SignalState {
        self.progress().state
    }

    fn info(&self) -> SignalInfo {
        let progress = self.progress();
        SignalInfo {
            name: self.name.clone(),
            state: progress.state,
            sample_rate_hz: self.sample_rate_hz,
            samples_read: progress.samples_read,
            started_at: progress.started_at,
            stopped_at: progress.stopped_at,
        }
    }

    fn read(&self, count: usize) -> Result<Vec<i32>, SignalError> {
        if count > self.max_read {
            return Err(SignalError::ReadTooLarge {
                name: self.name.clone(),
                requested: count,
                limit: self.max_read,
            });
        }
        let mut progress = self.progress();
        if progress.state == SignalState::Stopped {
            return Err(SignalError::Stopped(self.name.clone()));
        }
        let first = progress.samples_read;
        let samples = (0..count as u64)
            .map(|i| {
                let t = (first + i) as f64 / self.sample_rate_hz;
                self.pattern
                    .value_at(t)
                    .round()
                    .clamp(i32::MIN as f64, i32::MAX as f64) as i32
            })
            .collect();
        progress.samples_read += count as u64;
        Ok(samples)
    }

    fn shut_down(&self) -> Result<(), SignalError> {
        let mut progress = self.progress();
        if progress.state != SignalState::Stopped {
            progress.state = SignalState::Stopped;
            progress.stopped_at = Some(Utc::now());
            tracing::trace!("Simulated signal '{}' stopped", self.name);
        }
        Ok(())
    }
}

/// Factory creating [`SimulatedSignal`]s from [`SignalSettings`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedFactory {
    settings: SignalSettings,
}

impl SimulatedFactory {
    pub fn new(settings: SignalSettings) -> Self {
        Self { settings }
    }

    fn pattern_and_rate(&self, role: SignalRole) -> (WavePattern, f64) {
        let s = &self.settings;
        let sine = WavePattern::Sine {
            frequency: s.frequency_hz,
            amplitude: s.amplitude,
            offset: 0.0,
        };
        match role {
            SignalRole::Stream => (sine, s.stream_rate_hz),
            SignalRole::Adc => (sine, s.adc_rate_hz),
            SignalRole::DdcRaw => (sine, s.adc_rate_hz / f64::from(s.decimation.max(1))),
            SignalRole::DdcSynthetic | SignalRole::PostmortemSynthetic => (
                WavePattern::Constant(s.amplitude),
                s.adc_rate_hz / f64::from(s.decimation.max(1)),
            ),
        }
    }
}

impl SignalFactory for SimulatedFactory {
    fn create(&self, board: &str, role: SignalRole) -> Result<Arc<dyn SignalSource>, SignalError> {
        let name = format!("{}/{}", board, role.name());
        let (pattern, rate) = self.pattern_and_rate(role);
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SignalError::Create {
                name,
                reason: format!("invalid sample rate {}", rate),
            });
        }
        tracing::debug!("Creating simulated signal '{}' at {} Hz", name, rate);
        let signal = SimulatedSignal::new(name, pattern, rate)
            .with_read_limit(self.settings.max_samples_per_read);
        Ok(Arc::new(signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert_eq!(WavePattern::Constant(3.0).value_at(10.0), 3.0);
        let sine = WavePattern::Sine {
            frequency: 1.0,
            amplitude: 2.0,
            offset: 5.0,
        };
        assert_eq!(sine.value_at(0.0), 5.0);
        assert!((sine.value_at(0.25) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_read_rejected() {
        let signal =
            SimulatedSignal::new("raf5/adc", WavePattern::Constant(1.0), 1000.0).with_read_limit(8);
        assert_eq!(signal.read(8).unwrap().len(), 8);
        assert_eq!(
            signal.read(usize::MAX).unwrap_err(),
            SignalError::ReadTooLarge {
                name: "raf5/adc".to_string(),
                requested: usize::MAX,
                limit: 8,
            }
        );
        assert_eq!(signal.info().samples_read, 8);
    }

    #[test]
    fn test_read_advances_and_stops() {
        let signal = SimulatedSignal::new("raf5/adc", WavePattern::Constant(7.0), 1000.0);
        assert_eq!(signal.state(), SignalState::Running);

        assert_eq!(signal.read(4).unwrap(), vec![7, 7, 7, 7]);
        assert_eq!(signal.info().samples_read, 4);

        signal.shut_down().unwrap();
        signal.shut_down().unwrap();
        let info = signal.info();
        assert_eq!(info.state, SignalState::Stopped);
        assert!(info.stopped_at.is_some());
        assert_eq!(
            signal.read(1).unwrap_err(),
            SignalError::Stopped("raf5/adc".to_string())
        );
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let signal = SimulatedSignal::new(
            "sa",
            WavePattern::Sine {
                frequency: 1.0,
                amplitude: 100.0,
                offset: 0.0,
            },
            4.0,
        );
        assert_eq!(signal.read(4).unwrap(), vec![0, 100, 0, -100]);
    }

    #[test]
    fn test_factory_names_and_rates() {
        let factory = SimulatedFactory::new(SignalSettings::default());
        let adc = factory.create("raf5", SignalRole::Adc).unwrap();
        assert_eq!(adc.name(), "raf5/adc");

        assert!(adc.read(SignalSettings::default().max_samples_per_read + 1).is_err());

        let raw = factory.create("raf5", SignalRole::DdcRaw).unwrap();
        let settings = SignalSettings::default();
        assert_eq!(
            raw.info().sample_rate_hz,
            settings.adc_rate_hz / f64::from(settings.decimation)
        );
    }

    #[test]
    fn test_factory_rejects_bad_rate() {
        let settings = SignalSettings {
            stream_rate_hz: 0.0,
            ..SignalSettings::default()
        };
        let factory = SimulatedFactory::new(settings);
        assert!(matches!(
            factory.create("raf5", SignalRole::Stream),
            Err(SignalError::Create { .. })
        ));
    }
}
