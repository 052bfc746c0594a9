//! Registry subtrees exported by the dummy device.
//!
//! Both boards are attached under `boards`:
//!
//! ```text
//! boards/evrx2   pll, events/t1, events/t2
//! boards/raf5    conditioning, conf, tbt, local_timing, interlock,
//!                postmortem, signal_processing, events, signals
//! ```

use crate::config::InterlockSettings;
use crate::error::Result;
use crate::registry::{NodeBuilder, RegEnum, SharedWord};
use crate::signal::{SignalFactory, SignalRole, SignalSet, SignalSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Interlock status bit positions within the `il_status` word.
pub mod il_status {
    pub const X: u32 = 0;
    pub const Y: u32 = 1;
    pub const ATTENUATOR: u32 = 2;
    pub const ADC_OVERFLOW_FILTERED: u32 = 3;
    pub const ADC_OVERFLOW: u32 = 4;
}

/// Turn-by-turn switching signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchingSource {
    Internal,
    External,
}

impl RegEnum for SwitchingSource {
    const ITEMS: &'static [(i64, &'static str)] = &[(0, "Internal"), (1, "External")];

    fn code(self) -> i64 {
        match self {
            SwitchingSource::Internal => 0,
            SwitchingSource::External => 1,
        }
    }
}

/// Which DSC coefficients are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedCoefficients {
    Unity,
    Adjusted,
}

impl RegEnum for AppliedCoefficients {
    const ITEMS: &'static [(i64, &'static str)] = &[(0, "unity"), (1, "adjusted")];

    fn code(self) -> i64 {
        match self {
            AppliedCoefficients::Unity => 0,
            AppliedCoefficients::Adjusted => 1,
        }
    }
}

/// Timing board subtree: PLL state and event counters.
pub fn timing_subtree(name: &str) -> NodeBuilder {
    NodeBuilder::group(name)
        .child(
            NodeBuilder::group("pll")
                .child(NodeBuilder::boolean("locked", true))
                .child(NodeBuilder::int32("vcxo_offset", 100))
                .child(NodeBuilder::boolean("compensate_offset", true)),
        )
        .child(
            NodeBuilder::group("events")
                .child(NodeBuilder::group("t1").child(NodeBuilder::uint64("count", 123)))
                .child(NodeBuilder::group("t2").child(NodeBuilder::uint64("count", 345))),
        )
}

/// Live resources of one acquisition (RAF) board.
pub struct RafBoard {
    pub name: String,
    /// Interlock status word aliased by the `il_status` bit views
    pub il_status: SharedWord,
    signals: HashMap<SignalRole, Arc<dyn SignalSource>>,
}

impl RafBoard {
    /// Create the board's sources in [`SignalRole::ALL`] order, pushing each
    /// into `owned` as soon as it exists.
    pub fn create(name: &str, factory: &dyn SignalFactory, owned: &mut SignalSet) -> Result<Self> {
        let mut signals = HashMap::new();
        for role in SignalRole::ALL {
            let source = factory.create(name, role)?;
            owned.push(Arc::clone(&source));
            signals.insert(role, source);
        }
        Ok(Self {
            name: name.to_string(),
            il_status: SharedWord::new(0),
            signals,
        })
    }

    pub fn signal(&self, role: SignalRole) -> Option<&Arc<dyn SignalSource>> {
        self.signals.get(&role)
    }

    fn binding(&self, name: &str, role: SignalRole) -> NodeBuilder {
        match self.signal(role) {
            Some(source) => NodeBuilder::signal(name, source),
            None => NodeBuilder::group(name),
        }
    }

    /// Full registry subtree of the board.
    pub fn subtree(&self, interlock: &InterlockSettings) -> NodeBuilder {
        let board = self.name.clone();
        let store = move || -> anyhow::Result<bool> {
            tracing::info!("Storing DSC coefficients of '{}'", board);
            Ok(true)
        };
        let word = self.il_status.clone();
        let reset = move || -> anyhow::Result<bool> {
            word.reset();
            tracing::debug!("Interlock status reset");
            Ok(true)
        };
        let ilk = &self.il_status;

        NodeBuilder::group(self.name.as_str())
            .child(
                NodeBuilder::group("conditioning")
                    .child(
                        NodeBuilder::group("tuning")
                            .child(
                                NodeBuilder::group("agc")
                                    .child(NodeBuilder::boolean("enabled", true))
                                    .child(NodeBuilder::int32("power_level", -66)),
                            )
                            .child(
                                NodeBuilder::group("dsc").child(
                                    NodeBuilder::group("coefficients")
                                        .child(NodeBuilder::boolean("adjust", false))
                                        .child(NodeBuilder::enumeration(
                                            "type",
                                            AppliedCoefficients::Unity,
                                        ))
                                        .child(NodeBuilder::exec("store", store)),
                                ),
                            ),
                    )
                    .child(NodeBuilder::boolean("switching", true)),
            )
            .child(
                NodeBuilder::group("conf")
                    .child(NodeBuilder::uint32("switching_delay", 0))
                    .child(NodeBuilder::enumeration(
                        "switching_source",
                        SwitchingSource::Internal,
                    )),
            )
            .child(NodeBuilder::group("tbt").child(NodeBuilder::uint32("phase_offset", 0)))
            .child(
                NodeBuilder::group("local_timing")
                    .child(NodeBuilder::uint32("trigger_delay", 0)),
            )
            .child(
                NodeBuilder::group("interlock")
                    .child(NodeBuilder::boolean("enabled", false))
                    .child(
                        NodeBuilder::group("gain_dependent")
                            .child(NodeBuilder::boolean("enabled", false))
                            .child(NodeBuilder::int32("threshold", -40)),
                    )
                    .child(
                        NodeBuilder::group("limits")
                            .child(
                                NodeBuilder::group("position")
                                    .child(
                                        NodeBuilder::group("min")
                                            .child(NodeBuilder::int32("x", -1_000_000))
                                            .child(NodeBuilder::int32("y", -1_000_000)),
                                    )
                                    .child(
                                        NodeBuilder::group("max")
                                            .child(NodeBuilder::int32("x", 1_000_000))
                                            .child(NodeBuilder::int32("y", 1_000_000)),
                                    ),
                            )
                            .child(
                                NodeBuilder::group("overflow")
                                    .child(NodeBuilder::uint32(
                                        "threshold",
                                        interlock.overflow_threshold,
                                    ))
                                    .child(NodeBuilder::uint32(
                                        "duration",
                                        interlock.overflow_duration,
                                    )),
                            ),
                    )
                    .child(
                        NodeBuilder::group("status").child(
                            NodeBuilder::group("il_status")
                                .child(NodeBuilder::exec("reset", reset))
                                .child(NodeBuilder::bits("x", ilk, il_status::X, 1))
                                .child(NodeBuilder::bits("y", ilk, il_status::Y, 1))
                                .child(NodeBuilder::bits(
                                    "attenuator",
                                    ilk,
                                    il_status::ATTENUATOR,
                                    1,
                                ))
                                .child(NodeBuilder::bits(
                                    "adc_overflow_filtered",
                                    ilk,
                                    il_status::ADC_OVERFLOW_FILTERED,
                                    1,
                                ))
                                .child(NodeBuilder::bits(
                                    "adc_overflow",
                                    ilk,
                                    il_status::ADC_OVERFLOW,
                                    1,
                                )),
                        ),
                    ),
            )
            .child(
                NodeBuilder::group("postmortem")
                    .child(NodeBuilder::boolean("capture", false))
                    .child(NodeBuilder::int32("offset", 0))
                    .child(NodeBuilder::group("signals").child(
                        self.binding("ddc_synthetic", SignalRole::PostmortemSynthetic),
                    )),
            )
            .child(
                NodeBuilder::group("signal_processing").child(
                    NodeBuilder::group("position")
                        .child(NodeBuilder::uint32("Kx", 10_000_000))
                        .child(NodeBuilder::uint32("Ky", 10_000_000))
                        .child(NodeBuilder::int32("off_x", 0))
                        .child(NodeBuilder::int32("off_y", 0)),
                ),
            )
            .child(NodeBuilder::group("events").child(NodeBuilder::int32("trigger", 123_456)))
            .child(
                NodeBuilder::group("signals")
                    .child(self.binding("adc", SignalRole::Adc))
                    .child(self.binding("ddc_raw", SignalRole::DdcRaw))
                    .child(self.binding("ddc_synthetic", SignalRole::DdcSynthetic))
                    .child(self.binding("sa", SignalRole::Stream)),
            )
    }
}
