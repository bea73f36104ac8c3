//! Telemetry records and the per-tick report.

use std::fmt;

use tc_core::{LaneId, Tick, VehicleId};

/// One vehicle's telemetry at the end of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleRecord {
    /// Simulated seconds.
    pub time:       f64,
    pub vehicle_id: VehicleId,
    /// Metres per second.
    pub speed:      f64,
    pub x:          f64,
    pub y:          f64,
}

/// One traffic light's state at the end of a tick, before any override.
#[derive(Clone, Debug, PartialEq)]
pub struct LightRecord {
    pub time:       f64,
    /// Light alias (`tl_N`).
    pub light_id:   String,
    pub program_id: String,
    pub phase:      usize,
    /// Remaining seconds in the current phase.
    pub duration:   f64,
}

// ── Tick report ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The arrival list itself could not be read.
    Arrivals,
    Vehicle,
    Light,
    Station,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Arrivals => "arrivals",
            FailureKind::Vehicle  => "vehicle",
            FailureKind::Light    => "light",
            FailureKind::Station  => "station",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-entity failure isolated during a tick.  The entity stays registered.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityFailure {
    pub kind:   FailureKind,
    pub id:     String,
    pub reason: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverrideAction {
    /// The congested lane was already green; its phase was lengthened.
    Extended,
    /// The light was forced to the phase serving the congested lane.
    Switched,
}

/// A congestion override applied to one light.
#[derive(Clone, Debug, PartialEq)]
pub struct OverrideEvent {
    pub light:    String,
    pub lane:     LaneId,
    pub phase:    usize,
    pub duration: f64,
    pub action:   OverrideAction,
}

/// Outcome of one [`StepCoordinator::tick`][crate::StepCoordinator::tick].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick:               Tick,
    /// Engine time after the step.
    pub time:               f64,
    /// Distinct ids the engine reported as arrived.
    pub arrived:            usize,
    /// Registry entries actually removed for those arrivals.
    pub removed:            usize,
    pub vehicles_refreshed: usize,
    pub lights_refreshed:   usize,
    pub stations_refreshed: usize,
    pub overrides:          Vec<OverrideEvent>,
    pub failures:           Vec<EntityFailure>,
}

impl TickReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self, kind: FailureKind) -> impl Iterator<Item = &str> {
        self.failures.iter().filter(move |f| f.kind == kind).map(|f| f.id.as_str())
    }
}
