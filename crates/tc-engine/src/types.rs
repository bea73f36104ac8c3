//! Plain data exchanged across the engine boundary.

use std::fmt;

use tc_core::{Position, Rgba};

/// Object classes the engine can list in bulk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vehicle,
    TrafficLight,
    Route,
    Lane,
    Edge,
    Polygon,
    ChargingStation,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Vehicle         => "vehicle",
            EntityKind::TrafficLight    => "traffic light",
            EntityKind::Route           => "route",
            EntityKind::Lane            => "lane",
            EntityKind::Edge            => "edge",
            EntityKind::Polygon         => "polygon",
            EntityKind::ChargingStation => "charging station",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live kinematic state of one vehicle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VehicleTelemetry {
    /// Metres per second.
    pub speed:    f64,
    pub position: Position,
}

/// Live signal state of one traffic light.
#[derive(Clone, Debug, PartialEq)]
pub struct LightState {
    pub program_id:     String,
    pub phase_index:    usize,
    /// Seconds until the engine switches to the next phase on its own.
    pub remaining_secs: f64,
}

/// One phase of a signal program.
///
/// `state` holds one character per controlled link: `G`/`g` green (priority /
/// yielding), `y`/`Y` amber, `r` red, `s`/`u`/`o`/`O` other signal states.
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub duration_secs: f64,
    pub state:         String,
}

impl Phase {
    pub fn new(duration_secs: f64, state: impl Into<String>) -> Self {
        Self { duration_secs, state: state.into() }
    }

    /// Does link `index` have a green movement in this phase?
    pub fn is_green_at(&self, index: usize) -> bool {
        matches!(self.state.as_bytes().get(index), Some(b'G' | b'g'))
    }

    /// Any green movement at all.
    pub fn has_green(&self) -> bool {
        self.state.bytes().any(|c| matches!(c, b'G' | b'g'))
    }

    /// No green and no amber movement: every approach is stopped.
    pub fn is_all_red(&self) -> bool {
        !self.state.bytes().any(|c| matches!(c, b'G' | b'g' | b'y' | b'Y'))
    }
}

/// The active program of a traffic light.
#[derive(Clone, Debug, PartialEq)]
pub struct LightProgram {
    pub program_id: String,
    pub phases:     Vec<Phase>,
}

/// Static map polygon geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonShape {
    pub shape:  Vec<Position>,
    pub color:  Rgba,
    pub filled: bool,
}
