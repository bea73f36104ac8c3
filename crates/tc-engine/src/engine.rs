//! The `TrafficEngine` trait.

use tc_core::{EdgeId, LaneId, LightId, NetworkBounds, PolygonId, Position, Rgba, RouteId, StationId, VehicleId};

use crate::{EngineResult, EntityKind, LightProgram, LightState, PolygonShape, VehicleTelemetry};

/// Pluggable simulation engine.
///
/// Implement this trait to connect the control layer to a concrete simulator.
/// Every call is treated as synchronous and potentially slow.
///
/// # Thread safety
///
/// All methods take `&self` and implementations must be `Send + Sync`: the
/// tick loop and a background stress-test injector share one engine through
/// an `Arc`, so implementations serialise access internally (a socket client
/// would hold its connection behind a mutex).
pub trait TrafficEngine: Send + Sync {
    // ── Simulation clock ────────────────────────────────────────────────────

    /// Advance the simulation by one step.  An error here means the
    /// simulation itself is unusable.
    fn advance_step(&self) -> EngineResult<()>;

    /// Current simulated time in seconds.
    fn sim_time(&self) -> EngineResult<f64>;

    /// Vehicles that completed their route during the last step.
    ///
    /// May contain duplicates.
    fn arrived_ids(&self) -> EngineResult<Vec<VehicleId>>;

    /// Bulk id listing for one object class.
    fn list_ids(&self, kind: EntityKind) -> EngineResult<Vec<String>>;

    fn network_bounds(&self) -> EngineResult<NetworkBounds>;

    // ── Vehicles ────────────────────────────────────────────────────────────

    fn add_vehicle(&self, id: &VehicleId, route: &RouteId, vehicle_type: &str) -> EngineResult<()>;

    /// Fails with `NotFound` once the vehicle has left the simulation.
    fn vehicle_telemetry(&self, id: &VehicleId) -> EngineResult<VehicleTelemetry>;

    fn set_vehicle_speed(&self, id: &VehicleId, speed: f64) -> EngineResult<()>;

    fn set_vehicle_color(&self, id: &VehicleId, color: Rgba) -> EngineResult<()>;

    // ── Traffic lights ──────────────────────────────────────────────────────

    fn light_state(&self, id: &LightId) -> EngineResult<LightState>;

    fn light_program(&self, id: &LightId) -> EngineResult<LightProgram>;

    /// Incoming lane of every controlled link, indexed by link.  A lane with
    /// several outgoing movements appears once per link.
    fn controlled_lanes(&self, id: &LightId) -> EngineResult<Vec<LaneId>>;

    /// Switch immediately to `phase_index` of the active program.
    fn set_phase(&self, id: &LightId, phase_index: usize) -> EngineResult<()>;

    /// Set the remaining duration of the current phase.
    fn set_phase_duration(&self, id: &LightId, secs: f64) -> EngineResult<()>;

    // ── Network ─────────────────────────────────────────────────────────────

    /// Vehicles currently halting (near-zero speed) on a lane.
    fn lane_halting_count(&self, lane: &LaneId) -> EngineResult<u32>;

    fn lane_shape(&self, lane: &LaneId) -> EngineResult<Vec<Position>>;

    /// Shortest edge sequence from `from` to `to`, both included.  An empty
    /// result means no route exists.
    fn compute_route(&self, from: &EdgeId, to: &EdgeId) -> EngineResult<Vec<EdgeId>>;

    fn create_route(&self, id: &RouteId, edges: &[EdgeId]) -> EngineResult<()>;

    fn route_edges(&self, id: &RouteId) -> EngineResult<Vec<EdgeId>>;

    // ── Static objects ──────────────────────────────────────────────────────

    fn polygon(&self, id: &PolygonId) -> EngineResult<PolygonShape>;

    /// Vehicles currently parked or charging at a station.
    fn station_occupancy(&self, id: &StationId) -> EngineResult<u32>;
}
