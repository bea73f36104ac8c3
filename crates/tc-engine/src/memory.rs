//! A deterministic, in-process [`TrafficEngine`] implementation.
//!
//! `InMemoryEngine` models just enough of a microscopic simulator to exercise
//! the control layer end to end:
//!
//! - Junctions with planar positions and directed edges between them.  Each
//!   edge owns `n` straight lanes named `<edge>_<i>`.
//! - Vehicles follow their route edge by edge at a constant speed and are
//!   reported as arrived in the step they pass the end of the last edge.
//! - Traffic lights count down the remaining phase duration each step and
//!   advance cyclically when it runs out.
//! - Routes are found by breadth-first search over edge connectivity.
//! - Lane halting counts and station occupancies are set by the caller.
//!
//! Fault injection (`fail_next_step`, `fail_next_time_read`, `fail_vehicle`,
//! `fail_color`, `fail_light`, `fail_station`) lets tests provoke every
//! failure path of the tick loop and the command surface.
//!
//! ```rust,ignore
//! let engine = InMemoryEngine::builder()
//!     .junction("A", 0.0, 0.0)
//!     .junction("B", 100.0, 0.0)
//!     .edge("AB", "A", "B", 1)
//!     .route("r0", &["AB"])
//!     .build();
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tc_core::{EdgeId, LaneId, LightId, NetworkBounds, PolygonId, Position, Rgba, RouteId, StationId, VehicleId};
use tracing::trace;

use crate::{
    EngineError, EngineResult, EntityKind, LightProgram, LightState, Phase, PolygonShape,
    TrafficEngine, VehicleTelemetry,
};

/// Speed given to vehicles that have not been assigned one (50 km/h).
const DEFAULT_SPEED: f64 = 13.89;

// ── Internal state ────────────────────────────────────────────────────────────

struct EdgeData {
    from:   String,
    to:     String,
    length: f64,
    lanes:  Vec<LaneId>,
}

struct LaneData {
    shape:   Vec<Position>,
    halting: u32,
}

struct VehicleData {
    edges:  Vec<EdgeId>,
    edge:   usize,
    offset: f64,
    speed:  f64,
    color:  Option<Rgba>,
}

struct LightData {
    program:   LightProgram,
    lanes:     Vec<LaneId>,
    phase:     usize,
    remaining: f64,
}

#[derive(Default)]
struct Faults {
    next_step: bool,
    time_read: bool,
    vehicles:  BTreeSet<VehicleId>,
    colors:    BTreeSet<VehicleId>,
    lights:    BTreeSet<LightId>,
    stations:  BTreeSet<StationId>,
}

struct EngineState {
    step_length: f64,
    time:        f64,
    junctions:   HashMap<String, Position>,
    edges:       BTreeMap<EdgeId, EdgeData>,
    lanes:       BTreeMap<LaneId, LaneData>,
    routes:      BTreeMap<RouteId, Vec<EdgeId>>,
    vehicles:    BTreeMap<VehicleId, VehicleData>,
    arrived:     Vec<VehicleId>,
    pending:     Vec<VehicleId>,
    lights:      BTreeMap<LightId, LightData>,
    polygons:    BTreeMap<PolygonId, PolygonShape>,
    stations:    BTreeMap<StationId, u32>,
    faults:      Faults,
    route_queries:   usize,
    route_creations: usize,
}

impl EngineState {
    fn edge_endpoints(&self, edge: &EdgeId) -> Option<(Position, Position)> {
        let data = self.edges.get(edge)?;
        Some((*self.junctions.get(&data.from)?, *self.junctions.get(&data.to)?))
    }

    fn vehicle(&self, id: &VehicleId) -> EngineResult<&VehicleData> {
        self.vehicles
            .get(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Vehicle, id.as_str()))
    }

    fn vehicle_mut(&mut self, id: &VehicleId) -> EngineResult<&mut VehicleData> {
        self.vehicles
            .get_mut(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Vehicle, id.as_str()))
    }

    fn light(&self, id: &LightId) -> EngineResult<&LightData> {
        if self.faults.lights.contains(id) {
            return Err(EngineError::Connection(format!("injected fault on light {id}")));
        }
        self.lights
            .get(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::TrafficLight, id.as_str()))
    }

    fn light_mut(&mut self, id: &LightId) -> EngineResult<&mut LightData> {
        if self.faults.lights.contains(id) {
            return Err(EngineError::Connection(format!("injected fault on light {id}")));
        }
        self.lights
            .get_mut(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::TrafficLight, id.as_str()))
    }

    fn position_of(&self, v: &VehicleData) -> Position {
        let Some(edge) = v.edges.get(v.edge) else {
            return Position::default();
        };
        match (self.edge_endpoints(edge), self.edges.get(edge)) {
            (Some((from, to)), Some(data)) if data.length > 0.0 => {
                from.lerp(to, v.offset / data.length)
            }
            (Some((from, _)), _) => from,
            _ => Position::default(),
        }
    }

    fn move_vehicles(&mut self) {
        let step = self.step_length;
        let mut finished = Vec::new();
        for (id, v) in self.vehicles.iter_mut() {
            v.offset += v.speed * step;
            loop {
                let len = v
                    .edges
                    .get(v.edge)
                    .and_then(|e| self.edges.get(e))
                    .map_or(0.0, |d| d.length);
                if v.offset < len {
                    break;
                }
                if v.edge + 1 >= v.edges.len() {
                    finished.push(id.clone());
                    break;
                }
                v.offset -= len;
                v.edge += 1;
            }
        }
        for id in &finished {
            self.vehicles.remove(id);
        }
        self.arrived = finished;
    }

    fn cycle_lights(&mut self) {
        let step = self.step_length;
        for light in self.lights.values_mut() {
            if light.program.phases.is_empty() {
                continue;
            }
            light.remaining -= step;
            if light.remaining <= 0.0 {
                light.phase = (light.phase + 1) % light.program.phases.len();
                light.remaining = light.program.phases[light.phase].duration_secs;
            }
        }
    }

    fn successors(&self, edge: &EdgeId) -> impl Iterator<Item = &EdgeId> {
        let end = self.edges.get(edge).map(|d| d.to.as_str());
        self.edges
            .iter()
            .filter(move |(_, d)| Some(d.from.as_str()) == end)
            .map(|(id, _)| id)
    }

    fn bfs_route(&self, from: &EdgeId, to: &EdgeId) -> Vec<EdgeId> {
        if from == to {
            return vec![from.clone()];
        }
        let mut prev: HashMap<&EdgeId, &EdgeId> = HashMap::new();
        let mut seen: BTreeSet<&EdgeId> = BTreeSet::from([from]);
        let mut queue: VecDeque<&EdgeId> = VecDeque::from([from]);

        while let Some(edge) = queue.pop_front() {
            for next in self.successors(edge) {
                if !seen.insert(next) {
                    continue;
                }
                prev.insert(next, edge);
                if next == to {
                    let mut path = vec![next.clone()];
                    let mut cur = next;
                    while let Some(&p) = prev.get(cur) {
                        path.push(p.clone());
                        cur = p;
                    }
                    path.reverse();
                    return path;
                }
                queue.push_back(next);
            }
        }
        vec![]
    }
}

// ── InMemoryEngine ────────────────────────────────────────────────────────────

/// In-process engine.  Create with [`InMemoryEngine::builder`].
pub struct InMemoryEngine {
    state: Mutex<EngineState>,
}

impl InMemoryEngine {
    pub fn builder() -> InMemoryEngineBuilder {
        InMemoryEngineBuilder::new()
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Test and demo controls ────────────────────────────────────────────

    /// Set the halting-vehicle count reported for `lane`.
    pub fn set_lane_halting(&self, lane: &LaneId, count: u32) {
        if let Some(l) = self.state().lanes.get_mut(lane) {
            l.halting = count;
        }
    }

    pub fn set_station_occupancy(&self, station: &StationId, count: u32) {
        if let Some(s) = self.state().stations.get_mut(station) {
            *s = count;
        }
    }

    /// Make the next `advance_step` fail (once).
    pub fn fail_next_step(&self) {
        self.state().faults.next_step = true;
    }

    /// Make the next `sim_time` read fail (once).
    pub fn fail_next_time_read(&self) {
        self.state().faults.time_read = true;
    }

    /// Make telemetry queries for `id` fail until [`heal_vehicle`][Self::heal_vehicle].
    pub fn fail_vehicle(&self, id: &VehicleId) {
        self.state().faults.vehicles.insert(id.clone());
    }

    pub fn heal_vehicle(&self, id: &VehicleId) {
        self.state().faults.vehicles.remove(id);
    }

    /// Refuse `set_vehicle_color` for `id`, even before it is added.
    pub fn fail_color(&self, id: &VehicleId) {
        self.state().faults.colors.insert(id.clone());
    }

    /// Make every query and command on light `id` fail.
    pub fn fail_light(&self, id: &LightId) {
        self.state().faults.lights.insert(id.clone());
    }

    pub fn fail_station(&self, id: &StationId) {
        self.state().faults.stations.insert(id.clone());
    }

    /// Remove a vehicle without reporting it as arrived, leaving any
    /// registry entry for it stale.
    pub fn drop_vehicle(&self, id: &VehicleId) {
        self.state().vehicles.remove(id);
    }

    /// Remove `id` and report it in the next step's arrival list.  Calling
    /// this twice for one id reproduces a duplicate arrival report.
    pub fn report_arrival(&self, id: &VehicleId) {
        let mut st = self.state();
        st.vehicles.remove(id);
        st.pending.push(id.clone());
    }

    /// Lanes belonging to `edge`, in lane-index order.
    pub fn lanes_of(&self, edge: &EdgeId) -> Vec<LaneId> {
        self.state().edges.get(edge).map(|e| e.lanes.clone()).unwrap_or_default()
    }

    pub fn vehicle_count(&self) -> usize {
        self.state().vehicles.len()
    }

    pub fn vehicle_color(&self, id: &VehicleId) -> Option<Rgba> {
        self.state().vehicles.get(id).and_then(|v| v.color)
    }

    /// Number of `compute_route` calls served.
    pub fn route_query_count(&self) -> usize {
        self.state().route_queries
    }

    /// Number of routes created through `create_route`.
    pub fn route_creation_count(&self) -> usize {
        self.state().route_creations
    }
}

impl TrafficEngine for InMemoryEngine {
    fn advance_step(&self) -> EngineResult<()> {
        let mut st = self.state();
        if std::mem::take(&mut st.faults.next_step) {
            return Err(EngineError::Step("injected step fault".into()));
        }
        st.time += st.step_length;
        st.move_vehicles();
        st.cycle_lights();
        let mut pending = std::mem::take(&mut st.pending);
        st.arrived.append(&mut pending);
        trace!(time = st.time, arrived = st.arrived.len(), "in-memory step");
        Ok(())
    }

    fn sim_time(&self) -> EngineResult<f64> {
        let mut st = self.state();
        if std::mem::take(&mut st.faults.time_read) {
            return Err(EngineError::Connection("injected fault on time read".into()));
        }
        Ok(st.time)
    }

    fn arrived_ids(&self) -> EngineResult<Vec<VehicleId>> {
        Ok(self.state().arrived.clone())
    }

    fn list_ids(&self, kind: EntityKind) -> EngineResult<Vec<String>> {
        let st = self.state();
        let ids = match kind {
            EntityKind::Vehicle         => st.vehicles.keys().map(ToString::to_string).collect(),
            EntityKind::TrafficLight    => st.lights.keys().map(ToString::to_string).collect(),
            EntityKind::Route           => st.routes.keys().map(ToString::to_string).collect(),
            EntityKind::Lane            => st.lanes.keys().map(ToString::to_string).collect(),
            EntityKind::Edge            => st.edges.keys().map(ToString::to_string).collect(),
            EntityKind::Polygon         => st.polygons.keys().map(ToString::to_string).collect(),
            EntityKind::ChargingStation => st.stations.keys().map(ToString::to_string).collect(),
        };
        Ok(ids)
    }

    fn network_bounds(&self) -> EngineResult<NetworkBounds> {
        let st = self.state();
        NetworkBounds::enclosing(st.junctions.values().copied())
            .ok_or_else(|| EngineError::rejected("network_bounds", "network has no junctions"))
    }

    fn add_vehicle(&self, id: &VehicleId, route: &RouteId, _vehicle_type: &str) -> EngineResult<()> {
        let mut st = self.state();
        if st.vehicles.contains_key(id) {
            return Err(EngineError::rejected("add_vehicle", format!("vehicle '{id}' already exists")));
        }
        let edges = st
            .routes
            .get(route)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Route, route.as_str()))?;
        st.vehicles.insert(
            id.clone(),
            VehicleData { edges, edge: 0, offset: 0.0, speed: DEFAULT_SPEED, color: None },
        );
        Ok(())
    }

    fn vehicle_telemetry(&self, id: &VehicleId) -> EngineResult<VehicleTelemetry> {
        let st = self.state();
        if st.faults.vehicles.contains(id) {
            return Err(EngineError::Connection(format!("injected fault on vehicle {id}")));
        }
        let v = st.vehicle(id)?;
        Ok(VehicleTelemetry { speed: v.speed, position: st.position_of(v) })
    }

    fn set_vehicle_speed(&self, id: &VehicleId, speed: f64) -> EngineResult<()> {
        if !(speed >= 0.0) {
            return Err(EngineError::rejected("set_vehicle_speed", format!("invalid speed {speed}")));
        }
        self.state().vehicle_mut(id)?.speed = speed;
        Ok(())
    }

    fn set_vehicle_color(&self, id: &VehicleId, color: Rgba) -> EngineResult<()> {
        let mut st = self.state();
        if st.faults.colors.contains(id) {
            return Err(EngineError::rejected("set_vehicle_color", format!("colour refused for {id}")));
        }
        st.vehicle_mut(id)?.color = Some(color);
        Ok(())
    }

    fn light_state(&self, id: &LightId) -> EngineResult<LightState> {
        let st = self.state();
        let l = st.light(id)?;
        Ok(LightState {
            program_id:     l.program.program_id.clone(),
            phase_index:    l.phase,
            remaining_secs: l.remaining,
        })
    }

    fn light_program(&self, id: &LightId) -> EngineResult<LightProgram> {
        Ok(self.state().light(id)?.program.clone())
    }

    fn controlled_lanes(&self, id: &LightId) -> EngineResult<Vec<LaneId>> {
        Ok(self.state().light(id)?.lanes.clone())
    }

    fn set_phase(&self, id: &LightId, phase_index: usize) -> EngineResult<()> {
        let mut st = self.state();
        let l = st.light_mut(id)?;
        let Some(phase) = l.program.phases.get(phase_index) else {
            return Err(EngineError::rejected(
                "set_phase",
                format!("phase {phase_index} out of range for {} phases", l.program.phases.len()),
            ));
        };
        l.remaining = phase.duration_secs;
        l.phase = phase_index;
        Ok(())
    }

    fn set_phase_duration(&self, id: &LightId, secs: f64) -> EngineResult<()> {
        if !(secs >= 0.0) {
            return Err(EngineError::rejected("set_phase_duration", format!("invalid duration {secs}")));
        }
        self.state().light_mut(id)?.remaining = secs;
        Ok(())
    }

    fn lane_halting_count(&self, lane: &LaneId) -> EngineResult<u32> {
        self.state()
            .lanes
            .get(lane)
            .map(|l| l.halting)
            .ok_or_else(|| EngineError::not_found(EntityKind::Lane, lane.as_str()))
    }

    fn lane_shape(&self, lane: &LaneId) -> EngineResult<Vec<Position>> {
        self.state()
            .lanes
            .get(lane)
            .map(|l| l.shape.clone())
            .ok_or_else(|| EngineError::not_found(EntityKind::Lane, lane.as_str()))
    }

    fn compute_route(&self, from: &EdgeId, to: &EdgeId) -> EngineResult<Vec<EdgeId>> {
        let mut st = self.state();
        for edge in [from, to] {
            if !st.edges.contains_key(edge) {
                return Err(EngineError::not_found(EntityKind::Edge, edge.as_str()));
            }
        }
        st.route_queries += 1;
        Ok(st.bfs_route(from, to))
    }

    fn create_route(&self, id: &RouteId, edges: &[EdgeId]) -> EngineResult<()> {
        let mut st = self.state();
        if st.routes.contains_key(id) {
            return Err(EngineError::rejected("create_route", format!("route '{id}' already exists")));
        }
        if edges.is_empty() {
            return Err(EngineError::rejected("create_route", "empty edge list"));
        }
        if let Some(unknown) = edges.iter().find(|e| !st.edges.contains_key(*e)) {
            return Err(EngineError::not_found(EntityKind::Edge, unknown.as_str()));
        }
        st.routes.insert(id.clone(), edges.to_vec());
        st.route_creations += 1;
        Ok(())
    }

    fn route_edges(&self, id: &RouteId) -> EngineResult<Vec<EdgeId>> {
        self.state()
            .routes
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Route, id.as_str()))
    }

    fn polygon(&self, id: &PolygonId) -> EngineResult<PolygonShape> {
        self.state()
            .polygons
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Polygon, id.as_str()))
    }

    fn station_occupancy(&self, id: &StationId) -> EngineResult<u32> {
        let st = self.state();
        if st.faults.stations.contains(id) {
            return Err(EngineError::Connection(format!("injected fault on station {id}")));
        }
        st.stations
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::not_found(EntityKind::ChargingStation, id.as_str()))
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`InMemoryEngine`].
///
/// Edges must reference junctions declared earlier; lights and routes must
/// reference lanes and edges declared earlier.  References to unknown names
/// are ignored so a typo shows up as a missing object at query time.
pub struct InMemoryEngineBuilder {
    state: EngineState,
}

impl InMemoryEngineBuilder {
    pub fn new() -> Self {
        Self {
            state: EngineState {
                step_length:     1.0,
                time:            0.0,
                junctions:       HashMap::new(),
                edges:           BTreeMap::new(),
                lanes:           BTreeMap::new(),
                routes:          BTreeMap::new(),
                vehicles:        BTreeMap::new(),
                arrived:         Vec::new(),
                pending:         Vec::new(),
                lights:          BTreeMap::new(),
                polygons:        BTreeMap::new(),
                stations:        BTreeMap::new(),
                faults:          Faults::default(),
                route_queries:   0,
                route_creations: 0,
            },
        }
    }

    /// Simulated seconds per step.  Default: 1.0.
    pub fn step_length(mut self, secs: f64) -> Self {
        self.state.step_length = secs;
        self
    }

    pub fn junction(mut self, name: &str, x: f64, y: f64) -> Self {
        self.state.junctions.insert(name.to_owned(), Position::new(x, y));
        self
    }

    /// Directed edge `from → to` with `lanes` lanes named `<id>_0 … <id>_{n-1}`.
    pub fn edge(mut self, id: &str, from: &str, to: &str, lanes: usize) -> Self {
        let (Some(&a), Some(&b)) = (self.state.junctions.get(from), self.state.junctions.get(to)) else {
            return self;
        };
        let lane_ids: Vec<LaneId> = (0..lanes).map(|i| LaneId::new(format!("{id}_{i}"))).collect();
        for lane in &lane_ids {
            self.state.lanes.insert(lane.clone(), LaneData { shape: vec![a, b], halting: 0 });
        }
        self.state.edges.insert(
            EdgeId::from(id),
            EdgeData { from: from.to_owned(), to: to.to_owned(), length: a.distance(b), lanes: lane_ids },
        );
        self
    }

    pub fn route(mut self, id: &str, edges: &[&str]) -> Self {
        let edges: Vec<EdgeId> = edges.iter().map(|&e| EdgeId::from(e)).collect();
        if !edges.is_empty() && edges.iter().all(|e| self.state.edges.contains_key(e)) {
            self.state.routes.insert(RouteId::from(id), edges);
        }
        self
    }

    /// Traffic light controlling one link per entry of `links` (lane ids).
    /// Each phase is `(duration_secs, state)` with one state character per link.
    pub fn light(mut self, id: &str, links: &[&str], phases: &[(f64, &str)]) -> Self {
        let phases: Vec<Phase> = phases.iter().map(|&(d, s)| Phase::new(d, s)).collect();
        let remaining = phases.first().map_or(0.0, |p| p.duration_secs);
        self.state.lights.insert(
            LightId::from(id),
            LightData {
                program: LightProgram { program_id: "0".to_owned(), phases },
                lanes: links.iter().map(|&l| LaneId::from(l)).collect(),
                phase: 0,
                remaining,
            },
        );
        self
    }

    pub fn polygon(mut self, id: &str, shape: &[(f64, f64)], color: Rgba, filled: bool) -> Self {
        self.state.polygons.insert(
            PolygonId::from(id),
            PolygonShape {
                shape: shape.iter().map(|&(x, y)| Position::new(x, y)).collect(),
                color,
                filled,
            },
        );
        self
    }

    pub fn station(mut self, id: &str, occupancy: u32) -> Self {
        self.state.stations.insert(StationId::from(id), occupancy);
        self
    }

    pub fn build(self) -> InMemoryEngine {
        InMemoryEngine { state: Mutex::new(self.state) }
    }
}

impl Default for InMemoryEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
