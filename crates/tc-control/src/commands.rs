//! The command surface: everything an outside caller (CLI, UI, stress test)
//! may ask of the running system.
//!
//! `Commands` is cheap to clone and safe to use from any thread while a
//! [`StepCoordinator`][crate::StepCoordinator] ticks on another.  Lookups go
//! through the shared registry, so a vehicle removed on arrival simply stops
//! being found.

use std::sync::{Arc, Mutex, MutexGuard};

use tc_core::{ControlConfig, EdgeId, Rgba, RouteId, SimRng, VehicleId};
use tc_engine::TrafficEngine;
use tc_entity::geometry::load_edges;
use tc_entity::{lock, EntityError, EntityRegistry, Flow, Route, Shared, TrafficLight, Vehicle};
use tracing::{debug, info, warn};

use crate::{ControlError, ControlResult};

/// Everything needed to add one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSpec {
    pub id:           VehicleId,
    pub route:        RouteId,
    pub vehicle_type: String,
    pub color:        Option<Rgba>,
}

impl VehicleSpec {
    pub fn new(id: impl Into<VehicleId>, route: impl Into<RouteId>, vehicle_type: impl Into<String>) -> Self {
        Self {
            id:           id.into(),
            route:        route.into(),
            vehicle_type: vehicle_type.into(),
            color:        None,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }
}

pub struct Commands<E: TrafficEngine> {
    engine:       Arc<E>,
    registry:     Arc<EntityRegistry>,
    edges:        Arc<[EdgeId]>,
    rng:          Arc<Mutex<SimRng>>,
    retry_limit:  u32,
    vehicle_type: Arc<str>,
}

impl<E: TrafficEngine> Clone for Commands<E> {
    fn clone(&self) -> Self {
        Self {
            engine:       Arc::clone(&self.engine),
            registry:     Arc::clone(&self.registry),
            edges:        Arc::clone(&self.edges),
            rng:          Arc::clone(&self.rng),
            retry_limit:  self.retry_limit,
            vehicle_type: Arc::clone(&self.vehicle_type),
        }
    }
}

impl<E: TrafficEngine> Commands<E> {
    /// Load the routable edge set from the engine and seed the RNG from
    /// `config.seed`.
    pub fn new(engine: Arc<E>, registry: Arc<EntityRegistry>, config: &ControlConfig) -> ControlResult<Self> {
        let edges = load_edges(engine.as_ref())?;
        info!(edges = edges.len(), "routable edges loaded");
        Ok(Self::with_edges(engine, registry, edges, config))
    }

    /// Use a caller-supplied edge set for random route discovery.
    pub fn with_edges(
        engine:   Arc<E>,
        registry: Arc<EntityRegistry>,
        edges:    Vec<EdgeId>,
        config:   &ControlConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            edges:        edges.into(),
            rng:          Arc::new(Mutex::new(SimRng::new(config.seed))),
            retry_limit:  config.route_retry_limit,
            vehicle_type: config.default_vehicle_type.as_str().into(),
        }
    }

    fn rng(&self) -> MutexGuard<'_, SimRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn vehicle(&self, id: &VehicleId) -> ControlResult<Shared<Vehicle>> {
        self.registry
            .vehicles
            .get(id)
            .ok_or_else(|| ControlError::VehicleNotFound(id.clone()))
    }

    fn light(&self, alias: &str) -> ControlResult<Shared<TrafficLight>> {
        self.registry
            .lights
            .get(alias)
            .ok_or_else(|| ControlError::LightNotFound(alias.to_owned()))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.registry.vehicles.ids()
    }

    pub fn light_aliases(&self) -> Vec<String> {
        self.registry.lights.ids()
    }

    pub fn route_ids(&self) -> Vec<RouteId> {
        self.registry.routes.ids()
    }

    // ── Vehicles ──────────────────────────────────────────────────────────

    /// Insert a vehicle on a registered route and register it.
    ///
    /// If the engine accepts the vehicle but refuses the colour, the vehicle
    /// stays registered (it exists in the engine) and the error is returned.
    pub fn add_vehicle(&self, spec: VehicleSpec) -> ControlResult<()> {
        if !self.registry.routes.contains(&spec.route) {
            return Err(ControlError::RouteNotFound(spec.route));
        }
        let engine = self.engine.as_ref();
        let shared = {
            let _admission = self.registry.admission();
            let vehicle = Vehicle::spawn(engine, spec.id.clone(), spec.route.clone(), &spec.vehicle_type)
                .map_err(|e| ControlError::command("add_vehicle", spec.id.as_str(), e))?;
            self.registry.add_vehicle(vehicle)
        };
        if let Some(color) = spec.color {
            lock(&shared)
                .set_color(engine, color)
                .map_err(|e| ControlError::command("set_color", spec.id.as_str(), e))?;
        }
        info!(vehicle = %spec.id, route = %spec.route, "vehicle added");
        Ok(())
    }

    pub fn set_speed(&self, id: &VehicleId, speed: f64) -> ControlResult<()> {
        lock(&self.vehicle(id)?)
            .set_speed(self.engine.as_ref(), speed)
            .map_err(|e| ControlError::command("set_speed", id.as_str(), e))?;
        info!(vehicle = %id, speed, "speed set");
        Ok(())
    }

    pub fn set_color(&self, id: &VehicleId, color: Rgba) -> ControlResult<()> {
        lock(&self.vehicle(id)?)
            .set_color(self.engine.as_ref(), color)
            .map_err(|e| ControlError::command("set_color", id.as_str(), e))?;
        info!(vehicle = %id, %color, "colour set");
        Ok(())
    }

    /// Inject a flow onto a registered route and register its vehicles.
    ///
    /// Returns the ids created.  If the engine refuses a vehicle part-way,
    /// the ones already created are registered and the error is returned.
    pub fn trigger_flow(&self, flow: &Flow) -> ControlResult<Vec<VehicleId>> {
        if !self.registry.routes.contains(&flow.route) {
            return Err(ControlError::RouteNotFound(flow.route.clone()));
        }
        let _admission = self.registry.admission();
        match flow.inject(self.engine.as_ref()) {
            Ok(vehicles) => {
                let ids: Vec<VehicleId> = vehicles.iter().map(|v| v.id().clone()).collect();
                self.registry.add_vehicles(vehicles);
                info!(flow = %flow.id, route = %flow.route, count = ids.len(), "flow triggered");
                Ok(ids)
            }
            Err(e) => {
                warn!(flow = %flow.id, error = %e, "flow stopped early");
                self.registry.add_vehicles(e.created.iter().cloned());
                Err(e.into())
            }
        }
    }

    // ── Traffic lights ────────────────────────────────────────────────────

    pub fn set_phase(&self, alias: &str, phase_index: usize) -> ControlResult<()> {
        lock(&self.light(alias)?)
            .set_phase(self.engine.as_ref(), phase_index)
            .map_err(|e| ControlError::command("set_phase", alias, e))?;
        info!(light = alias, phase = phase_index, "phase set");
        Ok(())
    }

    pub fn set_phase_duration(&self, alias: &str, secs: f64) -> ControlResult<()> {
        lock(&self.light(alias)?)
            .set_phase_duration(self.engine.as_ref(), secs)
            .map_err(|e| ControlError::command("set_phase_duration", alias, e))?;
        info!(light = alias, secs, "phase duration set");
        Ok(())
    }

    /// Jump to the next all-red phase.  `Ok(None)` if the light is already
    /// red; otherwise the new phase index.
    pub fn switch_light_to_red(&self, alias: &str) -> ControlResult<Option<usize>> {
        let shared = self.light(alias)?;
        let mut light = lock(&shared);
        if light.is_red_phase() {
            info!(light = alias, "already red");
            return Ok(None);
        }
        let phase = light
            .switch_to_next_red(self.engine.as_ref())
            .map_err(|e| switch_error("switch_light_to_red", alias, e))?;
        info!(light = alias, phase, "switched to red");
        Ok(Some(phase))
    }

    /// Jump to the next phase with a green movement.  `Ok(None)` if the
    /// light is already green; otherwise the new phase index.
    pub fn switch_light_to_green(&self, alias: &str) -> ControlResult<Option<usize>> {
        let shared = self.light(alias)?;
        let mut light = lock(&shared);
        if light.is_green_phase() {
            info!(light = alias, "already green");
            return Ok(None);
        }
        let phase = light
            .switch_to_next_green(self.engine.as_ref())
            .map_err(|e| switch_error("switch_light_to_green", alias, e))?;
        info!(light = alias, phase, "switched to green");
        Ok(Some(phase))
    }

    pub fn program_definition(&self, alias: &str) -> ControlResult<String> {
        Ok(lock(&self.light(alias)?).program_definition())
    }

    // ── Routes ────────────────────────────────────────────────────────────

    /// Route from `start` to `end`, registered as `route_<start>to<end>`.
    ///
    /// Cached: a second call for the same pair returns the registered route
    /// without asking the engine again.  Zero edges from the engine is
    /// [`ControlError::NoRoute`].
    pub fn create_dynamic_route(&self, start: &EdgeId, end: &EdgeId) -> ControlResult<Shared<Route>> {
        let id = RouteId::between(start, end);
        let engine = self.engine.as_ref();
        self.registry.routes.get_or_try_insert_with(id.clone(), || {
            let edges = engine
                .compute_route(start, end)
                .map_err(|e| ControlError::command("compute_route", id.as_str(), e))?;
            if edges.is_empty() {
                return Err(ControlError::NoRoute { from: start.clone(), to: end.clone() });
            }
            engine
                .create_route(&id, &edges)
                .map_err(|e| ControlError::command("create_route", id.as_str(), e))?;
            info!(route = %id, edges = edges.len(), "dynamic route created");
            Ok(Route::new(id.clone(), edges))
        })
    }

    /// Best-effort: sample two distinct edges and try to route between them,
    /// up to `route_retry_limit` attempts.  `None` when every attempt fails.
    pub fn create_random_route(&self) -> Option<Shared<Route>> {
        if self.edges.is_empty() {
            return None;
        }
        for attempt in 1..=self.retry_limit {
            let (start, end) = {
                let mut rng = self.rng();
                match (rng.choose(&self.edges), rng.choose(&self.edges)) {
                    (Some(s), Some(e)) => (s.clone(), e.clone()),
                    _ => return None,
                }
            };
            if start == end {
                continue;
            }
            match self.create_dynamic_route(&start, &end) {
                Ok(route) => {
                    debug!(attempt, %start, %end, "random route found");
                    return Some(route);
                }
                Err(e) => debug!(attempt, %start, %end, error = %e, "random route attempt failed"),
            }
        }
        warn!(attempts = self.retry_limit, "no random route found");
        None
    }

    /// Add a randomly coloured vehicle on a random route.
    ///
    /// `Ok(None)` when no route could be found.
    pub fn create_random_vehicle(&self) -> ControlResult<Option<VehicleId>> {
        let Some(route) = self.create_random_route() else {
            return Ok(None);
        };
        let route_id = lock(&route).id().clone();
        let (id, color) = {
            let mut rng = self.rng();
            let id = VehicleId::new(format!("RandomVehicle_{}", rng.next_u64()));
            (id, Rgba::random(&mut rng))
        };
        let spec = VehicleSpec::new(id.clone(), route_id, self.vehicle_type.as_ref()).with_color(color);
        self.add_vehicle(spec)?;
        Ok(Some(id))
    }
}

/// Engine refusals get the command context.  `NoPhase` already names the light.
fn switch_error(op: &'static str, alias: &str, e: EntityError) -> ControlError {
    match e {
        EntityError::Engine(source) => ControlError::command(op, alias, source),
        other => other.into(),
    }
}
