//! The `StepCoordinator` and its tick loop.

use std::sync::Arc;

use tc_core::{SimClock, Tick, VehicleId};
use tc_engine::TrafficEngine;
use tc_entity::{lock, EntityRegistry};
use tracing::{debug, info, warn};

use crate::{
    ControlError, ControlResult, EntityFailure, FailureKind, LightRecord, OverridePolicy,
    TelemetrySink, TickReport, VehicleRecord,
};

#[cfg(feature = "fx-hash")]
type IdSet<'a> = rustc_hash::FxHashSet<&'a VehicleId>;
#[cfg(not(feature = "fx-hash"))]
type IdSet<'a> = std::collections::HashSet<&'a VehicleId>;

/// Drives the engine one step at a time and keeps the registry in sync.
///
/// Each [`tick`][Self::tick] runs five phases in strict order:
///
/// 1. **Advance**: step the engine.  Failure aborts the tick.
/// 2. **Arrivals**: deduplicate the engine's arrived ids and drop them from
///    the registry, so a departed vehicle never gets a record this tick.
/// 3. **Vehicles**: refresh and record every registered vehicle.
/// 4. **Lights**: refresh, record, then apply the [`OverridePolicy`].
/// 5. **Stations**: refresh occupancy.
///
/// Phases 2–5 isolate failures per entity: the entity stays registered, the
/// failure is logged and listed in the [`TickReport`], and the loop moves on.
///
/// Create via [`CoordinatorBuilder`][crate::CoordinatorBuilder].
pub struct StepCoordinator<E: TrafficEngine> {
    pub(crate) engine:      Arc<E>,
    pub(crate) registry:    Arc<EntityRegistry>,
    pub(crate) policy:      OverridePolicy,
    pub(crate) clock:       SimClock,
    pub(crate) total_steps: u64,
}

impl<E: TrafficEngine> StepCoordinator<E> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &OverridePolicy {
        &self.policy
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Ticks completed so far.
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick until `total_steps` ticks have completed,
    /// then close the sink.
    pub fn run<S: TelemetrySink + ?Sized>(&mut self, sink: &mut S) -> ControlResult<()> {
        let end = Tick(self.total_steps);
        while self.clock.current_tick < end {
            self.tick(sink)?;
        }
        sink.flush();
        sink.close(self.clock.current_tick);
        info!(clock = %self.clock, "run complete");
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores
    /// `total_steps`).  The sink is flushed but not closed.
    pub fn run_steps<S: TelemetrySink + ?Sized>(&mut self, n: u64, sink: &mut S) -> ControlResult<Vec<TickReport>> {
        let mut reports = Vec::new();
        for _ in 0..n {
            reports.push(self.tick(sink)?);
        }
        sink.flush();
        Ok(reports)
    }

    /// Execute one step.  Only an engine step or time-read failure is
    /// returned as `Err`; the clock still counts a step the engine took.
    pub fn tick<S: TelemetrySink + ?Sized>(&mut self, sink: &mut S) -> ControlResult<TickReport> {
        let tick = self.clock.current_tick;
        sink.on_tick_start(tick);

        // No vehicle may be admitted between the step and its arrival sweep.
        let admission = self.registry.admission();

        // ── Phase 1: advance ──────────────────────────────────────────────
        self.engine.advance_step().map_err(ControlError::Step)?;
        self.clock.advance();
        let time = self.engine.sim_time().map_err(ControlError::Step)?;

        let mut report = TickReport { tick, time, ..TickReport::default() };

        // ── Phase 2: arrivals ─────────────────────────────────────────────
        self.reconcile_arrivals(&mut report);
        drop(admission);

        // ── Phase 3: vehicles ─────────────────────────────────────────────
        self.refresh_vehicles(time, sink, &mut report);

        // ── Phase 4: lights + congestion override ─────────────────────────
        self.refresh_lights(time, sink, &mut report);

        // ── Phase 5: stations ─────────────────────────────────────────────
        self.refresh_stations(&mut report);

        if !report.is_clean() {
            debug!(%tick, failures = report.failures.len(), "tick finished with isolated failures");
        }
        sink.on_tick_end(&report);
        Ok(report)
    }

    // ── Phases ────────────────────────────────────────────────────────────

    fn reconcile_arrivals(&self, report: &mut TickReport) {
        let arrived = match self.engine.arrived_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "could not read arrived vehicles");
                report.failures.push(EntityFailure {
                    kind:   FailureKind::Arrivals,
                    id:     String::new(),
                    reason: e.to_string(),
                });
                return;
            }
        };
        // The engine may list an id more than once.
        let distinct: IdSet<'_> = arrived.iter().collect();
        report.arrived = distinct.len();
        report.removed = self.registry.vehicles.remove_all(distinct);
        if report.removed > 0 {
            debug!(removed = report.removed, "arrived vehicles removed");
        }
    }

    fn refresh_vehicles<S: TelemetrySink + ?Sized>(&self, time: f64, sink: &mut S, report: &mut TickReport) {
        for (id, shared) in self.registry.vehicles.entries() {
            let mut vehicle = lock(&shared);
            match vehicle.refresh(self.engine.as_ref()) {
                Ok(t) => {
                    report.vehicles_refreshed += 1;
                    sink.record_vehicle(VehicleRecord {
                        time,
                        vehicle_id: id,
                        speed:      t.speed,
                        x:          t.position.x,
                        y:          t.position.y,
                    });
                }
                Err(e) => {
                    warn!(vehicle = %id, error = %e, "vehicle refresh failed");
                    report.failures.push(EntityFailure {
                        kind:   FailureKind::Vehicle,
                        id:     id.into_inner(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn refresh_lights<S: TelemetrySink + ?Sized>(&self, time: f64, sink: &mut S, report: &mut TickReport) {
        let engine = self.engine.as_ref();
        for (alias, shared) in self.registry.lights.entries() {
            let mut light = lock(&shared);
            if let Err(e) = light.refresh(engine) {
                warn!(light = %alias, error = %e, "light refresh failed");
                report.failures.push(EntityFailure {
                    kind:   FailureKind::Light,
                    id:     alias,
                    reason: e.to_string(),
                });
                continue;
            }
            report.lights_refreshed += 1;
            sink.record_light(LightRecord {
                time,
                light_id:   alias.clone(),
                program_id: light.program_id().to_owned(),
                phase:      light.phase_index(),
                duration:   light.remaining_secs(),
            });

            match self.policy.apply(&mut light, engine) {
                Ok(Some(event)) => {
                    debug!(
                        light = %alias,
                        lane = %event.lane,
                        phase = event.phase,
                        action = ?event.action,
                        "congestion override"
                    );
                    report.overrides.push(event);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(light = %alias, error = %e, "congestion override failed");
                    report.failures.push(EntityFailure {
                        kind:   FailureKind::Light,
                        id:     alias,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn refresh_stations(&self, report: &mut TickReport) {
        for (id, shared) in self.registry.stations.entries() {
            match lock(&shared).refresh(self.engine.as_ref()) {
                Ok(_) => report.stations_refreshed += 1,
                Err(e) => {
                    warn!(station = %id, error = %e, "station refresh failed");
                    report.failures.push(EntityFailure {
                        kind:   FailureKind::Station,
                        id:     id.into_inner(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
