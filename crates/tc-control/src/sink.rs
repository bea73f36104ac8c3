//! Telemetry sink trait consumed by the step coordinator.

use tc_core::Tick;

use crate::{LightRecord, TickReport, VehicleRecord};

/// Receives the structured telemetry the coordinator emits.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Methods are infallible: a sink that
/// can fail (file I/O) keeps its first error for the caller to collect, so a
/// full disk never aborts a tick.
///
/// # Call order per tick
///
/// ```text
/// on_tick_start(tick)
///   record_vehicle(..)   one per vehicle refreshed, in id order
///   record_light(..)     one per light refreshed, in alias order
/// on_tick_end(report)
/// ```
///
/// [`close`][Self::close] is called once by
/// [`StepCoordinator::run`][crate::StepCoordinator::run] after the last tick.
pub trait TelemetrySink {
    fn on_tick_start(&mut self, _tick: Tick) {}

    fn record_vehicle(&mut self, _record: VehicleRecord) {}

    fn record_light(&mut self, _record: LightRecord) {}

    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Push buffered output to durable storage.
    fn flush(&mut self) {}

    fn close(&mut self, _final_tick: Tick) {}
}

/// A [`TelemetrySink`] that discards everything.
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

/// Keeps every record in memory.  Handy for tests and small runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub vehicles: Vec<(Tick, VehicleRecord)>,
    pub lights:   Vec<(Tick, LightRecord)>,
    pub reports:  Vec<TickReport>,
    pub closed:   Option<Tick>,
    current:      Tick,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vehicle records emitted during `tick`.
    pub fn vehicles_at(&self, tick: Tick) -> impl Iterator<Item = &VehicleRecord> {
        self.vehicles.iter().filter(move |(t, _)| *t == tick).map(|(_, r)| r)
    }
}

impl TelemetrySink for MemorySink {
    fn on_tick_start(&mut self, tick: Tick) {
        self.current = tick;
    }

    fn record_vehicle(&mut self, record: VehicleRecord) {
        self.vehicles.push((self.current, record));
    }

    fn record_light(&mut self, record: LightRecord) {
        self.lights.push((self.current, record));
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.reports.push(report.clone());
    }

    fn close(&mut self, final_tick: Tick) {
        self.closed = Some(final_tick);
    }
}
