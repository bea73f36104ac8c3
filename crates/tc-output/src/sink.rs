//! `ReportSink<W>` — bridges `TelemetrySink` to an `OutputWriter`.

use tc_control::{LightRecord, TelemetrySink, TickReport, VehicleRecord};
use tc_core::Tick;
use tracing::warn;

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult, TickSummaryRow};

/// A [`TelemetrySink`] that writes vehicle, light, and summary rows to any
/// [`OutputWriter`] backend.
///
/// Records are buffered for the current tick and written in one batch at
/// tick end.  Write errors are stored because sink methods have no return
/// value; check with [`take_error`][Self::take_error] after the run.
pub struct ReportSink<W: OutputWriter> {
    writer:     W,
    vehicles:   Vec<VehicleRecord>,
    lights:     Vec<LightRecord>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> ReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            vehicles:   Vec::new(),
            lights:     Vec::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!(error = %e, "report write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> TelemetrySink for ReportSink<W> {
    fn on_tick_start(&mut self, _tick: Tick) {
        self.vehicles.clear();
        self.lights.clear();
    }

    fn record_vehicle(&mut self, record: VehicleRecord) {
        self.vehicles.push(record);
    }

    fn record_light(&mut self, record: LightRecord) {
        self.lights.push(record);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        let result = self.writer.write_vehicles(&self.vehicles);
        self.store_err(result);
        let result = self.writer.write_lights(&self.lights);
        self.store_err(result);
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(report));
        self.store_err(result);
        self.vehicles.clear();
        self.lights.clear();
    }

    fn flush(&mut self) {
        let result = self.writer.flush();
        self.store_err(result);
    }

    fn close(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
