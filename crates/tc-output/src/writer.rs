//! The `OutputWriter` trait implemented by all backend writers.

use tc_control::{LightRecord, VehicleRecord};

use crate::{OutputResult, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are returned here; [`ReportSink`][crate::ReportSink] stores the
/// first one so the tick loop never sees them.
pub trait OutputWriter {
    /// Write one tick's vehicle records.
    fn write_vehicles(&mut self, rows: &[VehicleRecord]) -> OutputResult<()>;

    /// Write one tick's traffic-light records.
    fn write_lights(&mut self, rows: &[LightRecord]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Push buffered rows to disk without closing.
    fn flush(&mut self) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
