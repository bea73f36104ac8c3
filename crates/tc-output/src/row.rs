//! Plain data row types written by output backends.

use tc_control::TickReport;

/// Summary counters for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:      u64,
    /// Engine time after the step, seconds.
    pub time:      f64,
    pub arrived:   u64,
    pub removed:   u64,
    pub vehicles:  u64,
    pub lights:    u64,
    pub overrides: u64,
    pub failures:  u64,
}

impl From<&TickReport> for TickSummaryRow {
    fn from(report: &TickReport) -> Self {
        Self {
            tick:      report.tick.0,
            time:      report.time,
            arrived:   report.arrived as u64,
            removed:   report.removed as u64,
            vehicles:  report.vehicles_refreshed as u64,
            lights:    report.lights_refreshed as u64,
            overrides: report.overrides.len() as u64,
            failures:  report.failures.len() as u64,
        }
    }
}
