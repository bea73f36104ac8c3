//! `tc-output` — telemetry report writers for the traffic-control workspace.
//!
//! Two backends are provided, the second behind a Cargo feature:
//!
//! | Feature   | Backend | Files created                                                          |
//! |-----------|---------|------------------------------------------------------------------------|
//! | *(none)*  | CSV     | `vehicle_report.csv`, `trafficlight_report.csv`, `tick_summaries.csv`  |
//! | `sqlite`  | SQLite  | `report.db`                                                            |
//!
//! CSV files are semicolon-delimited.  All backends implement
//! [`OutputWriter`] and are driven by [`ReportSink`], which implements
//! `tc_control::TelemetrySink`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tc_output::{CsvWriter, ReportSink};
//!
//! let mut sink = ReportSink::new(CsvWriter::new(Path::new("./output"))?);
//! coordinator.run(&mut sink)?;
//! if let Some(e) = sink.take_error() {
//!     eprintln!("report error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod sink;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use row::TickSummaryRow;
pub use sink::ReportSink;
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
