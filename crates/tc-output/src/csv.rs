//! CSV output backend.
//!
//! Creates three semicolon-delimited files in the configured directory:
//! - `vehicle_report.csv`      `Time;VehicleID;Speed_ms;X_Coord;Y_Coord`
//! - `trafficlight_report.csv` `Time;LightID;ProgramID;CurrentPhase;Duration`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use tc_control::{LightRecord, VehicleRecord};

use crate::writer::OutputWriter;
use crate::{OutputResult, TickSummaryRow};

pub const VEHICLE_FILE: &str = "vehicle_report.csv";
pub const LIGHT_FILE: &str = "trafficlight_report.csv";
pub const SUMMARY_FILE: &str = "tick_summaries.csv";

/// Writes reports to three CSV files.
pub struct CsvWriter {
    vehicles:  Writer<File>,
    lights:    Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

fn open(dir: &Path, name: &str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = WriterBuilder::new().delimiter(b';').from_path(dir.join(name))?;
    w.write_record(header)?;
    Ok(w)
}

impl CsvWriter {
    /// Create (or truncate) the three files in `dir` and write the headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            vehicles:  open(dir, VEHICLE_FILE, &["Time", "VehicleID", "Speed_ms", "X_Coord", "Y_Coord"])?,
            lights:    open(dir, LIGHT_FILE, &["Time", "LightID", "ProgramID", "CurrentPhase", "Duration"])?,
            summaries: open(
                dir,
                SUMMARY_FILE,
                &["Tick", "Time", "Arrived", "Removed", "Vehicles", "Lights", "Overrides", "Failures"],
            )?,
            finished:  false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_vehicles(&mut self, rows: &[VehicleRecord]) -> OutputResult<()> {
        for row in rows {
            self.vehicles.write_record(&[
                row.time.to_string(),
                row.vehicle_id.to_string(),
                row.speed.to_string(),
                row.x.to_string(),
                row.y.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_lights(&mut self, rows: &[LightRecord]) -> OutputResult<()> {
        for row in rows {
            self.lights.write_record(&[
                row.time.to_string(),
                row.light_id.clone(),
                row.program_id.clone(),
                row.phase.to_string(),
                row.duration.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.time.to_string(),
            row.arrived.to_string(),
            row.removed.to_string(),
            row.vehicles.to_string(),
            row.lights.to_string(),
            row.overrides.to_string(),
            row.failures.to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.vehicles.flush()?;
        self.lights.flush()?;
        self.summaries.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.flush()
    }
}
