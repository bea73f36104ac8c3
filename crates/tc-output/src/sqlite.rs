//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `report.db` file in the configured directory with three
//! tables: `vehicle_report`, `trafficlight_report`, and `tick_summaries`.

use std::path::Path;

use rusqlite::{params, Connection, Statement};
use tc_control::{LightRecord, VehicleRecord};

use crate::writer::OutputWriter;
use crate::{OutputResult, TickSummaryRow};

pub const DB_FILE: &str = "report.db";

/// Writes reports to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `report.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DB_FILE))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS vehicle_report (
                 time       REAL    NOT NULL,
                 vehicle_id TEXT    NOT NULL,
                 speed_ms   REAL    NOT NULL,
                 x          REAL    NOT NULL,
                 y          REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS trafficlight_report (
                 time       REAL    NOT NULL,
                 light_id   TEXT    NOT NULL,
                 program_id TEXT    NOT NULL,
                 phase      INTEGER NOT NULL,
                 duration   REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick      INTEGER PRIMARY KEY,
                 time      REAL    NOT NULL,
                 arrived   INTEGER NOT NULL,
                 removed   INTEGER NOT NULL,
                 vehicles  INTEGER NOT NULL,
                 lights    INTEGER NOT NULL,
                 overrides INTEGER NOT NULL,
                 failures  INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl SqliteWriter {
    /// Insert `rows` inside one transaction.  Empty batches touch nothing.
    fn insert_batch<T>(
        &self,
        sql:      &str,
        rows:     &[T],
        mut bind: impl FnMut(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for row in rows {
                bind(&mut *stmt, row)?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl OutputWriter for SqliteWriter {
    fn write_vehicles(&mut self, rows: &[VehicleRecord]) -> OutputResult<()> {
        self.insert_batch(
            "INSERT INTO vehicle_report (time, vehicle_id, speed_ms, x, y) VALUES (?1, ?2, ?3, ?4, ?5)",
            rows,
            |stmt, r| stmt.execute(params![r.time, r.vehicle_id.as_str(), r.speed, r.x, r.y]),
        )
    }

    fn write_lights(&mut self, rows: &[LightRecord]) -> OutputResult<()> {
        self.insert_batch(
            "INSERT INTO trafficlight_report (time, light_id, program_id, phase, duration) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rows,
            |stmt, r| stmt.execute(params![r.time, r.light_id, r.program_id, r.phase as i64, r.duration]),
        )
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, time, arrived, removed, vehicles, lights, overrides, failures) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.tick as i64,
                row.time,
                row.arrived as i64,
                row.removed as i64,
                row.vehicles as i64,
                row.lights as i64,
                row.overrides as i64,
                row.failures as i64,
            ],
        )?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
