//! Integration tests for tc-output.

#[cfg(test)]
mod fixtures {
    use tc_control::{LightRecord, VehicleRecord};
    use tc_core::VehicleId;

    pub fn vehicle(id: &str, time: f64) -> VehicleRecord {
        VehicleRecord { time, vehicle_id: VehicleId::from(id), speed: 13.5, x: 10.0, y: -2.5 }
    }

    pub fn light(alias: &str, time: f64) -> LightRecord {
        LightRecord {
            time,
            light_id:   alias.to_owned(),
            program_id: "0".to_owned(),
            phase:      2,
            duration:   7.0,
        }
    }

    pub fn read(path: &std::path::Path) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_path(path).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::fixtures::{light, read, vehicle};
    use crate::csv::{CsvWriter, LIGHT_FILE, SUMMARY_FILE, VEHICLE_FILE};
    use crate::row::TickSummaryRow;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn csv_files_created_in_missing_dir() {
        let dir = tmp();
        let out = dir.path().join("nested/out");
        let _w = CsvWriter::new(&out).unwrap();
        assert!(out.join(VEHICLE_FILE).exists());
        assert!(out.join(LIGHT_FILE).exists());
        assert!(out.join(SUMMARY_FILE).exists());
    }

    #[test]
    fn csv_headers_are_semicolon_delimited() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let raw = std::fs::read_to_string(dir.path().join(VEHICLE_FILE)).unwrap();
        assert_eq!(raw.lines().next(), Some("Time;VehicleID;Speed_ms;X_Coord;Y_Coord"));
        let raw = std::fs::read_to_string(dir.path().join(LIGHT_FILE)).unwrap();
        assert_eq!(raw.lines().next(), Some("Time;LightID;ProgramID;CurrentPhase;Duration"));
    }

    #[test]
    fn vehicle_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_vehicles(&[vehicle("a", 1.0), vehicle("b", 1.0)]).unwrap();
        w.finish().unwrap();

        let (_, rows) = read(&dir.path().join(VEHICLE_FILE));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "a");
        assert_eq!(&rows[0][2], "13.5");
        assert_eq!(&rows[0][4], "-2.5");
        assert_eq!(&rows[1][1], "b");
    }

    #[test]
    fn light_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_lights(&[light("tl_0", 3.0)]).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir.path().join(LIGHT_FILE));
        assert_eq!(headers, ["Time", "LightID", "ProgramID", "CurrentPhase", "Duration"]);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][1], "tl_0");
        assert_eq!(&rows[0][3], "2");
        assert_eq!(&rows[0][4], "7");
    }

    #[test]
    fn tick_summary_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let row = TickSummaryRow {
            tick: 4, time: 5.0, arrived: 2, removed: 1, vehicles: 9, lights: 3, overrides: 1, failures: 0,
        };
        w.write_tick_summary(&row).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir.path().join(SUMMARY_FILE));
        assert_eq!(headers.len(), 8);
        assert_eq!(&rows[0][0], "4");
        assert_eq!(&rows[0][4], "9");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod sink_tests {
    use std::sync::Arc;

    use tc_control::{CoordinatorBuilder, LightRecord, TelemetrySink, TickReport, VehicleRecord, VehicleSpec};
    use tc_core::{ControlConfig, Tick, VehicleId};
    use tc_engine::InMemoryEngine;

    use super::fixtures::{read, vehicle};
    use crate::csv::{CsvWriter, LIGHT_FILE, SUMMARY_FILE, VEHICLE_FILE};
    use crate::{OutputError, OutputResult, OutputWriter, ReportSink, TickSummaryRow};

    /// Counts batches and fails every write after the first `ok` calls.
    #[derive(Default)]
    struct FlakyWriter {
        ok:        usize,
        calls:     usize,
        vehicles:  Vec<usize>,
        finished:  bool,
    }

    impl FlakyWriter {
        fn step(&mut self) -> OutputResult<()> {
            self.calls += 1;
            if self.calls > self.ok {
                Err(OutputError::Io(std::io::Error::other(format!("write {} failed", self.calls))))
            } else {
                Ok(())
            }
        }
    }

    impl OutputWriter for FlakyWriter {
        fn write_vehicles(&mut self, rows: &[VehicleRecord]) -> OutputResult<()> {
            self.vehicles.push(rows.len());
            self.step()
        }
        fn write_lights(&mut self, _rows: &[LightRecord]) -> OutputResult<()> {
            self.step()
        }
        fn write_tick_summary(&mut self, _row: &TickSummaryRow) -> OutputResult<()> {
            self.step()
        }
        fn flush(&mut self) -> OutputResult<()> {
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn records_are_batched_per_tick() {
        let mut sink = ReportSink::new(FlakyWriter { ok: usize::MAX, ..FlakyWriter::default() });
        sink.on_tick_start(Tick(0));
        sink.record_vehicle(vehicle("a", 1.0));
        sink.record_vehicle(vehicle("b", 1.0));
        sink.on_tick_end(&TickReport::default());
        sink.on_tick_start(Tick(1));
        sink.record_vehicle(vehicle("a", 2.0));
        sink.on_tick_end(&TickReport::default());
        sink.close(Tick(2));

        assert!(sink.take_error().is_none());
        let writer = sink.into_writer();
        assert_eq!(writer.vehicles, vec![2, 1]);
        assert!(writer.finished);
    }

    #[test]
    fn first_error_is_kept() {
        let mut sink = ReportSink::new(FlakyWriter { ok: 1, ..FlakyWriter::default() });
        sink.on_tick_start(Tick(0));
        sink.on_tick_end(&TickReport::default());
        sink.on_tick_start(Tick(1));
        sink.on_tick_end(&TickReport::default());

        let err = sink.take_error().unwrap();
        assert!(err.to_string().contains("write 2 failed"));
        assert!(sink.take_error().is_none());
        assert_eq!(sink.into_writer().calls, 6);
    }

    #[test]
    fn coordinator_run_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(
            InMemoryEngine::builder()
                .junction("A", 0.0, 0.0)
                .junction("B", 1000.0, 0.0)
                .edge("AB", "A", "B", 1)
                .route("r0", &["AB"])
                .light("J", &["AB_0"], &[(5.0, "G"), (5.0, "r")])
                .build(),
        );
        let config = ControlConfig { total_steps: 3, ..ControlConfig::default() };
        let mut coordinator = CoordinatorBuilder::new(Arc::clone(&engine), config.clone())
            .import_network()
            .build()
            .unwrap();
        let commands = tc_control::Commands::new(engine, Arc::clone(coordinator.registry()), &config).unwrap();
        commands.add_vehicle(VehicleSpec::new("v0", "r0", "car")).unwrap();
        commands.add_vehicle(VehicleSpec::new("v1", "r0", "car")).unwrap();

        let mut sink = ReportSink::new(CsvWriter::new(dir.path()).unwrap());
        coordinator.run(&mut sink).unwrap();
        assert!(sink.take_error().is_none());

        let (_, vehicles) = read(&dir.path().join(VEHICLE_FILE));
        assert_eq!(vehicles.len(), 6);
        assert_eq!(&vehicles[0][0], "1");
        assert_eq!(&vehicles[0][1], VehicleId::from("v0").as_str());
        let (_, lights) = read(&dir.path().join(LIGHT_FILE));
        assert_eq!(lights.len(), 3);
        assert!(lights.iter().all(|r| &r[1] == "tl_0"));
        let (_, summaries) = read(&dir.path().join(SUMMARY_FILE));
        assert_eq!(summaries.len(), 3);
        assert_eq!(&summaries[2][0], "2");
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;
    use tempfile::TempDir;

    use super::fixtures::{light, vehicle};
    use crate::sqlite::{SqliteWriter, DB_FILE};
    use crate::{OutputWriter, TickSummaryRow};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn tables_populated() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_vehicles(&[vehicle("a", 1.0), vehicle("b", 1.0)]).unwrap();
        w.write_lights(&[light("tl_0", 1.0)]).unwrap();
        w.write_tick_summary(&TickSummaryRow {
            tick: 0, time: 1.0, arrived: 0, removed: 0, vehicles: 2, lights: 1, overrides: 0, failures: 0,
        })
        .unwrap();
        w.finish().unwrap();

        let conn = Connection::open(dir.path().join(DB_FILE)).unwrap();
        assert_eq!(count(&conn, "vehicle_report"), 2);
        assert_eq!(count(&conn, "trafficlight_report"), 1);
        assert_eq!(count(&conn, "tick_summaries"), 1);
        let id: String = conn
            .query_row("SELECT light_id FROM trafficlight_report", [], |r| r.get(0))
            .unwrap();
        assert_eq!(id, "tl_0");
    }

    #[test]
    fn empty_batches_are_skipped() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_vehicles(&[]).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        let conn = Connection::open(dir.path().join(DB_FILE)).unwrap();
        assert_eq!(count(&conn, "vehicle_report"), 0);
    }
}
