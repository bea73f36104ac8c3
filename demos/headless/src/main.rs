//! headless — drive the traffic-control layer without a UI.
//!
//! Builds the in-memory demo network, imports its routes, lights, and
//! charging stations, injects a flow (and optionally a background stress
//! test), then ticks the coordinator while writing semicolon-delimited CSV
//! reports.
//!
//! ```text
//! headless --steps 600 --flow 20 --stress 50 --output ./output
//! RUST_LOG=debug headless --config control.toml
//! ```

mod network;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tc_control::{
    Commands, CoordinatorBuilder, LightRecord, StressTest, TelemetrySink, TickReport, VehicleRecord,
};
use tc_core::{ControlConfig, Rgba, RouteId, Tick};
use tc_entity::{Flow, MapGeometry};
use tc_output::{CsvWriter, OutputWriter, ReportSink};

use network::{build_demo_network, rush_hour};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "headless")]
#[command(about = "Run the traffic-control loop against the in-memory demo network")]
struct Cli {
    /// TOML configuration file.  Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Steps to run (overrides `total_steps`).
    #[arg(long)]
    steps: Option<u64>,

    /// RNG seed (overrides `seed`).
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the CSV reports.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Vehicles injected by the flow on route `west_east` at start-up.
    #[arg(long, default_value = "10")]
    flow: usize,

    /// Random vehicles added by a background stress test (0 disables it).
    #[arg(long, default_value = "0")]
    stress: usize,
}

impl Cli {
    fn load_config(&self) -> Result<ControlConfig> {
        let mut config = match &self.config {
            Some(path) => ControlConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ControlConfig::default(),
        };
        if let Some(steps) = self.steps {
            config.total_steps = steps;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

// ── Sink wrapper to count what was written ───────────────────────────────────

struct CountingSink<W: OutputWriter> {
    inner:     ReportSink<W>,
    vehicles:  usize,
    lights:    usize,
    arrived:   usize,
    overrides: usize,
    failures:  usize,
}

impl<W: OutputWriter> CountingSink<W> {
    fn new(inner: ReportSink<W>) -> Self {
        Self { inner, vehicles: 0, lights: 0, arrived: 0, overrides: 0, failures: 0 }
    }
}

impl<W: OutputWriter> TelemetrySink for CountingSink<W> {
    fn on_tick_start(&mut self, tick: Tick) {
        self.inner.on_tick_start(tick);
    }

    fn record_vehicle(&mut self, record: VehicleRecord) {
        self.vehicles += 1;
        self.inner.record_vehicle(record);
    }

    fn record_light(&mut self, record: LightRecord) {
        self.lights += 1;
        self.inner.record_light(record);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.arrived += report.removed;
        self.overrides += report.overrides.len();
        self.failures += report.failures.len();
        self.inner.on_tick_end(report);
    }

    fn flush(&mut self) {
        self.inner.flush();
    }

    fn close(&mut self, final_tick: Tick) {
        self.inner.close(final_tick);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    info!(steps = config.total_steps, seed = config.seed, "configuration loaded");

    // 1. Engine and static geometry.
    let engine = Arc::new(build_demo_network(config.step_length_secs));
    let geometry = MapGeometry::import(engine.as_ref())?;
    println!(
        "Network: {} lanes, {} routable edges, {} polygons, {:.0} × {:.0} m",
        geometry.lanes.len(),
        geometry.edges.len(),
        geometry.polygons.len(),
        geometry.bounds.width(),
        geometry.bounds.height(),
    );

    // 2. Coordinator (imports routes, lights, stations) and command surface.
    let mut coordinator = CoordinatorBuilder::new(Arc::clone(&engine), config.clone())
        .import_network()
        .build()?;
    let commands = Commands::with_edges(
        Arc::clone(&engine),
        Arc::clone(coordinator.registry()),
        geometry.edges.clone(),
        &config,
    );
    println!("Lights: {}", commands.light_aliases().join(", "));

    // 3. Start-up traffic.
    if cli.flow > 0 {
        let flow = Flow::new("demo_flow", RouteId::from("west_east"), config.default_vehicle_type.as_str(), cli.flow)
            .with_color(Rgba::BLUE);
        commands.trigger_flow(&flow)?;
    }
    let stress = if cli.stress > 0 {
        Some(StressTest::start(commands.clone(), cli.stress, config.stress_interval())?)
    } else {
        None
    };

    // 4. Tick loop.
    let mut sink = CountingSink::new(ReportSink::new(CsvWriter::new(&cli.output)?));
    let started = Instant::now();
    for step in 0..config.total_steps {
        if let Some((lane, halting)) = rush_hour(step) {
            engine.set_lane_halting(&lane, halting);
        }
        coordinator.tick(&mut sink)?;
    }
    sink.flush();
    sink.close(coordinator.current_tick());
    let elapsed = started.elapsed();

    let stress_summary = stress.map(|test| {
        test.stop();
        test.join()
    });
    if let Some(e) = sink.inner.take_error() {
        warn!(error = %e, "report output incomplete");
    }

    // 5. Summary.
    println!();
    println!("Ran {} in {:.2?}", coordinator.clock(), elapsed);
    println!(
        "Records: {} vehicle, {} light  |  arrivals: {}  |  overrides: {}  |  isolated failures: {}",
        sink.vehicles, sink.lights, sink.arrived, sink.overrides, sink.failures
    );
    if let Some(s) = stress_summary {
        println!("Stress test: {} spawned, {} failed", s.spawned, s.failed);
    }
    println!("Vehicles still active: {}", commands.vehicle_ids().len());
    println!("Reports written to {}", cli.output.display());
    Ok(())
}
