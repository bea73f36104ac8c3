//! `tc-control` — the step coordinator and everything that drives it.
//!
//! # Tick loop
//!
//! ```text
//! for each tick:
//!   ① Advance    — engine step + sim time.  The only fatal failures.
//!   ② Arrivals   — dedup arrived ids, drop them from the registry.
//!   ③ Vehicles   — refresh + VehicleRecord per registered vehicle.
//!   ④ Lights     — refresh + LightRecord, then the congestion override:
//!                    savior phase already active → extend  (7 s)
//!                    otherwise                   → switch  (12 s)
//!   ⑤ Stations   — refresh occupancy.
//! ```
//!
//! Failures in ②–⑤ are isolated per entity and listed in the `TickReport`.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`coordinator`] | `StepCoordinator`                                     |
//! | [`builder`]     | `CoordinatorBuilder`                                  |
//! | [`congestion`]  | `OverridePolicy`                                      |
//! | [`sink`]        | `TelemetrySink`, `NoopSink`, `MemorySink`             |
//! | [`record`]      | `VehicleRecord`, `LightRecord`, `TickReport`, …       |
//! | [`commands`]    | `Commands`, `VehicleSpec`                             |
//! | [`import`]      | One-shot route / light / station import               |
//! | [`stress`]      | `StressTest` background injector                      |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `fx-hash` | FxHash for the per-tick arrival dedup set.               |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let engine = Arc::new(engine);
//! let mut coordinator = CoordinatorBuilder::new(Arc::clone(&engine), config.clone())
//!     .import_network()
//!     .build()?;
//! let commands = Commands::new(engine, Arc::clone(coordinator.registry()), &config)?;
//! commands.create_random_vehicle()?;
//! coordinator.run(&mut NoopSink)?;
//! ```

pub mod builder;
pub mod commands;
pub mod congestion;
pub mod coordinator;
pub mod error;
pub mod import;
pub mod record;
pub mod sink;
pub mod stress;


pub use builder::CoordinatorBuilder;
pub use commands::{Commands, VehicleSpec};
pub use congestion::OverridePolicy;
pub use coordinator::StepCoordinator;
pub use error::{ControlError, ControlResult};
pub use import::{import_all, import_charging_stations, import_routes, import_traffic_lights, ImportSummary};
pub use record::{
    EntityFailure, FailureKind, LightRecord, OverrideAction, OverrideEvent, TickReport, VehicleRecord,
};
pub use sink::{MemorySink, NoopSink, TelemetrySink};
pub use stress::{StressSummary, StressTest};
