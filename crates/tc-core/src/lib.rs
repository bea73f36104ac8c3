//! `tc-core` — foundational types for the traffic-control workspace.
//!
//! This crate is a dependency of every other `tc-*` crate.  It has no `tc-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`ids`]       | `VehicleId`, `RouteId`, `LightId`, `EdgeId`, `LaneId`, …  |
//! | [`geo`]       | `Position`, `NetworkBounds`                               |
//! | [`color`]     | `Rgba`                                                    |
//! | [`time`]      | `Tick`, `SimClock`                                        |
//! | [`rng`]       | `SimRng`                                                  |
//! | [`config`]    | `ControlConfig` (TOML)                                    |
//! | [`error`]     | `CoreError`, `CoreResult`                                 |

pub mod color;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use color::Rgba;
pub use config::ControlConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{NetworkBounds, Position};
pub use ids::{EdgeId, LaneId, LightId, PolygonId, RouteId, StationId, VehicleId};
pub use rng::SimRng;
pub use time::{SimClock, Tick};
