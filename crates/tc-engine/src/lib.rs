//! `tc-engine` — the boundary to the external microscopic traffic engine.
//!
//! The control layer never talks to a concrete simulator.  It calls the
//! [`TrafficEngine`] trait, so a TraCI-style socket client, an FFI binding, or
//! the bundled [`InMemoryEngine`] can sit behind it unchanged.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`engine`] | `TrafficEngine` trait                                         |
//! | [`types`]  | `EntityKind`, `VehicleTelemetry`, `LightState`, `LightProgram`, `Phase`, `PolygonShape` |
//! | [`memory`] | `InMemoryEngine` + builder (tests, demos)                     |
//! | [`error`]  | `EngineError`, `EngineResult<T>`                              |

pub mod engine;
pub mod error;
pub mod memory;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::TrafficEngine;
pub use error::{EngineError, EngineResult};
pub use memory::{InMemoryEngine, InMemoryEngineBuilder};
pub use types::{EntityKind, LightProgram, LightState, Phase, PolygonShape, VehicleTelemetry};
