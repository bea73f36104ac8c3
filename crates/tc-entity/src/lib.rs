//! `tc-entity` — domain objects mirrored from the engine, and the registry
//! that owns them.
//!
//! Each entity holds the last state read from the engine and knows how to
//! refresh itself through a [`TrafficEngine`][tc_engine::TrafficEngine].
//! The [`EntityRegistry`] owns every live entity; callers reach them only by
//! id, so an entity removed from the registry simply stops being found.
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`vehicle`]  | `Vehicle`                                             |
//! | [`light`]    | `TrafficLight` (phase state, congestion signal)       |
//! | [`route`]    | `Route`                                               |
//! | [`parking`]  | `ParkingArea` (parking / charging stations)           |
//! | [`flow`]     | `Flow` batch injection                                |
//! | [`geometry`] | `MapGeometry`, `LaneShape`, `MapPolygon`              |
//! | [`registry`] | `Registry<K, T>`, `EntityRegistry`, `Shared<T>`       |
//! | [`error`]    | `EntityError`, `FlowError`                            |

pub mod error;
pub mod flow;
pub mod geometry;
pub mod light;
pub mod parking;
pub mod registry;
pub mod route;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use error::{EntityError, EntityResult, FlowError};
pub use flow::Flow;
pub use geometry::{LaneShape, MapGeometry, MapPolygon};
pub use light::TrafficLight;
pub use parking::ParkingArea;
pub use registry::{lock, EntityRegistry, Registry, Shared};
pub use route::Route;
pub use vehicle::Vehicle;
