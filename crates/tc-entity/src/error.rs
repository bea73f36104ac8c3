use tc_core::VehicleId;
use tc_engine::EngineError;
use thiserror::Error;

use crate::Vehicle;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The light's program has no phase of the requested class.
    #[error("light {light} has no {class} phase")]
    NoPhase { light: String, class: &'static str },
}

pub type EntityResult<T> = Result<T, EntityError>;

/// A flow batch stopped part-way because the engine refused a vehicle or
/// its colour.
///
/// Every vehicle in `created` exists in the engine, so the caller must
/// register all of them.  When only the colour was refused, `failed` is the
/// last entry of `created`.
#[derive(Debug, Error)]
#[error("flow {flow} stopped at vehicle {failed} after {} created: {source}", .created.len())]
pub struct FlowError {
    pub flow:    String,
    pub failed:  VehicleId,
    pub created: Vec<Vehicle>,
    #[source]
    pub source:  EngineError,
}
