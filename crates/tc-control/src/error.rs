use tc_core::{CoreError, EdgeId, RouteId, VehicleId};
use tc_engine::EngineError;
use tc_entity::{EntityError, FlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// The engine could not advance.  The simulation is unusable.
    #[error("simulation step failed: {0}")]
    Step(#[source] EngineError),

    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("traffic light {0} not found")]
    LightNotFound(String),

    /// The engine refused an explicit command.
    #[error("{op} on {id} failed: {source}")]
    Command {
        op:     &'static str,
        id:     String,
        #[source]
        source: EngineError,
    },

    /// The engine found no path between two edges.
    #[error("no route from {from} to {to}")]
    NoRoute { from: EdgeId, to: EdgeId },

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ControlError {
    pub(crate) fn command(op: &'static str, id: impl Into<String>, source: EngineError) -> Self {
        ControlError::Command { op, id: id.into(), source }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
