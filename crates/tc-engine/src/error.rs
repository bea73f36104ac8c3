//! Engine-boundary error type.

use thiserror::Error;

use crate::EntityKind;

/// Errors reported by a [`TrafficEngine`][crate::TrafficEngine].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The id is unknown to the engine (never existed, or already left).
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// The engine could not advance the simulation clock.
    #[error("simulation step failed: {0}")]
    Step(String),

    /// The engine understood the command but refused it.
    #[error("{op} rejected: {reason}")]
    Rejected { op: &'static str, reason: String },

    #[error("engine connection error: {0}")]
    Connection(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }

    pub fn rejected(op: &'static str, reason: impl Into<String>) -> Self {
        EngineError::Rejected { op, reason: reason.into() }
    }

    /// `true` for errors meaning "this id is stale or unknown".
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
