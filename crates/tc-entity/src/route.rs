//! The `Route` entity.

use tc_core::{EdgeId, RouteId};
use tc_engine::{EngineResult, TrafficEngine};

/// A named, ordered edge sequence registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    id:    RouteId,
    edges: Vec<EdgeId>,
}

impl Route {
    pub fn new(id: RouteId, edges: Vec<EdgeId>) -> Self {
        Self { id, edges }
    }

    /// Read an existing route's edges from the engine.
    pub fn fetch<E: TrafficEngine + ?Sized>(engine: &E, id: RouteId) -> EngineResult<Self> {
        let edges = engine.route_edges(&id)?;
        Ok(Self { id, edges })
    }

    #[inline]
    pub fn id(&self) -> &RouteId {
        &self.id
    }

    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn origin(&self) -> Option<&EdgeId> {
        self.edges.first()
    }

    pub fn destination(&self) -> Option<&EdgeId> {
        self.edges.last()
    }
}
