//! Static map geometry, fetched once and read-only afterwards.

use tc_core::{EdgeId, LaneId, NetworkBounds, PolygonId, Position, Rgba};
use tc_engine::{EngineResult, EntityKind, TrafficEngine};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct LaneShape {
    pub id:     LaneId,
    pub points: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPolygon {
    pub id:     PolygonId,
    pub shape:  Vec<Position>,
    pub color:  Rgba,
    pub filled: bool,
}

/// Snapshot of the road network and decoration polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapGeometry {
    pub bounds:   NetworkBounds,
    pub lanes:    Vec<LaneShape>,
    pub polygons: Vec<MapPolygon>,
    /// Routable (non-internal) edges, in engine listing order.
    pub edges:    Vec<EdgeId>,
}

impl MapGeometry {
    /// Fetch bounds, lane shapes, polygons, and routable edges.
    pub fn import<E: TrafficEngine + ?Sized>(engine: &E) -> EngineResult<Self> {
        let geometry = Self {
            bounds:   engine.network_bounds()?,
            lanes:    import_lanes(engine)?,
            polygons: import_polygons(engine)?,
            edges:    load_edges(engine)?,
        };
        info!(
            lanes = geometry.lanes.len(),
            polygons = geometry.polygons.len(),
            edges = geometry.edges.len(),
            "map geometry imported"
        );
        Ok(geometry)
    }
}

pub fn import_lanes<E: TrafficEngine + ?Sized>(engine: &E) -> EngineResult<Vec<LaneShape>> {
    engine
        .list_ids(EntityKind::Lane)?
        .into_iter()
        .map(|id| {
            let id = LaneId::from(id);
            let points = engine.lane_shape(&id)?;
            Ok(LaneShape { id, points })
        })
        .collect()
}

pub fn import_polygons<E: TrafficEngine + ?Sized>(engine: &E) -> EngineResult<Vec<MapPolygon>> {
    engine
        .list_ids(EntityKind::Polygon)?
        .into_iter()
        .map(|id| {
            let id = PolygonId::from(id);
            let p = engine.polygon(&id)?;
            Ok(MapPolygon { id, shape: p.shape, color: p.color, filled: p.filled })
        })
        .collect()
}

/// All edges a vehicle can start or end on (junction-internal edges skipped).
pub fn load_edges<E: TrafficEngine + ?Sized>(engine: &E) -> EngineResult<Vec<EdgeId>> {
    Ok(engine
        .list_ids(EntityKind::Edge)?
        .into_iter()
        .map(EdgeId::from)
        .filter(|e| !e.is_internal())
        .collect())
}
