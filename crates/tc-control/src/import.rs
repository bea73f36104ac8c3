//! One-shot import of engine-side entities into the registry.
//!
//! Each routine lists one object class from the engine, materialises an
//! entity per id, and registers the lot.  Any engine failure aborts the
//! import and is returned.

use tc_core::{LightId, RouteId, StationId};
use tc_engine::{EntityKind, TrafficEngine};
use tc_entity::{EntityRegistry, ParkingArea, Route, TrafficLight};
use tracing::info;

use crate::ControlResult;

/// Counts of entities registered by [`import_all`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub routes:   usize,
    pub lights:   usize,
    pub stations: usize,
}

pub fn import_routes<E: TrafficEngine + ?Sized>(engine: &E, registry: &EntityRegistry) -> ControlResult<usize> {
    let routes = engine
        .list_ids(EntityKind::Route)?
        .into_iter()
        .map(|id| Route::fetch(engine, RouteId::from(id)))
        .collect::<Result<Vec<_>, _>>()?;
    let n = routes.len();
    registry.routes.put_all(routes.into_iter().map(|r| (r.id().clone(), r)));
    info!(routes = n, "routes imported");
    Ok(n)
}

/// Register every light under a sequential alias `tl_0, tl_1, ...` in engine
/// listing order.
pub fn import_traffic_lights<E: TrafficEngine + ?Sized>(engine: &E, registry: &EntityRegistry) -> ControlResult<usize> {
    let lights = engine
        .list_ids(EntityKind::TrafficLight)?
        .into_iter()
        .enumerate()
        .map(|(i, id)| TrafficLight::import(engine, LightId::from(id), format!("tl_{i}")))
        .collect::<Result<Vec<_>, _>>()?;
    let n = lights.len();
    registry.lights.put_all(lights.into_iter().map(|l| (l.alias().to_owned(), l)));
    info!(lights = n, "traffic lights imported");
    Ok(n)
}

pub fn import_charging_stations<E: TrafficEngine + ?Sized>(
    engine:   &E,
    registry: &EntityRegistry,
) -> ControlResult<usize> {
    let ids = engine.list_ids(EntityKind::ChargingStation)?;
    let n = ids.len();
    registry
        .stations
        .put_all(ids.into_iter().map(|id| {
            let id = StationId::from(id);
            (id.clone(), ParkingArea::new(id))
        }));
    info!(stations = n, "charging stations imported");
    Ok(n)
}

/// Routes, traffic lights, and charging stations, in that order.
pub fn import_all<E: TrafficEngine + ?Sized>(engine: &E, registry: &EntityRegistry) -> ControlResult<ImportSummary> {
    Ok(ImportSummary {
        routes:   import_routes(engine, registry)?,
        lights:   import_traffic_lights(engine, registry)?,
        stations: import_charging_stations(engine, registry)?,
    })
}
