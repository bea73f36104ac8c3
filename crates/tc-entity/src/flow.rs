//! One-shot batch injection of vehicles onto a route.

use tc_core::{Rgba, RouteId, VehicleId};
use tc_engine::TrafficEngine;
use tracing::debug;

use crate::{FlowError, Vehicle};

/// Describes a batch of identical vehicles.  Not retained after injection.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub id:           String,
    pub route:        RouteId,
    pub vehicle_type: String,
    pub batch_size:   usize,
    pub color:        Option<Rgba>,
}

impl Flow {
    pub fn new(id: impl Into<String>, route: RouteId, vehicle_type: impl Into<String>, batch_size: usize) -> Self {
        Self {
            id: id.into(),
            route,
            vehicle_type: vehicle_type.into(),
            batch_size,
            color: None,
        }
    }

    /// Colour every vehicle of the batch.
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    /// Id of the `index`-th vehicle of this flow.
    pub fn vehicle_id(&self, index: usize) -> VehicleId {
        VehicleId::new(format!("{}_{index}", self.id))
    }

    /// Spawn `batch_size` vehicles in the engine, colouring each one.
    ///
    /// The route must already exist.  On the first engine refusal the batch
    /// stops.  Every vehicle the engine accepted is returned, inside the error
    /// if need be, including one whose colour was refused.
    pub fn inject<E: TrafficEngine + ?Sized>(&self, engine: &E) -> Result<Vec<Vehicle>, FlowError> {
        let mut created = Vec::with_capacity(self.batch_size);
        for index in 0..self.batch_size {
            let id = self.vehicle_id(index);
            let mut vehicle = match Vehicle::spawn(engine, id.clone(), self.route.clone(), &self.vehicle_type) {
                Ok(vehicle) => vehicle,
                Err(source) => {
                    return Err(FlowError { flow: self.id.clone(), failed: id, created, source });
                }
            };
            let colored = match self.color {
                Some(color) => vehicle.set_color(engine, color),
                None => Ok(()),
            };
            created.push(vehicle);
            if let Err(source) = colored {
                return Err(FlowError { flow: self.id.clone(), failed: id, created, source });
            }
        }
        debug!(flow = %self.id, route = %self.route, count = created.len(), "flow injected");
        Ok(created)
    }
}
