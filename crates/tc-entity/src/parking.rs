//! Parking areas and charging stations.

use tc_core::StationId;
use tc_engine::{EngineResult, TrafficEngine};

/// A station imported once and refreshed every tick.  Never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingArea {
    id:        StationId,
    occupancy: u32,
}

impl ParkingArea {
    pub fn new(id: StationId) -> Self {
        Self { id, occupancy: 0 }
    }

    #[inline]
    pub fn id(&self) -> &StationId {
        &self.id
    }

    /// Vehicles parked or charging at the last refresh.
    #[inline]
    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupancy > 0
    }

    pub fn refresh<E: TrafficEngine + ?Sized>(&mut self, engine: &E) -> EngineResult<u32> {
        self.occupancy = engine.station_occupancy(&self.id)?;
        Ok(self.occupancy)
    }
}
