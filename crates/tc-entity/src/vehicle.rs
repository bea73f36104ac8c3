//! The `Vehicle` entity.

use tc_core::{Position, Rgba, RouteId, VehicleId};
use tc_engine::{EngineResult, TrafficEngine, VehicleTelemetry};

/// A vehicle mirrored from the engine.
///
/// Identity, route, and type are fixed at creation.  Speed and position are
/// the last values read by [`refresh`][Self::refresh]; a failed refresh
/// leaves them untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id:           VehicleId,
    route:        RouteId,
    vehicle_type: String,
    speed:        f64,
    position:     Position,
    color:        Option<Rgba>,
}

impl Vehicle {
    /// Local record only.  Use [`spawn`][Self::spawn] to also insert the
    /// vehicle into the engine.
    pub fn new(id: VehicleId, route: RouteId, vehicle_type: impl Into<String>) -> Self {
        Self {
            id,
            route,
            vehicle_type: vehicle_type.into(),
            speed:        0.0,
            position:     Position::default(),
            color:        None,
        }
    }

    /// Insert the vehicle into the engine on `route`.
    ///
    /// `Ok` means the engine holds the vehicle.  Colour it afterwards with
    /// [`set_color`][Self::set_color]; a refused colour must not lose track of
    /// a vehicle the engine already accepted.
    pub fn spawn<E: TrafficEngine + ?Sized>(
        engine:       &E,
        id:           VehicleId,
        route:        RouteId,
        vehicle_type: &str,
    ) -> EngineResult<Self> {
        engine.add_vehicle(&id, &route, vehicle_type)?;
        Ok(Self::new(id, route, vehicle_type))
    }

    #[inline]
    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    #[inline]
    pub fn route(&self) -> &RouteId {
        &self.route
    }

    #[inline]
    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    /// Last known speed, m/s.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn color(&self) -> Option<Rgba> {
        self.color
    }

    /// Pull fresh speed and position from the engine.
    pub fn refresh<E: TrafficEngine + ?Sized>(&mut self, engine: &E) -> EngineResult<VehicleTelemetry> {
        let telemetry = engine.vehicle_telemetry(&self.id)?;
        self.speed = telemetry.speed;
        self.position = telemetry.position;
        Ok(telemetry)
    }

    pub fn set_speed<E: TrafficEngine + ?Sized>(&mut self, engine: &E, speed: f64) -> EngineResult<()> {
        engine.set_vehicle_speed(&self.id, speed)?;
        self.speed = speed;
        Ok(())
    }

    pub fn set_color<E: TrafficEngine + ?Sized>(&mut self, engine: &E, color: Rgba) -> EngineResult<()> {
        engine.set_vehicle_color(&self.id, color)?;
        self.color = Some(color);
        Ok(())
    }
}
