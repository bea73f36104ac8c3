//! Congestion-responsive signal override.
//!
//! Greedy and local to one light: find the controlled lane with the longest
//! queue, find the first phase that gives it green, then either give that
//! phase more time (already active) or jump to it with a longer duration.
//! No coordination across intersections.

use tc_core::ControlConfig;
use tc_engine::{EngineResult, TrafficEngine};
use tc_entity::TrafficLight;

use crate::{OverrideAction, OverrideEvent};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OverridePolicy {
    /// Halting vehicles strictly above this count make a lane congested.
    pub threshold:   u32,
    /// Duration given to the current phase when it already serves the lane.
    pub extend_secs: f64,
    /// Duration given to the serving phase after a forced switch.
    pub switch_secs: f64,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self { threshold: 3, extend_secs: 7.0, switch_secs: 12.0 }
    }
}

impl OverridePolicy {
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            threshold:   config.congestion_threshold,
            extend_secs: config.extend_secs,
            switch_secs: config.switch_secs,
        }
    }

    /// Run the heuristic on a freshly refreshed light.
    ///
    /// `Ok(None)` when no lane is congested or no phase serves it.
    pub fn apply<E: TrafficEngine + ?Sized>(
        &self,
        light:  &mut TrafficLight,
        engine: &E,
    ) -> EngineResult<Option<OverrideEvent>> {
        let Some(lane) = light.most_congested_lane(engine, self.threshold)? else {
            return Ok(None);
        };
        let Some(savior) = light.green_phase_for_lane(&lane) else {
            return Ok(None);
        };

        let (action, duration) = if light.phase_index() == savior {
            light.set_phase_duration(engine, self.extend_secs)?;
            (OverrideAction::Extended, self.extend_secs)
        } else {
            light.set_phase(engine, savior)?;
            light.set_phase_duration(engine, self.switch_secs)?;
            (OverrideAction::Switched, self.switch_secs)
        };

        Ok(Some(OverrideEvent {
            light: light.alias().to_owned(),
            lane,
            phase: savior,
            duration,
            action,
        }))
    }
}
