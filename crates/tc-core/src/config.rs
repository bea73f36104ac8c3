//! Control-layer configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! step_length_secs     = 1.0
//! total_steps          = 3600
//! seed                 = 42
//! congestion_threshold = 3
//! extend_secs          = 7.0
//! switch_secs          = 12.0
//! route_retry_limit    = 10
//! stress_interval_ms   = 200
//! default_vehicle_type = "DEFAULT_VEHTYPE"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Simulated seconds per engine step.
    pub step_length_secs: f64,

    /// Steps executed by `StepCoordinator::run`.
    pub total_steps: u64,

    /// Seed for random route and colour selection.
    pub seed: u64,

    /// A lane is congested when its halting-vehicle count is strictly above
    /// this value.
    pub congestion_threshold: u32,

    /// Duration set when the congested lane is already served by the current
    /// phase.
    pub extend_secs: f64,

    /// Duration set after forcing a switch to the serving phase.
    pub switch_secs: f64,

    /// Attempts made by random route discovery before giving up.
    pub route_retry_limit: u32,

    /// Pause between vehicles injected by a stress test.
    pub stress_interval_ms: u64,

    /// Vehicle type used for generated vehicles.
    pub default_vehicle_type: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            step_length_secs:     1.0,
            total_steps:          3_600,
            seed:                 42,
            congestion_threshold: 3,
            extend_secs:          7.0,
            switch_secs:          12.0,
            route_retry_limit:    10,
            stress_interval_ms:   200,
            default_vehicle_type: "DEFAULT_VEHTYPE".to_owned(),
        }
    }
}

impl ControlConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(src: &str) -> CoreResult<Self> {
        let config: ControlConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(self.step_length_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "step_length_secs must be positive, got {}",
                self.step_length_secs
            )));
        }
        if !(self.extend_secs > 0.0) || !(self.switch_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "override durations must be positive, got extend={} switch={}",
                self.extend_secs, self.switch_secs
            )));
        }
        if self.route_retry_limit == 0 {
            return Err(CoreError::Config("route_retry_limit must be at least 1".into()));
        }
        if self.default_vehicle_type.is_empty() {
            return Err(CoreError::Config("default_vehicle_type must not be empty".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn stress_interval(&self) -> Duration {
        Duration::from_millis(self.stress_interval_ms)
    }
}
