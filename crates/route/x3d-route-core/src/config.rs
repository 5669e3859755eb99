//! Core configuration for x3d-route-core.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::semantics::ActionTable;

/// Configuration for scene building and route semantics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame rate used to convert cycle intervals and key times into frames.
    pub frames_per_second: f32,

    /// Destination-field rules deciding what a routed event does.
    pub actions: ActionTable,

    /// Start time sensors that no sensor ROUTE controls as soon as the scene is built.
    pub autostart_unrouted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_per_second: 60.0,
            actions: ActionTable::default(),
            autostart_unrouted: true,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, RouteError> {
        let cfg: Config =
            serde_json::from_str(json).map_err(|e| RouteError::Config(e.to_string()))?;
        if !(cfg.frames_per_second.is_finite() && cfg.frames_per_second > 0.0) {
            return Err(RouteError::Config(format!(
                "frames_per_second must be > 0, got {}",
                cfg.frames_per_second
            )));
        }
        Ok(cfg)
    }
}
