//! Placement Configuration
//!
//! Centralized tuning for the placement session, stacking, strokes and
//! staggered loading. `Default` carries the engine constants; hosts can
//! override any subset from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::error::Result;

/// Central configuration for the placement engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Frames a staggered set load is spread across
    pub frames_per_load: usize,
    /// Ray length used when a placed connector reconciles its neighbours (meters)
    pub connection_distance: f32,
    /// Upper bound on stacking iterations per frame
    pub stack_iteration_limit: usize,
    /// Seconds the rotate key must be held before continuous rotation starts
    pub rotation_delay: f32,
    /// Degrees of yaw per unit of horizontal pointer movement
    pub rotation_speed: f32,
    /// Continuous rotation snaps to this many degrees
    pub rotation_snap: f32,
    /// Yaw applied by a rotate tap (degrees)
    pub tap_rotation_step: f32,
    /// Scale factor per unit of handle drag in the selection state
    pub selection_scale_speed: f32,
    /// Screen pixels to pointer axis units (horizontal rotation, vertical lift)
    pub pointer_axis_scale: f32,
    /// Smallest scale a detail setting or scale handle may produce
    pub minimum_scale: f32,
    /// Height added to stroke sample points before connection rays are cast
    pub stroke_probe_height: f32,
    /// Steepest terrain slope (degrees) a stroke point may sit on
    pub stroke_max_slope: f32,
    /// Name given to sets created without one
    pub default_set_name: String,
    /// Message shown when admission fails for lack of funds
    pub insufficient_funds_message: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            frames_per_load: 30,
            connection_distance: 3.0,
            stack_iteration_limit: 64,
            rotation_delay: 0.2,
            rotation_speed: 20.0,
            rotation_snap: 15.0,
            tap_rotation_step: 90.0,
            selection_scale_speed: 2.0,
            pointer_axis_scale: 0.1,
            minimum_scale: 0.1,
            stroke_probe_height: 0.05,
            stroke_max_slope: 0.0,
            default_set_name: "Custom blueprint".to_string(),
            insufficient_funds_message: "You have insufficient funds".to_string(),
        }
    }
}

impl PlacementConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlacementConfig::default();
        assert_eq!(config.frames_per_load, 30);
        assert_eq!(config.connection_distance, 3.0);
        assert_eq!(config.rotation_delay, 0.2);
        assert_eq!(config.default_set_name, "Custom blueprint");
        assert_eq!(config.insufficient_funds_message, "You have insufficient funds");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PlacementConfig::from_json_str(r#"{"frames_per_load": 5, "rotation_snap": 45.0}"#)
            .expect("valid config");
        assert_eq!(config.frames_per_load, 5);
        assert_eq!(config.rotation_snap, 45.0);
        assert_eq!(config.stack_iteration_limit, 64);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(PlacementConfig::from_json_str("{ frames_per_load: }").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PlacementConfig::load("/nonexistent/placement.json").unwrap_err();
        assert!(matches!(err, crate::game::error::PlacementError::Io(_)));
    }
}
