//! Client Configuration
//!
//! Every tunable of the client core, grouped by the component that reads it.
//! All sections deserialize from JSON with per-field defaults, so a config
//! file only has to name the values it changes.

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::core::Vec2;
use crate::error::ConfigError;

/// Gesture recognition tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Drag distance (canvas px) that maps to a full-magnitude joystick.
    pub max_joystick_range: f32,
    /// Movement (canvas px) tolerated before a press becomes a drag.
    pub press_radius: f32,
    /// Hold time before LongPress fires.
    pub long_press_delay_ms: u64,
    /// Presses released before this count as QuickPress.
    pub quick_press_threshold_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_joystick_range: 100.0,
            press_radius: 10.0,
            long_press_delay_ms: 500,
            quick_press_threshold_ms: 200,
        }
    }
}

/// Local motion tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Rate (1/s) at which smoothed input and impulse approach their targets.
    pub input_responsiveness: f32,
    /// Local player speed at full joystick (px/s).
    pub local_speed: f32,
    /// Upper bound on a single tick's elapsed time (s).
    pub max_delta_time_seconds: f32,
    /// Impulse magnitude applied by a LongPress away from the player (px/s).
    pub impulse_force: f32,
    /// Radius (px) used for "is this me" and closest-entity gesture lookups.
    pub interact_range: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            input_responsiveness: 3.0,
            local_speed: 200.0,
            max_delta_time_seconds: 0.1,
            impulse_force: 800.0,
            interact_range: 30.0,
        }
    }
}

/// Camera tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Rate (1/s) at which the camera catches up with the local player.
    pub camera_follow_speed: f32,
    /// Canvas width in canvas px.
    pub viewport_width: f32,
    /// Canvas height in canvas px.
    pub viewport_height: f32,
}

impl CameraConfig {
    /// Viewport size as a vector.
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width, self.viewport_height)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_follow_speed: 3.0,
            viewport_width: 666.0,
            viewport_height: 666.0,
        }
    }
}

/// Network sync tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Minimum spacing between publishes.
    pub publish_interval_ms: u64,
    /// Nominal time over which a remote entity converges to a new position.
    pub remote_sync_window_seconds: f32,
    /// Realtime channel topic.
    pub channel_name: String,
    /// Broadcast event name carrying position updates.
    pub move_event: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: 200,
            remote_sync_window_seconds: 0.2,
            channel_name: "user_tracking".to_string(),
            move_event: "user_move".to_string(),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gesture recognition.
    pub gesture: GestureConfig,
    /// Local motion.
    pub motion: MotionConfig,
    /// Camera follow.
    pub camera: CameraConfig,
    /// Network sync.
    pub network: NetworkConfig,
}

impl ClientConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject tunables that would break the controllers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason: "must be a positive number" })
            }
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason: "must be non-negative" })
            }
        }

        positive("max_joystick_range", self.gesture.max_joystick_range)?;
        non_negative("press_radius", self.gesture.press_radius)?;
        non_negative("input_responsiveness", self.motion.input_responsiveness)?;
        non_negative("local_speed", self.motion.local_speed)?;
        positive("max_delta_time_seconds", self.motion.max_delta_time_seconds)?;
        non_negative("impulse_force", self.motion.impulse_force)?;
        non_negative("interact_range", self.motion.interact_range)?;
        non_negative("camera_follow_speed", self.camera.camera_follow_speed)?;
        positive("viewport_width", self.camera.viewport_width)?;
        positive("viewport_height", self.camera.viewport_height)?;
        positive("remote_sync_window_seconds", self.network.remote_sync_window_seconds)?;

        if self.network.move_event.is_empty() {
            return Err(ConfigError::Invalid { field: "move_event", reason: "must not be empty" });
        }

        Ok(())
    }
}
