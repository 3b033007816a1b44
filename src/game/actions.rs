//! Gesture actions.
//!
//! Turns recognized gestures into effects on the space:
//!
//! - QuickPress selects the closest remote participant near the press.
//! - LongPress on yourself selects yourself; anywhere else it pushes the
//!   local player toward the press with an impulse.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::config::MotionConfig;
use crate::core::Vec2;
use crate::game::camera::Camera;
use crate::game::gesture::Gesture;
use crate::game::motion::LocalMotionController;
use crate::game::remote::RemoteStateReconciler;
use crate::network::protocol::ParticipantId;

/// Effect of a gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureOutcome {
    /// QuickPress landed on a remote participant.
    EntitySelected {
        /// Selected participant.
        id: ParticipantId,
        /// Its drawn position.
        position: Vec2,
    },
    /// QuickPress found nobody in range.
    NothingSelected {
        /// Press location (world space).
        at: Vec2,
    },
    /// LongPress on the local player.
    SelfSelected,
    /// LongPress away from the local player launched an impulse.
    ImpulseApplied {
        /// Unit direction of the impulse.
        direction: Vec2,
    },
}

/// Apply a gesture to the local player, using the camera to map the
/// gesture's canvas position into world space.
pub fn resolve_gesture(
    gesture: Gesture,
    camera: &Camera,
    motion: &mut LocalMotionController,
    remotes: &RemoteStateReconciler,
    config: &MotionConfig,
) -> GestureOutcome {
    match gesture {
        Gesture::QuickPress { position } => {
            let world = camera.screen_to_world(position);
            match remotes.closest_within(world, config.interact_range) {
                Some(entity) => {
                    info!("Quick press: closest player is {} at {}", entity.id.short(), entity.drawn);
                    GestureOutcome::EntitySelected {
                        id: entity.id.clone(),
                        position: entity.drawn,
                    }
                }
                None => {
                    info!("No player found within range of quick press");
                    GestureOutcome::NothingSelected { at: world }
                }
            }
        }
        Gesture::LongPress { position } => {
            let world = camera.screen_to_world(position);
            let local = motion.position();
            let range_sq = config.interact_range * config.interact_range;

            if local.distance_squared(world) <= range_sq {
                info!("Long press on self");
                GestureOutcome::SelfSelected
            } else {
                let direction = (world - local).normalize();
                motion.apply_impulse(direction, config.impulse_force);
                info!("Long press out of range, impulse toward {}", world);
                GestureOutcome::ImpulseApplied { direction }
            }
        }
    }
}
