//! Local Motion
//!
//! Integrates the local player's position from the (smoothed) joystick vector
//! and a decaying impulse velocity.

use serde::{Serialize, Deserialize};

use crate::config::MotionConfig;
use crate::core::Vec2;

/// Local player kinematic state. Created once, never destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalPlayerState {
    /// World position.
    pub position: Vec2,
    /// Impulse velocity (px/s), decays toward zero.
    pub impulse_velocity: Vec2,
    /// Joystick vector after exponential smoothing.
    pub smoothed_input: Vec2,
}

/// Result of one motion step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    /// Velocity applied this step (px/s).
    pub move_vector: Vec2,
    /// Either component of `move_vector` was non-zero.
    pub moved: bool,
}

/// Advances [`LocalPlayerState`] once per tick.
#[derive(Debug, Clone)]
pub struct LocalMotionController {
    config: MotionConfig,
    state: LocalPlayerState,
}

impl LocalMotionController {
    /// Controller at the origin, at rest.
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: LocalPlayerState::default(),
        }
    }

    /// Clamp a raw elapsed time to the configured maximum.
    #[inline]
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        dt.clamp(0.0, self.config.max_delta_time_seconds)
    }

    /// Integrate one tick of `dt` seconds toward `joystick`.
    pub fn step(&mut self, joystick: Vec2, dt: f32) -> MotionStep {
        let dt = self.clamp_delta(dt);
        let t = self.config.input_responsiveness * dt;
        let state = &mut self.state;

        // 1. Smooth input toward the live joystick
        state.smoothed_input = state.smoothed_input.lerp(joystick, t);

        // 2. Impulse decays at the same rate
        state.impulse_velocity = state.impulse_velocity.lerp(Vec2::ZERO, t);

        // 3. Combine
        let move_vector = state.impulse_velocity + state.smoothed_input * self.config.local_speed;

        // 4. Integrate
        state.position += move_vector * dt;

        MotionStep {
            move_vector,
            moved: move_vector.is_nonzero(),
        }
    }

    /// Replace the impulse velocity with `normalize(direction) * magnitude`.
    pub fn apply_impulse(&mut self, direction: Vec2, magnitude: f32) {
        self.state.impulse_velocity = direction.normalize() * magnitude;
    }

    /// Current state.
    pub fn state(&self) -> &LocalPlayerState {
        &self.state
    }

    /// Current world position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    /// Teleport (e.g. restoring a spawn point). Velocities are kept.
    pub fn set_position(&mut self, position: Vec2) {
        self.state.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> LocalMotionController {
        LocalMotionController::new(MotionConfig::default())
    }

    #[test]
    fn test_idle_does_not_move() {
        let mut motion = controller();
        let step = motion.step(Vec2::ZERO, 0.016);
        assert!(!step.moved);
        assert_eq!(motion.position(), Vec2::ZERO);
    }

    #[test]
    fn test_input_is_smoothed() {
        let mut motion = controller();
        // responsiveness 3 * dt 0.1 = 0.3 of the way to the joystick
        let step = motion.step(Vec2::new(1.0, 0.0), 0.1);

        assert!((motion.state().smoothed_input.x - 0.3).abs() < 1e-6);
        assert!((step.move_vector.x - 60.0).abs() < 1e-4);
        assert!((motion.position().x - 6.0).abs() < 1e-4);
        assert!(step.moved);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut a = controller();
        let mut b = controller();
        a.step(Vec2::new(1.0, 1.0), 5.0);
        b.step(Vec2::new(1.0, 1.0), 0.1);
        assert_eq!(a.position(), b.position());
    }

    #[test]
    fn test_impulse_decays() {
        let mut motion = controller();
        motion.apply_impulse(Vec2::new(3.0, 4.0), 800.0);

        let iv = motion.state().impulse_velocity;
        assert!((iv.x - 480.0).abs() < 1e-3);
        assert!((iv.y - 640.0).abs() < 1e-3);

        let mut last = iv.length();
        for _ in 0..60 {
            motion.step(Vec2::ZERO, 1.0 / 60.0);
            let now = motion.state().impulse_velocity.length();
            assert!(now < last);
            last = now;
        }
        assert!(motion.position().x > 0.0 && motion.position().y > 0.0);
    }

    #[test]
    fn test_zero_direction_impulse() {
        let mut motion = controller();
        motion.apply_impulse(Vec2::ZERO, 800.0);
        assert_eq!(motion.state().impulse_velocity, Vec2::ZERO);
    }
}
