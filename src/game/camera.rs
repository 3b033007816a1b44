//! Follow camera.
//!
//! The camera is a translation applied to world coordinates so that the
//! local player drifts toward the centre of the viewport.

use crate::config::CameraConfig;
use crate::core::Vec2;

/// Smoothed camera offset. Derived state: only [`Camera::follow`] moves it.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    position: Vec2,
}

impl Camera {
    /// Camera at zero offset.
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            position: Vec2::ZERO,
        }
    }

    /// Ease toward centring `target` (world space) in the viewport.
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        let desired = -target + self.config.viewport() / 2.0;
        self.position = self.position.lerp(desired, self.config.camera_follow_speed * dt);
    }

    /// Current translation (world → screen).
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Map a canvas point into world space.
    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen - self.position
    }

    /// Map a world point onto the canvas.
    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_converges_on_player() {
        let mut camera = Camera::new(CameraConfig::default());
        let player = Vec2::new(100.0, -50.0);

        for _ in 0..600 {
            camera.follow(player, 1.0 / 60.0);
        }

        let on_screen = camera.world_to_screen(player);
        assert!((on_screen.x - 333.0).abs() < 0.01);
        assert!((on_screen.y - 333.0).abs() < 0.01);
    }

    #[test]
    fn test_screen_world_inverse() {
        let mut camera = Camera::new(CameraConfig::default());
        camera.follow(Vec2::new(40.0, 40.0), 0.1);

        let p = Vec2::new(12.0, 250.0);
        let back = camera.world_to_screen(camera.screen_to_world(p));
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
    }
}
