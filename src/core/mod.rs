//! Core primitives.
//!
//! Vector math and time sources shared by the game and network layers.

pub mod vec2;
pub mod clock;

// Re-export core types
pub use vec2::{Vec2, lerp, move_towards};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
