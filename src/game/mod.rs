//! Client Game Logic
//!
//! Everything that runs inside one frame on the client.
//!
//! ## Module Structure
//!
//! - `gesture`: Pointer session → QuickPress / LongPress / joystick
//! - `motion`: Local player integration (input smoothing, impulse)
//! - `remote`: Remote participant reconciliation and smoothing
//! - `camera`: Follow camera and screen/world mapping
//! - `actions`: What gestures do in the space
//! - `state`: The owned per-client state object
//! - `tick`: Per-frame update and render list

pub mod gesture;
pub mod motion;
pub mod remote;
pub mod camera;
pub mod actions;
pub mod state;
pub mod tick;

// Re-export key types
pub use gesture::{Gesture, GestureListener, GestureRecognizer, PointerSession};
pub use motion::{LocalMotionController, LocalPlayerState, MotionStep};
pub use remote::{RemoteEntity, RemoteStateReconciler};
pub use camera::Camera;
pub use actions::GestureOutcome;
pub use state::ClientState;
pub use tick::{tick, RenderEntity, TickResult};
