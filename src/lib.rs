//! # Shared Space Client
//!
//! Client core for a multiplayer 2D space: each participant steers an avatar
//! with a touch/mouse joystick, sees every other participant move smoothly,
//! and shares its own position over a realtime presence channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SHARED SPACE CLIENT                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - f32 2D vector, lerp, move_towards         │
//! │  └── clock.rs    - Injected millisecond clocks               │
//! │                                                              │
//! │  game/           - Per-frame client logic                    │
//! │  ├── gesture.rs  - Pointer → QuickPress / LongPress / stick  │
//! │  ├── motion.rs   - Local player integration                  │
//! │  ├── remote.rs   - Remote reconciliation and smoothing       │
//! │  ├── camera.rs   - Follow camera                             │
//! │  ├── actions.rs  - What gestures do                          │
//! │  ├── state.rs    - Owned client state                        │
//! │  └── tick.rs     - Frame update and render list              │
//! │                                                              │
//! │  network/        - Realtime channel                          │
//! │  ├── protocol.rs - Wire types                                │
//! │  ├── channel.rs  - PresenceChannel trait                     │
//! │  ├── sync.rs     - Throttled publishing                      │
//! │  ├── loopback.rs - In-memory hub                             │
//! │  ├── ws.rs       - WebSocket transport                       │
//! │  └── session.rs  - Single-owner session task                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time
//!
//! Nothing in `core/` or `game/` reads the system clock. Every operation
//! that depends on time takes a millisecond timestamp, so a whole session
//! can be replayed against a [`core::ManualClock`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use config::ClientConfig;
pub use core::{Clock, ManualClock, Millis, SystemClock, Vec2};
pub use error::{Anomaly, ChannelError, ConfigError};
pub use game::{
    tick, ClientState, Gesture, GestureOutcome, GestureRecognizer, LocalMotionController,
    RemoteStateReconciler, TickResult,
};
pub use network::{NetworkSyncPolicy, ParticipantId, PresenceChannel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal frame rate (Hz)
pub const FRAME_RATE: u32 = 60;
