//! Gesture Recognition
//!
//! Classifies a single pointer session into a QuickPress, a LongPress or a
//! continuous drag (exposed as a joystick vector).
//!
//! ## State machine
//!
//! ```text
//!   Idle ──down──▶ Pressed ──move > radius──▶ Dragging
//!    ▲               │  └─(deadline, polled)─▶ emits LongPress once
//!    └──up/cancel────┴──────────────────────────────┘
//! ```
//!
//! Hold detection is a deadline checked by [`GestureRecognizer::tick`], never
//! a timer, so every transition is driven by caller-supplied timestamps.
//! A drag beyond the press radius disarms the deadline permanently for the
//! session, even if the pointer later returns to where it started.

use serde::{Serialize, Deserialize};

use crate::config::GestureConfig;
use crate::core::{Millis, Vec2};
use crate::error::Anomaly;

/// A discrete gesture, carrying the canvas position where the press began.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// Short, stationary press.
    QuickPress {
        /// Press start position (canvas space).
        position: Vec2,
    },
    /// Stationary hold past the long-press delay.
    LongPress {
        /// Press start position (canvas space).
        position: Vec2,
    },
}

/// Receiver of recognized gestures.
pub trait GestureListener {
    /// A QuickPress was recognized at pointer-up.
    fn on_quick_press(&mut self, position: Vec2);

    /// A LongPress deadline elapsed while the pointer was held still.
    fn on_long_press(&mut self, position: Vec2);
}

/// Queue listener: gestures are pushed and drained by the owner.
impl GestureListener for Vec<Gesture> {
    fn on_quick_press(&mut self, position: Vec2) {
        self.push(Gesture::QuickPress { position });
    }

    fn on_long_press(&mut self, position: Vec2) {
        self.push(Gesture::LongPress { position });
    }
}

/// The active pointer. Exists only between down and up/cancel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSession {
    /// Where the pointer went down.
    pub start: Vec2,
    /// Latest pointer position.
    pub end: Vec2,
    /// Moved beyond the press radius at some point in this session.
    pub is_moving: bool,
    /// When the pointer went down.
    pub down_at: Millis,
}

/// Single-pointer gesture recognizer.
#[derive(Debug)]
pub struct GestureRecognizer<L: GestureListener> {
    config: GestureConfig,
    session: Option<PointerSession>,
    /// Armed LongPress deadline.
    long_press_due: Option<Millis>,
    listener: L,
}

impl<L: GestureListener> GestureRecognizer<L> {
    /// Create an idle recognizer delivering gestures to `listener`.
    pub fn new(config: GestureConfig, listener: L) -> Self {
        Self {
            config,
            session: None,
            long_press_due: None,
            listener,
        }
    }

    /// Pointer pressed at `position`.
    pub fn on_pointer_down(&mut self, position: Vec2, now: Millis) {
        if self.session.is_some() {
            Anomaly::DoubleActivePointer.log();
        }

        self.session = Some(PointerSession {
            start: position,
            end: position,
            is_moving: false,
            down_at: now,
        });
        self.long_press_due = Some(now.saturating_add(self.config.long_press_delay_ms));
    }

    /// Pointer moved to `position`. Ignored while idle.
    pub fn on_pointer_move(&mut self, position: Vec2) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.end = position;

        let radius_sq = self.config.press_radius * self.config.press_radius;
        if session.end.distance_squared(session.start) > radius_sq {
            session.is_moving = true;
            self.long_press_due = None;
        }
    }

    /// Pointer released. May emit QuickPress.
    pub fn on_pointer_up(&mut self, now: Millis) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.long_press_due = None;

        let held_for = now.saturating_sub(session.down_at);
        if !session.is_moving && held_for < self.config.quick_press_threshold_ms {
            self.listener.on_quick_press(session.start);
        }
    }

    /// Pointer session aborted by the platform. Never emits.
    pub fn on_pointer_cancel(&mut self) {
        self.session = None;
        self.long_press_due = None;
    }

    /// Poll the LongPress deadline.
    pub fn tick(&mut self, now: Millis) {
        let Some(due) = self.long_press_due else {
            return;
        };
        if now < due {
            return;
        }

        self.long_press_due = None;
        if let Some(session) = self.session.filter(|s| !s.is_moving) {
            self.listener.on_long_press(session.start);
        }
    }

    /// Drag displacement as a joystick: `(end - start) / range`, length capped at 1.
    pub fn joystick_vector(&self) -> Vec2 {
        match &self.session {
            Some(session) => {
                let raw = (session.end - session.start) / self.config.max_joystick_range;
                raw.clamp_length(1.0)
            }
            None => Vec2::ZERO,
        }
    }

    /// True while a pointer is down.
    #[inline]
    pub fn is_down(&self) -> bool {
        self.session.is_some()
    }

    /// The active pointer session, if any.
    pub fn session(&self) -> Option<&PointerSession> {
        self.session.as_ref()
    }

    /// True while a LongPress deadline is armed.
    pub fn long_press_armed(&self) -> bool {
        self.long_press_due.is_some()
    }

    /// Gesture listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Gesture listener (mutable, e.g. to drain a queue).
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}

// =============================================================================
// TESTS
// =============================================================================
