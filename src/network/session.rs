//! Client Session Actor
//!
//! Runs one client as a single tokio task that owns its [`ClientState`].
//! Frame ticks, channel events and pointer input all arrive through this one
//! task, so the state is mutated in a single sequence no matter which tasks
//! produced the events.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::core::{Clock, Vec2};
use crate::game::state::ClientState;
use crate::game::tick::{tick, TickResult};
use crate::network::channel::PresenceChannel;
use crate::network::protocol::ChannelEvent;

/// Input delivered to a running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Pointer pressed (canvas coordinates).
    PointerDown {
        /// Canvas position.
        position: Vec2,
    },
    /// Pointer moved (canvas coordinates).
    PointerMove {
        /// Canvas position.
        position: Vec2,
    },
    /// Pointer released.
    PointerUp,
    /// Pointer cancelled.
    PointerCancel,
    /// Stop the session and return its state.
    Shutdown,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame period.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1) / crate::FRAME_RATE,
        }
    }
}

/// Run a session until `Shutdown`, the command sender is dropped, or the
/// frame receiver is dropped. Returns the final state.
///
/// Frames are offered with `try_send`: a renderer that falls behind misses
/// frames instead of stalling the simulation.
#[instrument(skip_all, fields(id = %state.local_id.short()))]
pub async fn run_session<C, K>(
    mut state: ClientState,
    mut channel: C,
    mut inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    mut commands: mpsc::Receiver<SessionCommand>,
    frames: mpsc::Sender<TickResult>,
    clock: K,
    config: SessionConfig,
) -> ClientState
where
    C: PresenceChannel,
    K: Clock,
{
    if let Err(e) = channel.subscribe() {
        warn!("Subscribe request failed: {}", e);
    }

    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut inbound_open = true;

    info!("Session started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let result = tick(&mut state, &mut channel, clock.now_ms());
                match frames.try_send(result) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("Renderer behind, frame dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        info!("Renderer gone, stopping session");
                        break;
                    }
                }
            }
            event = inbound.recv(), if inbound_open => {
                match event {
                    Some(event) => state.apply_channel_event(event, &mut channel, clock.now_ms()),
                    None => {
                        warn!("Channel event stream ended, continuing offline");
                        inbound_open = false;
                        state.subscribed = false;
                    }
                }
            }
            command = commands.recv() => {
                match command {
                    Some(SessionCommand::PointerDown { position }) => state.pointer_down(position, clock.now_ms()),
                    Some(SessionCommand::PointerMove { position }) => state.pointer_move(position),
                    Some(SessionCommand::PointerUp) => state.pointer_up(clock.now_ms()),
                    Some(SessionCommand::PointerCancel) => state.pointer_cancel(),
                    Some(SessionCommand::Shutdown) | None => {
                        info!("Session shutting down");
                        break;
                    }
                }
            }
        }
    }

    state
}
