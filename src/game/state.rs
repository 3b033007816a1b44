//! Client State
//!
//! The single, explicitly owned object holding everything one client knows:
//! its pointer, its player, its camera, every remote participant and the
//! publish gate. Input and channel events mutate it through the methods here;
//! [`crate::game::tick::tick`] advances it once per frame.

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::core::{Millis, Vec2};
use crate::game::actions::{resolve_gesture, GestureOutcome};
use crate::game::camera::Camera;
use crate::game::gesture::{Gesture, GestureRecognizer};
use crate::game::motion::LocalMotionController;
use crate::game::remote::RemoteStateReconciler;
use crate::network::channel::PresenceChannel;
use crate::network::protocol::{ChannelEvent, ChannelStatus, MoveBroadcast, ParticipantId};
use crate::network::sync::NetworkSyncPolicy;

/// Everything one client tracks between frames.
#[derive(Debug)]
pub struct ClientState {
    /// This client's participant id.
    pub local_id: ParticipantId,
    pub(crate) config: ClientConfig,
    pub(crate) recognizer: GestureRecognizer<Vec<Gesture>>,
    pub(crate) motion: LocalMotionController,
    pub(crate) remotes: RemoteStateReconciler,
    pub(crate) sync: NetworkSyncPolicy,
    pub(crate) camera: Camera,
    /// Channel confirmed `Subscribed` and has not reported otherwise since.
    pub(crate) subscribed: bool,
    pub(crate) last_tick_ms: Millis,
    /// Gesture outcomes not yet reported by a tick.
    pub(crate) pending_outcomes: Vec<GestureOutcome>,
}

impl ClientState {
    /// Fresh client at the origin.
    ///
    /// The config is used as given; load it through
    /// [`ClientConfig::from_json_str`] or call [`ClientConfig::validate`] first.
    pub fn new(config: ClientConfig, local_id: ParticipantId) -> Self {
        Self {
            recognizer: GestureRecognizer::new(config.gesture.clone(), Vec::new()),
            motion: LocalMotionController::new(config.motion.clone()),
            remotes: RemoteStateReconciler::new(
                local_id.clone(),
                config.network.remote_sync_window_seconds,
            ),
            sync: NetworkSyncPolicy::new(config.network.clone()),
            camera: Camera::new(config.camera.clone()),
            subscribed: false,
            last_tick_ms: 0,
            pending_outcomes: Vec::new(),
            local_id,
            config,
        }
    }

    /// Fresh client with a random id.
    pub fn with_random_id(config: ClientConfig) -> Self {
        Self::new(config, ParticipantId::random())
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Pointer pressed (canvas coordinates).
    pub fn pointer_down(&mut self, position: Vec2, now: Millis) {
        self.recognizer.on_pointer_down(position, now);
    }

    /// Pointer moved (canvas coordinates).
    pub fn pointer_move(&mut self, position: Vec2) {
        self.recognizer.on_pointer_move(position);
    }

    /// Pointer released.
    pub fn pointer_up(&mut self, now: Millis) {
        self.recognizer.on_pointer_up(now);
        self.dispatch_gestures();
    }

    /// Pointer cancelled by the platform.
    pub fn pointer_cancel(&mut self) {
        self.recognizer.on_pointer_cancel();
    }

    /// Resolve queued gestures against the current world.
    pub(crate) fn dispatch_gestures(&mut self) {
        for gesture in std::mem::take(self.recognizer.listener_mut()) {
            let outcome = resolve_gesture(
                gesture,
                &self.camera,
                &mut self.motion,
                &self.remotes,
                &self.config.motion,
            );
            self.pending_outcomes.push(outcome);
        }
    }

    // =========================================================================
    // CHANNEL
    // =========================================================================

    /// Apply one channel event, in receipt order.
    pub fn apply_channel_event<C: PresenceChannel + ?Sized>(
        &mut self,
        event: ChannelEvent,
        channel: &mut C,
        now: Millis,
    ) {
        match event {
            ChannelEvent::Status { status } => self.on_status(status, channel),
            ChannelEvent::PresenceSync { state } => self.remotes.apply_sync(&state, now),
            ChannelEvent::PresenceJoin { new_presences } => self.remotes.apply_join(&new_presences, now),
            ChannelEvent::PresenceLeave { left_presences } => self.remotes.apply_leave(&left_presences),
            ChannelEvent::Broadcast { event, payload } => {
                if event != self.config.network.move_event {
                    return;
                }
                match serde_json::from_value::<MoveBroadcast>(payload) {
                    Ok(msg) => self.remotes.apply_move(&msg, now),
                    Err(e) => warn!("Failed to decode {} payload: {}", event, e),
                }
            }
        }
    }

    fn on_status<C: PresenceChannel + ?Sized>(&mut self, status: ChannelStatus, channel: &mut C) {
        match status {
            ChannelStatus::Subscribed => {
                info!("Subscribed to {} as {}", self.config.network.channel_name, self.local_id.short());
                self.subscribed = true;
                if let Err(e) = self.sync.announce(channel, &self.local_id, self.motion.position()) {
                    warn!("Initial presence track failed: {}", e);
                }
            }
            other => {
                if self.subscribed {
                    warn!("Channel status {:?}, publishing paused", other);
                }
                self.subscribed = false;
            }
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Local player position (world space).
    pub fn local_position(&self) -> Vec2 {
        self.motion.position()
    }

    /// Local motion controller.
    pub fn motion(&self) -> &LocalMotionController {
        &self.motion
    }

    /// Remote participants.
    pub fn remotes(&self) -> &RemoteStateReconciler {
        &self.remotes
    }

    /// Follow camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Gesture recognizer.
    pub fn recognizer(&self) -> &GestureRecognizer<Vec<Gesture>> {
        &self.recognizer
    }

    /// Publish policy.
    pub fn sync(&self) -> &NetworkSyncPolicy {
        &self.sync
    }

    /// True once the channel confirmed the subscription.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}
