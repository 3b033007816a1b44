//! Frame Tick
//!
//! One call per display frame:
//!
//! 1. Poll the LongPress deadline and resolve pending gestures
//! 2. Integrate local motion from the joystick and impulse
//! 3. Publish the local position if due
//! 4. Converge remote drawn positions
//! 5. Follow the local player with the camera
//! 6. Emit the ordered render list

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};

use crate::core::{Millis, Vec2};
use crate::game::actions::GestureOutcome;
use crate::game::state::ClientState;
use crate::network::channel::PresenceChannel;
use crate::network::protocol::ParticipantId;
use crate::network::sync::PublishOutcome;

/// One drawable participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEntity {
    /// Participant.
    pub id: ParticipantId,
    /// This client's own player.
    pub is_local: bool,
    /// World position to draw at.
    pub position: Vec2,
}

/// Result of a tick.
#[derive(Debug)]
pub struct TickResult {
    /// Every participant, sorted by vertical position (back to front).
    pub entities: Vec<RenderEntity>,
    /// Gesture outcomes resolved since the previous tick.
    pub outcomes: Vec<GestureOutcome>,
    /// What the publish step did.
    pub publish: PublishOutcome,
    /// The local player moved this tick.
    pub moved: bool,
    /// Clamped elapsed time used for this tick (s).
    pub dt: f32,
    /// Camera translation to apply when drawing.
    pub camera: Vec2,
}

impl TickResult {
    /// True if the local position was published this tick.
    pub fn published(&self) -> bool {
        self.publish == PublishOutcome::Published
    }

    /// Reorder entities by a caller-chosen key (ascending).
    pub fn sorted_by<K, F>(mut self, mut key: F) -> Vec<RenderEntity>
    where
        K: PartialOrd,
        F: FnMut(&RenderEntity) -> K,
    {
        self.entities
            .sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));
        self.entities
    }

    /// The local player's render entry.
    pub fn local(&self) -> Option<&RenderEntity> {
        self.entities.iter().find(|e| e.is_local)
    }
}

/// Run one frame.
pub fn tick<C: PresenceChannel + ?Sized>(
    state: &mut ClientState,
    channel: &mut C,
    now: Millis,
) -> TickResult {
    let elapsed = now.saturating_sub(state.last_tick_ms) as f32 / 1000.0;
    let dt = state.motion.clamp_delta(elapsed);
    state.last_tick_ms = now;

    // 1. Gestures
    state.recognizer.tick(now);
    state.dispatch_gestures();

    // 2. Local motion
    let joystick = state.recognizer.joystick_vector();
    let step = state.motion.step(joystick, dt);

    // 3. Publish
    let publish = state.sync.maybe_publish(
        channel,
        state.subscribed,
        &state.local_id,
        state.motion.position(),
        step.moved,
        now,
    );

    // 4. Remote convergence
    state.remotes.advance(dt);

    // 5. Camera
    state.camera.follow(state.motion.position(), dt);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        now,
        dt,
        local = %state.motion.position(),
        remotes = state.remotes.len(),
        "tick"
    );

    // 6. Render list
    let mut entities: Vec<RenderEntity> = state
        .remotes
        .drawn_positions()
        .map(|(id, position)| RenderEntity {
            id: id.clone(),
            is_local: false,
            position,
        })
        .collect();
    entities.push(RenderEntity {
        id: state.local_id.clone(),
        is_local: true,
        position: state.motion.position(),
    });
    entities.sort_by(|a, b| a.position.y.partial_cmp(&b.position.y).unwrap_or(Ordering::Equal));

    TickResult {
        entities,
        outcomes: std::mem::take(&mut state.pending_outcomes),
        publish,
        moved: step.moved,
        dt,
        camera: state.camera.position(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::network::channel::RecordingChannel;
    use crate::network::protocol::{ChannelEvent, ChannelStatus, MoveBroadcast, PresenceRecord};

    fn subscribed_state() -> (ClientState, RecordingChannel) {
        let mut state = ClientState::new(ClientConfig::default(), ParticipantId::new("me"));
        let mut channel = RecordingChannel::new();
        state.apply_channel_event(
            ChannelEvent::Status { status: ChannelStatus::Subscribed },
            &mut channel,
            0,
        );
        channel.outbound.clear();
        (state, channel)
    }

    #[test]
    fn test_idle_tick() {
        let (mut state, mut channel) = subscribed_state();
        let result = tick(&mut state, &mut channel, 16);

        assert!(!result.moved);
        assert_eq!(result.publish, PublishOutcome::Idle);
        assert_eq!(result.entities.len(), 1);
        assert!(result.local().is_some());
        assert!(channel.outbound.is_empty());
    }

    #[test]
    fn test_delta_time_clamped() {
        let (mut state, mut channel) = subscribed_state();
        let result = tick(&mut state, &mut channel, 60_000);
        assert!((result.dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_drag_moves_and_publishes() {
        let (mut state, mut channel) = subscribed_state();
        state.pointer_down(Vec2::new(300.0, 300.0), 0);
        state.pointer_move(Vec2::new(400.0, 300.0));

        let mut published = 0;
        let mut now = 0;
        for _ in 0..60 {
            now += 16;
            if tick(&mut state, &mut channel, now).published() {
                published += 1;
            }
        }

        assert!(state.local_position().x > 0.0);
        assert_eq!(state.local_position().y, 0.0);
        assert!((4..=5).contains(&published));
        assert_eq!(channel.track_count(), published);
    }

    #[test]
    fn test_long_press_outcome_reported_by_tick() {
        let (mut state, mut channel) = subscribed_state();
        state.pointer_down(Vec2::new(600.0, 600.0), 0);

        let mut outcomes = Vec::new();
        for now in (16..=600).step_by(16) {
            outcomes.extend(tick(&mut state, &mut channel, now).outcomes);
        }

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], GestureOutcome::ImpulseApplied { .. }));
        assert!(state.motion().state().impulse_velocity.length() > 0.0);
    }

    #[test]
    fn test_render_list_sorted_by_y() {
        let (mut state, mut channel) = subscribed_state();
        state.apply_channel_event(
            ChannelEvent::PresenceJoin {
                new_presences: vec![
                    PresenceRecord::new(ParticipantId::new("low"), Vec2::new(0.0, 50.0)),
                    PresenceRecord::new(ParticipantId::new("high"), Vec2::new(0.0, -50.0)),
                ],
            },
            &mut channel,
            0,
        );

        let result = tick(&mut state, &mut channel, 16);
        let ids: Vec<&str> = result.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "me", "low"]);

        let by_id = result.sorted_by(|e| e.id.as_str().to_string());
        assert_eq!(by_id[0].id.as_str(), "high");
        assert_eq!(by_id[2].id.as_str(), "me");
    }

    #[test]
    fn test_remote_converges_through_ticks() {
        let (mut state, mut channel) = subscribed_state();
        let a = ParticipantId::new("a");
        state.apply_channel_event(
            ChannelEvent::PresenceJoin { new_presences: vec![PresenceRecord::new(a.clone(), Vec2::ZERO)] },
            &mut channel,
            0,
        );
        tick(&mut state, &mut channel, 0);

        state.apply_channel_event(
            ChannelEvent::broadcast_move("user_move", &MoveBroadcast::new(a.clone(), Vec2::new(100.0, 0.0))).unwrap(),
            &mut channel,
            0,
        );
        let first = tick(&mut state, &mut channel, 100);
        let result = tick(&mut state, &mut channel, 200);

        // dt is clamped to 0.1 s: half the remaining gap each tick.
        let halfway = first.entities.iter().find(|e| e.id == a).unwrap();
        assert!((halfway.position.x - 50.0).abs() < 1e-3);
        let remote = result.entities.iter().find(|e| e.id == a).unwrap();
        assert!((remote.position.x - 75.0).abs() < 1e-3);
        assert_eq!(remote.position.y, 0.0);
    }
}
