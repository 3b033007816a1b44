//! Publish throttling.
//!
//! Local state is replicated as full state (never deltas), so a skipped or
//! failed publish needs no retry: the next publish after the interval carries
//! everything.

use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::core::{Millis, Vec2};
use crate::error::{Anomaly, ChannelError};
use crate::network::channel::PresenceChannel;
use crate::network::protocol::{MoveBroadcast, ParticipantId, PresenceRecord};

/// What `maybe_publish` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Presence refreshed and move broadcast sent.
    Published,
    /// Local player did not move this tick.
    Idle,
    /// Interval since the last publish has not elapsed.
    Throttled,
    /// Channel not subscribed yet.
    NotReady,
    /// The channel rejected the publish; gate left untouched.
    Failed,
}

/// Time of the last successful publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishGate {
    /// Starts at zero, so the first publish waits one interval after time zero.
    pub last_publish_ms: Millis,
}

/// Rate-limits publication of the local position.
#[derive(Debug, Clone)]
pub struct NetworkSyncPolicy {
    config: NetworkConfig,
    gate: PublishGate,
}

impl NetworkSyncPolicy {
    /// Policy with a closed-at-zero gate.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            gate: PublishGate::default(),
        }
    }

    /// Publish `position` if it changed and the interval has elapsed.
    pub fn maybe_publish<C: PresenceChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        subscribed: bool,
        id: &ParticipantId,
        position: Vec2,
        moved: bool,
        now: Millis,
    ) -> PublishOutcome {
        if !moved {
            return PublishOutcome::Idle;
        }
        if now.saturating_sub(self.gate.last_publish_ms) <= self.config.publish_interval_ms {
            return PublishOutcome::Throttled;
        }
        if !subscribed {
            Anomaly::ChannelNotReady.log();
            return PublishOutcome::NotReady;
        }

        match self.publish(channel, id, position) {
            Ok(()) => {
                self.gate.last_publish_ms = now;
                debug!(id = %id.short(), %position, "published position");
                PublishOutcome::Published
            }
            Err(e) => {
                warn!("Publish failed: {}", e);
                PublishOutcome::Failed
            }
        }
    }

    /// Refresh presence only. Used once the channel confirms subscription.
    pub fn announce<C: PresenceChannel + ?Sized>(
        &self,
        channel: &mut C,
        id: &ParticipantId,
        position: Vec2,
    ) -> Result<(), ChannelError> {
        channel.track(&PresenceRecord::new(id.clone(), position))
    }

    fn publish<C: PresenceChannel + ?Sized>(
        &self,
        channel: &mut C,
        id: &ParticipantId,
        position: Vec2,
    ) -> Result<(), ChannelError> {
        channel.track(&PresenceRecord::new(id.clone(), position))?;
        channel.send(&self.config.move_event, &MoveBroadcast::new(id.clone(), position))
    }

    /// Gate state.
    pub fn gate(&self) -> PublishGate {
        self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::channel::RecordingChannel;
    use crate::network::protocol::OutboundMessage;

    fn policy() -> NetworkSyncPolicy {
        NetworkSyncPolicy::new(NetworkConfig::default())
    }

    #[test]
    fn test_publishes_track_then_broadcast() {
        let mut sync = policy();
        let mut channel = RecordingChannel::new();
        let id = ParticipantId::new("me");

        let outcome = sync.maybe_publish(&mut channel, true, &id, Vec2::new(5.0, 6.0), true, 201);
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(sync.gate().last_publish_ms, 201);

        assert!(matches!(&channel.outbound[0], OutboundMessage::Track { payload } if payload.position == Some(Vec2::new(5.0, 6.0))));
        assert!(matches!(&channel.outbound[1], OutboundMessage::Broadcast { event, .. } if event == "user_move"));
    }

    #[test]
    fn test_idle_and_throttled() {
        let mut sync = policy();
        let mut channel = RecordingChannel::new();
        let id = ParticipantId::new("me");

        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, false, 1000), PublishOutcome::Idle);
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 200), PublishOutcome::Throttled);
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 1000), PublishOutcome::Published);
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 1200), PublishOutcome::Throttled);
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 1201), PublishOutcome::Published);
    }

    #[test]
    fn test_not_ready_skips_without_touching_gate() {
        let mut sync = policy();
        let mut channel = RecordingChannel::new();
        let id = ParticipantId::new("me");

        assert_eq!(sync.maybe_publish(&mut channel, false, &id, Vec2::ZERO, true, 500), PublishOutcome::NotReady);
        assert!(channel.outbound.is_empty());
        assert_eq!(sync.gate().last_publish_ms, 0);

        // Next tick after subscription goes through immediately.
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 516), PublishOutcome::Published);
    }

    #[test]
    fn test_failure_leaves_gate() {
        let mut sync = policy();
        let mut channel = RecordingChannel { fail: true, ..Default::default() };
        let id = ParticipantId::new("me");

        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 500), PublishOutcome::Failed);
        assert_eq!(sync.gate().last_publish_ms, 0);

        channel.fail = false;
        assert_eq!(sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, 516), PublishOutcome::Published);
    }

    #[test]
    fn test_sixty_hz_for_one_second_publishes_at_most_five_times() {
        let mut sync = policy();
        let mut channel = RecordingChannel::new();
        let id = ParticipantId::new("me");

        let mut published = 0;
        for frame in 0..60u64 {
            let now = frame * 1000 / 60;
            if sync.maybe_publish(&mut channel, true, &id, Vec2::ZERO, true, now) == PublishOutcome::Published {
                published += 1;
            }
        }

        assert!(published <= 5, "published {} times", published);
        assert!(published >= 4);
        assert_eq!(channel.broadcast_count(), published);
    }

    #[test]
    fn test_announce_tracks_only() {
        let sync = policy();
        let mut channel = RecordingChannel::new();
        sync.announce(&mut channel, &ParticipantId::new("me"), Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(channel.track_count(), 1);
        assert_eq!(channel.broadcast_count(), 0);
    }
}
