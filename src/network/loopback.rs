//! In-memory realtime channel.
//!
//! [`LoopbackHub`] behaves like a presence-enabled broadcast topic shared by
//! every client connected to it:
//!
//! - subscribing delivers `Subscribed` then a presence snapshot;
//! - the first `track` from a member announces a join, every `track` is
//!   followed by a snapshot to all members;
//! - broadcasts reach every other subscribed member;
//! - dropping a [`LoopbackChannel`] announces a leave.
//!
//! Presence events are delivered to the sender as well, matching hosted
//! realtime services; clients are expected to ignore their own id.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ChannelError;
use crate::network::channel::PresenceChannel;
use crate::network::protocol::{
    ChannelEvent, ChannelStatus, MoveBroadcast, ParticipantId, PresenceRecord, PresenceState,
};

struct Member {
    /// Distinguishes reconnects under the same id.
    generation: u64,
    events: mpsc::UnboundedSender<ChannelEvent>,
    subscribed: bool,
    presence: Option<PresenceRecord>,
}

#[derive(Default)]
struct HubInner {
    members: BTreeMap<ParticipantId, Member>,
    next_generation: u64,
}

impl HubInner {
    /// Member for `id` only if it is still the connection `generation` created.
    fn member_mut(&mut self, id: &ParticipantId, generation: u64) -> Option<&mut Member> {
        self.members.get_mut(id).filter(|m| m.generation == generation)
    }

    fn snapshot(&self) -> PresenceState {
        let mut state = PresenceState::new();
        for (id, member) in &self.members {
            if let Some(record) = &member.presence {
                state.entry(id.to_string()).or_default().push(record.clone());
            }
        }
        state
    }

    fn publish_to_subscribed(&self, event: &ChannelEvent, skip: Option<&ParticipantId>) {
        for (id, member) in &self.members {
            if !member.subscribed || Some(id) == skip {
                continue;
            }
            // A dropped receiver just means that client is shutting down.
            let _ = member.events.send(event.clone());
        }
    }

    fn sync_all(&self) {
        let event = ChannelEvent::PresenceSync { state: self.snapshot() };
        self.publish_to_subscribed(&event, None);
    }
}

/// Shared in-memory presence topic.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LoopbackHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a client. Returns its outbound channel and inbound event stream.
    ///
    /// Connecting an id that is already attached replaces the old member.
    pub fn connect(
        &self,
        id: ParticipantId,
    ) -> (LoopbackChannel, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut generation = 0;
        if let Ok(mut inner) = self.inner.lock() {
            inner.next_generation += 1;
            generation = inner.next_generation;
            inner.members.insert(
                id.clone(),
                Member {
                    generation,
                    events: tx,
                    subscribed: false,
                    presence: None,
                },
            );
        }
        debug!(id = %id.short(), generation, "loopback member connected");

        (LoopbackChannel { hub: self.inner.clone(), id, generation }, rx)
    }

    /// Members currently attached.
    pub fn member_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.members.len()).unwrap_or(0)
    }

    /// Current presence snapshot.
    pub fn snapshot(&self) -> PresenceState {
        self.inner.lock().map(|inner| inner.snapshot()).unwrap_or_default()
    }
}

/// One client's handle on a [`LoopbackHub`].
///
/// A handle whose member was replaced by a later `connect` with the same id
/// is stale: its calls fail with [`ChannelError::Closed`] and dropping it
/// leaves the replacement alone.
pub struct LoopbackChannel {
    hub: Arc<Mutex<HubInner>>,
    id: ParticipantId,
    generation: u64,
}

impl LoopbackChannel {
    /// Participant this handle publishes as.
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubInner>, ChannelError> {
        self.hub.lock().map_err(|_| ChannelError::Closed)
    }
}

impl PresenceChannel for LoopbackChannel {
    fn subscribe(&mut self) -> Result<(), ChannelError> {
        let mut inner = self.lock()?;
        let snapshot = inner.snapshot();
        let member = inner.member_mut(&self.id, self.generation).ok_or(ChannelError::Closed)?;
        member.subscribed = true;

        member
            .events
            .send(ChannelEvent::Status { status: ChannelStatus::Subscribed })
            .map_err(|_| ChannelError::Closed)?;
        member
            .events
            .send(ChannelEvent::PresenceSync { state: snapshot })
            .map_err(|_| ChannelError::Closed)?;
        Ok(())
    }

    fn track(&mut self, record: &PresenceRecord) -> Result<(), ChannelError> {
        let mut inner = self.lock()?;
        let member = inner.member_mut(&self.id, self.generation).ok_or(ChannelError::Closed)?;
        if !member.subscribed {
            return Err(ChannelError::NotReady);
        }

        let is_new = member.presence.is_none();
        member.presence = Some(record.clone());

        if is_new {
            let join = ChannelEvent::PresenceJoin { new_presences: vec![record.clone()] };
            inner.publish_to_subscribed(&join, None);
        }
        inner.sync_all();
        Ok(())
    }

    fn send(&mut self, event: &str, payload: &MoveBroadcast) -> Result<(), ChannelError> {
        let mut inner = self.lock()?;
        let member = inner.member_mut(&self.id, self.generation).ok_or(ChannelError::Closed)?;
        if !member.subscribed {
            return Err(ChannelError::NotReady);
        }

        let broadcast = ChannelEvent::broadcast_move(event, payload)?;
        inner.publish_to_subscribed(&broadcast, Some(&self.id));
        Ok(())
    }
}

impl Drop for LoopbackChannel {
    fn drop(&mut self) {
        let Ok(mut inner) = self.hub.lock() else {
            return;
        };
        if inner.member_mut(&self.id, self.generation).is_none() {
            return;
        }
        let Some(member) = inner.members.remove(&self.id) else {
            return;
        };
        debug!(id = %self.id.short(), "loopback member disconnected");

        if let Some(record) = member.presence {
            let leave = ChannelEvent::PresenceLeave { left_presences: vec![record] };
            inner.publish_to_subscribed(&leave, None);
            inner.sync_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec2;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_subscribe_delivers_status_then_snapshot() {
        let hub = LoopbackHub::new();
        let (mut a, mut a_rx) = hub.connect(ParticipantId::new("a"));
        a.subscribe().unwrap();

        let events = drain(&mut a_rx);
        assert_eq!(events[0], ChannelEvent::Status { status: ChannelStatus::Subscribed });
        assert!(matches!(&events[1], ChannelEvent::PresenceSync { state } if state.is_empty()));
    }

    #[test]
    fn test_track_before_subscribe_rejected() {
        let hub = LoopbackHub::new();
        let (mut a, _rx) = hub.connect(ParticipantId::new("a"));
        let result = a.track(&PresenceRecord::new(ParticipantId::new("a"), Vec2::ZERO));
        assert!(matches!(result, Err(ChannelError::NotReady)));
    }

    #[test]
    fn test_join_sync_and_broadcast() {
        let hub = LoopbackHub::new();
        let (mut a, mut a_rx) = hub.connect(ParticipantId::new("a"));
        let (mut b, mut b_rx) = hub.connect(ParticipantId::new("b"));
        a.subscribe().unwrap();
        b.subscribe().unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        a.track(&PresenceRecord::new(ParticipantId::new("a"), Vec2::new(1.0, 2.0))).unwrap();
        let events = drain(&mut b_rx);
        assert!(matches!(&events[0], ChannelEvent::PresenceJoin { new_presences } if new_presences[0].id.as_str() == "a"));
        assert!(matches!(&events[1], ChannelEvent::PresenceSync { state } if state.contains_key("a")));

        // Refreshing presence does not re-announce a join.
        a.track(&PresenceRecord::new(ParticipantId::new("a"), Vec2::new(3.0, 4.0))).unwrap();
        let events = drain(&mut b_rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ChannelEvent::PresenceSync { .. }));

        a.send("user_move", &MoveBroadcast::new(ParticipantId::new("a"), Vec2::new(5.0, 5.0))).unwrap();
        assert!(matches!(drain(&mut b_rx).as_slice(), [ChannelEvent::Broadcast { .. }]));
        // Sender does not hear its own broadcast.
        assert!(drain(&mut a_rx).iter().all(|e| !matches!(e, ChannelEvent::Broadcast { .. })));
    }

    #[test]
    fn test_drop_announces_leave() {
        let hub = LoopbackHub::new();
        let (mut a, _a_rx) = hub.connect(ParticipantId::new("a"));
        let (mut b, mut b_rx) = hub.connect(ParticipantId::new("b"));
        a.subscribe().unwrap();
        b.subscribe().unwrap();
        a.track(&PresenceRecord::new(ParticipantId::new("a"), Vec2::ZERO)).unwrap();
        drain(&mut b_rx);

        drop(a);

        let events = drain(&mut b_rx);
        assert!(matches!(&events[0], ChannelEvent::PresenceLeave { left_presences } if left_presences[0].id.as_str() == "a"));
        assert!(matches!(&events[1], ChannelEvent::PresenceSync { state } if state.is_empty()));
        assert_eq!(hub.member_count(), 1);
    }

    #[test]
    fn test_reconnect_survives_drop_of_stale_handle() {
        let hub = LoopbackHub::new();
        let (mut watcher, mut watcher_rx) = hub.connect(ParticipantId::new("w"));
        watcher.subscribe().unwrap();

        let (mut old, _old_rx) = hub.connect(ParticipantId::new("a"));
        let (mut new, _new_rx) = hub.connect(ParticipantId::new("a"));
        new.subscribe().unwrap();
        new.track(&PresenceRecord::new(ParticipantId::new("a"), Vec2::new(4.0, 4.0))).unwrap();
        drain(&mut watcher_rx);

        // The replaced handle can no longer publish.
        assert!(matches!(old.subscribe(), Err(ChannelError::Closed)));
        assert!(matches!(
            old.send("user_move", &MoveBroadcast::new(ParticipantId::new("a"), Vec2::ZERO)),
            Err(ChannelError::Closed)
        ));

        drop(old);

        assert!(drain(&mut watcher_rx).is_empty());
        assert_eq!(hub.member_count(), 2);
        assert!(hub.snapshot().contains_key("a"));

        drop(new);
        let events = drain(&mut watcher_rx);
        assert!(matches!(&events[0], ChannelEvent::PresenceLeave { .. }));
    }
}
