//! Realtime channel boundary.
//!
//! The core never talks to a transport directly; it publishes through
//! [`PresenceChannel`] and receives [`ChannelEvent`]s from whoever owns the
//! transport. Outbound calls are fire-and-forget.
//!
//! [`ChannelEvent`]: crate::network::protocol::ChannelEvent

use crate::error::ChannelError;
use crate::network::protocol::{MoveBroadcast, OutboundMessage, PresenceRecord};

/// Outbound half of a realtime presence channel.
pub trait PresenceChannel {
    /// Request subscription. Confirmation arrives later as a status event.
    fn subscribe(&mut self) -> Result<(), ChannelError>;

    /// Create or refresh this client's persistent presence record.
    fn track(&mut self, record: &PresenceRecord) -> Result<(), ChannelError>;

    /// Send an ephemeral broadcast.
    fn send(&mut self, event: &str, payload: &MoveBroadcast) -> Result<(), ChannelError>;
}

impl<C: PresenceChannel + ?Sized> PresenceChannel for &mut C {
    fn subscribe(&mut self) -> Result<(), ChannelError> {
        (**self).subscribe()
    }

    fn track(&mut self, record: &PresenceRecord) -> Result<(), ChannelError> {
        (**self).track(record)
    }

    fn send(&mut self, event: &str, payload: &MoveBroadcast) -> Result<(), ChannelError> {
        (**self).send(event, payload)
    }
}

/// Channel that records what it was asked to publish.
///
/// Useful for driving the core without a transport. Setting `fail` makes
/// every call return [`ChannelError::Closed`].
#[derive(Debug, Default)]
pub struct RecordingChannel {
    /// Messages accepted so far, in call order.
    pub outbound: Vec<OutboundMessage>,
    /// Reject every call.
    pub fail: bool,
}

impl RecordingChannel {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `track` calls accepted.
    pub fn track_count(&self) -> usize {
        self.outbound
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Track { .. }))
            .count()
    }

    /// Number of broadcasts accepted.
    pub fn broadcast_count(&self) -> usize {
        self.outbound
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Broadcast { .. }))
            .count()
    }

    fn accept(&mut self, msg: OutboundMessage) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Closed);
        }
        self.outbound.push(msg);
        Ok(())
    }
}

impl PresenceChannel for RecordingChannel {
    fn subscribe(&mut self) -> Result<(), ChannelError> {
        self.accept(OutboundMessage::Subscribe {
            topic: String::new(),
            presence_key: String::new(),
        })
    }

    fn track(&mut self, record: &PresenceRecord) -> Result<(), ChannelError> {
        self.accept(OutboundMessage::Track { payload: record.clone() })
    }

    fn send(&mut self, event: &str, payload: &MoveBroadcast) -> Result<(), ChannelError> {
        self.accept(OutboundMessage::Broadcast {
            event: event.to_string(),
            payload: payload.clone(),
        })
    }
}
