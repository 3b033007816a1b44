//! Protocol Messages
//!
//! Wire format exchanged with the realtime channel. All messages are JSON.
//! Presence records and move broadcasts share the `{ user_id, user_position }`
//! shape; a missing `user_position` is legal and decodes to `None`.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::Vec2;

// =============================================================================
// PARTICIPANT ID
// =============================================================================

/// Opaque participant identifier.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random (UUID v4) identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First six characters, for labels and logs.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(6).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// A participant's presence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Participant.
    #[serde(rename = "user_id")]
    pub id: ParticipantId,
    /// Last published position.
    #[serde(rename = "user_position", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
}

impl PresenceRecord {
    /// Record with a known position.
    pub fn new(id: ParticipantId, position: Vec2) -> Self {
        Self { id, position: Some(position) }
    }
}

/// Ephemeral position update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveBroadcast {
    /// Participant that moved.
    #[serde(rename = "user_id")]
    pub id: ParticipantId,
    /// New position.
    #[serde(rename = "user_position", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
}

impl MoveBroadcast {
    /// Broadcast with a known position.
    pub fn new(id: ParticipantId, position: Vec2) -> Self {
        Self { id, position: Some(position) }
    }
}

/// Full presence snapshot: presence key → records under that key.
pub type PresenceState = BTreeMap<String, Vec<PresenceRecord>>;

// =============================================================================
// CHANNEL -> CLIENT
// =============================================================================

/// Subscription status reported by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    /// Subscription confirmed; publishing may begin.
    Subscribed,
    /// Subscription attempt timed out.
    TimedOut,
    /// Channel closed.
    Closed,
    /// Channel reported an error.
    ChannelError,
}

/// Events delivered by the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// Subscription status changed.
    Status {
        /// New status.
        status: ChannelStatus,
    },

    /// Full presence snapshot; authoritative for membership.
    PresenceSync {
        /// Snapshot.
        state: PresenceState,
    },

    /// Participants joined.
    PresenceJoin {
        /// Records of the newcomers.
        new_presences: Vec<PresenceRecord>,
    },

    /// Participants left.
    PresenceLeave {
        /// Records of the departed.
        left_presences: Vec<PresenceRecord>,
    },

    /// Ephemeral broadcast. Payload is interpreted by event name.
    Broadcast {
        /// Event name.
        event: String,
        /// Raw payload.
        payload: serde_json::Value,
    },
}

impl ChannelEvent {
    /// Build a move broadcast event.
    pub fn broadcast_move(event: &str, payload: &MoveBroadcast) -> Result<Self, serde_json::Error> {
        Ok(Self::Broadcast {
            event: event.to_string(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// CLIENT -> CHANNEL
// =============================================================================

/// Requests sent to the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Join a topic with presence keyed by participant.
    Subscribe {
        /// Topic name.
        topic: String,
        /// Presence key for this client.
        presence_key: String,
    },

    /// Create or refresh this client's presence record.
    Track {
        /// Record.
        payload: PresenceRecord,
    },

    /// Send an ephemeral broadcast.
    Broadcast {
        /// Event name.
        event: String,
        /// Payload.
        payload: MoveBroadcast,
    },

    /// Remove this client's presence record.
    Untrack,
}

impl OutboundMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_record_wire_shape() {
        let record = PresenceRecord::new(ParticipantId::new("abc"), Vec2::new(1.5, -2.0));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"user_id":"abc","user_position":{"x":1.5,"y":-2.0}}"#);
    }

    #[test]
    fn test_missing_position_decodes_as_none() {
        let record: PresenceRecord = serde_json::from_str(r#"{"user_id":"abc"}"#).unwrap();
        assert_eq!(record.id.as_str(), "abc");
        assert_eq!(record.position, None);
    }

    #[test]
    fn test_presence_sync_from_json() {
        let json = r#"{
            "type": "presence_sync",
            "state": {
                "a": [{ "user_id": "a", "user_position": { "x": 10.0, "y": 20.0 } }],
                "b": [{ "user_id": "b" }]
            }
        }"#;

        let event = ChannelEvent::from_json(json).unwrap();
        let ChannelEvent::PresenceSync { state } = event else {
            panic!("Wrong event type");
        };
        assert_eq!(state.len(), 2);
        assert_eq!(state["a"][0].position, Some(Vec2::new(10.0, 20.0)));
        assert_eq!(state["b"][0].position, None);
    }

    #[test]
    fn test_status_event() {
        let event = ChannelEvent::from_json(r#"{"type":"status","status":"SUBSCRIBED"}"#).unwrap();
        assert_eq!(event, ChannelEvent::Status { status: ChannelStatus::Subscribed });
    }

    #[test]
    fn test_broadcast_move_payload() {
        let payload = MoveBroadcast::new(ParticipantId::new("p1"), Vec2::new(3.0, 4.0));
        let event = ChannelEvent::broadcast_move("user_move", &payload).unwrap();

        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"user_move""#));

        let ChannelEvent::Broadcast { payload: raw, .. } = ChannelEvent::from_json(&json).unwrap() else {
            panic!("Wrong event type");
        };
        let decoded: MoveBroadcast = serde_json::from_value(raw).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_outbound_track_json() {
        let msg = OutboundMessage::Track {
            payload: PresenceRecord::new(ParticipantId::new("me"), Vec2::ZERO),
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"track""#));
        assert_eq!(OutboundMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_participant_id_short() {
        assert_eq!(ParticipantId::new("0123456789").short(), "012345");
        assert_eq!(ParticipantId::new("ab").short(), "ab");
        assert_eq!(ParticipantId::random().as_str().len(), 36);
    }
}
