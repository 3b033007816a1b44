//! Error Types
//!
//! Two kinds of failure exist in the client core:
//!
//! - Propagated errors ([`ChannelError`], [`ConfigError`]) returned through
//!   `Result` by transports and configuration loading.
//! - [`Anomaly`]: malformed or unexpected input that the core absorbs with a
//!   default and logs. These never leave the core.

use thiserror::Error;

/// Failure talking to the realtime channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Publish attempted before the channel reported `Subscribed`.
    #[error("channel not subscribed yet")]
    NotReady,

    /// The channel (or its background task) is gone.
    #[error("channel closed")]
    Closed,

    /// Outbound queue is full.
    #[error("outbound queue full")]
    Backpressure,

    /// Payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Failure loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for [`crate::config::ClientConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tunable is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Input the core recovers from locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    /// Presence or broadcast payload without a position; origin used.
    #[error("payload for {id} has no position, defaulting to origin")]
    MissingPositionData {
        /// Participant the payload referred to.
        id: String,
    },

    /// Broadcast or leave for an id that is not tracked.
    #[error("no tracked entity for {id}")]
    UnknownEntityReference {
        /// Participant the message referred to.
        id: String,
    },

    /// Publish attempted before subscription was confirmed; skipped.
    #[error("publish skipped, channel not ready")]
    ChannelNotReady,

    /// Pointer down while a session was already active; session replaced.
    #[error("pointer down during active session, replacing it")]
    DoubleActivePointer,
}

impl Anomaly {
    /// Emit this anomaly through `tracing` at debug level.
    pub fn log(&self) {
        tracing::debug!(anomaly = ?self, "{}", self);
    }
}
