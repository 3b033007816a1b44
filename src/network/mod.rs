//! Network Layer
//!
//! Realtime channel plumbing for the shared space.
//! The game layer only sees the [`PresenceChannel`] trait; transports live here.

pub mod protocol;
pub mod channel;
pub mod sync;
pub mod loopback;
pub mod ws;
pub mod session;

pub use protocol::{
    ChannelEvent, ChannelStatus, MoveBroadcast, OutboundMessage, ParticipantId,
    PresenceRecord, PresenceState,
};
pub use channel::{PresenceChannel, RecordingChannel};
pub use sync::{NetworkSyncPolicy, PublishGate, PublishOutcome};
pub use loopback::{LoopbackChannel, LoopbackHub};
pub use ws::{connect, WsChannel, WsConnection};
pub use session::{run_session, SessionCommand, SessionConfig};
