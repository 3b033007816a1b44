//! WebSocket channel transport.
//!
//! Speaks the JSON protocol in [`crate::network::protocol`]: every outbound
//! call becomes one [`OutboundMessage`] text frame, every inbound text frame
//! is decoded as a [`ChannelEvent`]. Frames that fail to decode are logged
//! and dropped.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::ChannelError;
use crate::network::channel::PresenceChannel;
use crate::network::protocol::{
    ChannelEvent, ChannelStatus, MoveBroadcast, OutboundMessage, ParticipantId, PresenceRecord,
};

/// Outbound queue depth before publishes are rejected.
const OUTBOUND_CAPACITY: usize = 100;

/// Outbound half of a WebSocket channel connection.
#[derive(Debug, Clone)]
pub struct WsChannel {
    topic: String,
    presence_key: ParticipantId,
    sender: mpsc::Sender<String>,
}

impl WsChannel {
    fn queue(&self, msg: OutboundMessage) -> Result<(), ChannelError> {
        let json = msg.to_json()?;
        self.sender.try_send(json).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed,
        })
    }
}

impl PresenceChannel for WsChannel {
    fn subscribe(&mut self) -> Result<(), ChannelError> {
        self.queue(OutboundMessage::Subscribe {
            topic: self.topic.clone(),
            presence_key: self.presence_key.to_string(),
        })
    }

    fn track(&mut self, record: &PresenceRecord) -> Result<(), ChannelError> {
        self.queue(OutboundMessage::Track { payload: record.clone() })
    }

    fn send(&mut self, event: &str, payload: &MoveBroadcast) -> Result<(), ChannelError> {
        self.queue(OutboundMessage::Broadcast {
            event: event.to_string(),
            payload: payload.clone(),
        })
    }
}

/// A live WebSocket connection.
pub struct WsConnection {
    /// Outbound channel for the client core.
    pub channel: WsChannel,
    /// Decoded inbound events.
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
    /// Background I/O task; ends when the socket closes or the channel is dropped.
    pub task: JoinHandle<()>,
}

/// Connect to `url` and join `topic` as `presence_key`.
///
/// The subscription request is not sent here; call
/// [`PresenceChannel::subscribe`] once the core is ready to receive events.
pub async fn connect(
    url: &str,
    topic: &str,
    presence_key: ParticipantId,
) -> Result<WsConnection, ChannelError> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("Connected to {}", url);

    let (mut write, mut read) = ws_stream.split();
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ChannelEvent>();

    let task = tokio::spawn(async move {
        // Reader
        let reader_events = events_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ChannelEvent::from_json(&text) {
                        Ok(event) => {
                            if reader_events.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to parse channel event: {} - {}", e, text),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Channel closed connection");
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            let _ = reader_events.send(ChannelEvent::Status { status: ChannelStatus::Closed });
            debug!("Reader task ended");
        });

        // Writer
        while let Some(json) = outgoing_rx.recv().await {
            if let Err(e) = write.send(Message::Text(json)).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
        let _ = write.close().await;

        debug!("Writer loop ended");
        reader.abort();
    });

    Ok(WsConnection {
        channel: WsChannel {
            topic: topic.to_string(),
            presence_key,
            sender: outgoing_tx,
        },
        events: events_rx,
        task,
    })
}
