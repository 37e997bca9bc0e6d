//! WebSocket relay client.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::{AckPolicy, RelayClient, RelayConnection, RelayError, RelayMessage};
use crate::event::SignedEvent;

/// Connects to relays over `ws://` or `wss://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsRelayClient;

/// One open WebSocket to a relay.
pub struct WsConnection {
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl RelayClient for WsRelayClient {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> Result<Self::Connection, RelayError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| RelayError::Connect(e.to_string()))?;
        debug!(relay = url, "connected");
        Ok(WsConnection {
            url: url.to_string(),
            stream,
        })
    }
}

#[async_trait::async_trait]
impl RelayConnection for WsConnection {
    async fn publish(&mut self, event: &SignedEvent, ack: AckPolicy) -> Result<(), RelayError> {
        let frame = serde_json::to_string(&("EVENT", event))
            .map_err(|e| RelayError::Send(e.to_string()))?;
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| RelayError::Send(e.to_string()))?;

        if ack == AckPolicy::Sent {
            return Ok(());
        }

        while let Some(frame) = self.stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return Err(RelayError::Closed),
                Ok(_) => continue,
                Err(e) => return Err(RelayError::Protocol(e.to_string())),
            };

            match RelayMessage::parse(&text)? {
                RelayMessage::Ok {
                    event_id,
                    accepted,
                    reason,
                } if event_id == event.id() => {
                    return if accepted {
                        Ok(())
                    } else {
                        Err(RelayError::Rejected(reason))
                    };
                }
                RelayMessage::Notice(notice) => debug!(relay = %self.url, notice = %notice, "relay notice"),
                other => debug!(relay = %self.url, ?other, "ignoring frame"),
            }
        }
        Err(RelayError::Closed)
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(relay = %self.url, error = %e, "close failed");
        }
    }
}
