//! Client connection handling over WebSocket.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use shared::Event;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One live connection to the relay.
pub struct Connection {
    sink: EventSink,
    source: EventSource,
}

/// Sending half of a split connection.
pub struct EventSink {
    sink: SplitSink<WsStream, Message>,
}

/// Receiving half of a split connection.
pub struct EventSource {
    source: SplitStream<WsStream>,
}

impl Connection {
    /// Connects to the relay and performs the WebSocket handshake.
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (ws_stream, _) = connect_async(url).await?;
        debug!("Connected to {}", url);

        let (sink, source) = ws_stream.split();
        Ok(Connection {
            sink: EventSink { sink },
            source: EventSource { source },
        })
    }

    /// Sends one event to the relay.
    pub async fn send(&mut self, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
        self.sink.send(event).await
    }

    /// Returns the next decodable event, or `None` once the server is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.source.recv().await
    }

    /// Closes the connection cleanly.
    pub async fn close(self) {
        self.sink.close().await;
    }

    /// Splits into independently-owned halves, so a frame loop can await
    /// incoming events while sending updates from another select arm.
    pub fn into_split(self) -> (EventSink, EventSource) {
        (self.sink, self.source)
    }
}

impl EventSink {
    pub async fn send(&mut self, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
        let text = event.encode()?;
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn close(mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }
}

impl EventSource {
    /// Returns the next decodable event. Undecodable frames are logged and
    /// skipped; `None` means the server closed the connection.
    pub async fn recv(&mut self) -> Option<Event> {
        while let Some(message) = self.source.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    warn!("Socket error: {}", e);
                    return None;
                }
            };

            match message {
                Message::Text(text) => match Event::decode(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => warn!("Undecodable frame from relay: {}", e),
                },
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }
}
