//! Relay network layer: WebSocket accept loop, per-connection tasks, and
//! broadcast fan-out
//!
//! Each connection gets two halves: a reader that decodes inbound frames and
//! hands them to the relay, and a writer that drains the session's outbound
//! queue into the socket. The relay itself is stateless per message; the only
//! shared state is the session registry, read at the moment of fan-out.

use crate::color::random_display_color;
use crate::registry::SessionRegistry;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use shared::{Event, RelayConfig, EVENT_COLOR};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;

/// The relay server: accepts connections and fans client updates out to
/// every other connection.
pub struct Server {
    listener: TcpListener,
    sessions: Arc<RwLock<SessionRegistry>>,
    config: Arc<RelayConfig>,
}

impl Server {
    /// Binds the listener. Pass port 0 to let the OS pick one (tests do).
    pub async fn bind(addr: &str, config: RelayConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Relay listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            sessions: Arc::new(RwLock::new(SessionRegistry::new())),
            config: Arc::new(config),
        })
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; one task per connection. A failed accept is logged and
    /// the loop keeps serving everyone else.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let sessions = Arc::clone(&self.sessions);
                    let config = Arc::clone(&self.config);
                    tokio::spawn(async move {
                        handle_connection(stream, addr, sessions, config).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Runs one connection from handshake to departure notification.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<RwLock<SessionRegistry>>,
    config: Arc<RelayConfig>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let color = random_display_color(&mut rand::thread_rng());
    let (session_id, mut inbox) = {
        let mut sessions = sessions.write().await;
        sessions.add_session(color.clone())
    };
    debug!("Session {} is {}", session_id, addr);

    let (mut sink, mut source) = ws_stream.split();

    // The assigned color goes out once, before any relayed traffic.
    if config.assign_colors {
        match Event::new(EVENT_COLOR, vec![Value::from(color.clone())]).encode() {
            Ok(text) => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("Failed to send color to session {}: {}", session_id, e);
                }
            }
            Err(e) => error!("Failed to encode color event: {}", e),
        }
    }

    // Writer half: drain the session's queue into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = inbox.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Reader half: relay update events to everyone else.
    let reader_sessions = Arc::clone(&sessions);
    let reader_config = Arc::clone(&config);
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = source.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    debug!("Session {} socket error: {}", session_id, e);
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    relay_frame(&text, session_id, &color, &reader_sessions, &reader_config)
                        .await;
                }
                Message::Close(_) => break,
                Message::Binary(_) => {
                    warn!("Session {} sent a binary frame, dropping", session_id);
                }
                // Ping/pong liveness is the transport's concern.
                _ => {}
            }
        }
    });

    // Either half ending means the connection is done.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let departed = {
        let mut sessions = sessions.write().await;
        sessions.remove_session(&session_id)
    };

    // remove_session yields the session only on first removal, so the
    // departure event goes out exactly once per disconnect.
    if departed.is_some() {
        let notice = Event::new(
            config.departure_event.as_str(),
            vec![Value::from(session_id)],
        );
        broadcast(&notice, Some(session_id), &sessions).await;
    }
}

/// One relay hop: decode the frame, tag it with the sender, fan it out to
/// everyone else. Arguments are never validated or rewritten.
async fn relay_frame(
    text: &str,
    sender_id: u32,
    sender_color: &str,
    sessions: &Arc<RwLock<SessionRegistry>>,
    config: &RelayConfig,
) {
    let event = match Event::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Session {} sent an undecodable frame: {}", sender_id, e);
            return;
        }
    };

    if !config.is_update_event(&event.name) {
        warn!(
            "Session {} sent unexpected event '{}', dropping",
            sender_id, event.name
        );
        return;
    }

    let mut relayed = event.with_sender(sender_id);
    if config.assign_colors {
        relayed.push_arg(sender_color);
    }

    broadcast(&relayed, Some(sender_id), sessions).await;
}

/// Sends an event to every connected session except `exclude`. Enqueues into
/// per-recipient queues and never waits on a slow socket.
async fn broadcast(event: &Event, exclude: Option<u32>, sessions: &Arc<RwLock<SessionRegistry>>) {
    let text = match event.encode() {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode '{}' event: {}", event.name, e);
            return;
        }
    };

    let outboxes = {
        let sessions = sessions.read().await;
        sessions.outboxes()
    };

    for (session_id, outbox) in outboxes {
        if Some(session_id) == exclude {
            continue;
        }

        // A closed outbox belongs to a session already tearing down.
        if outbox.send(Message::Text(text.clone())).is_err() {
            debug!("Session {} outbox closed, skipping", session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::{EVENT_BRUSH, EVENT_BRUSH_LEAVE};
    use tokio::sync::mpsc;

    fn registry_with_sessions(
        count: usize,
    ) -> (
        Arc<RwLock<SessionRegistry>>,
        Vec<(u32, mpsc::UnboundedReceiver<Message>)>,
    ) {
        let mut registry = SessionRegistry::new();
        let mut inboxes = Vec::new();
        for i in 0..count {
            let (id, inbox) = registry.add_session(format!("#00000{}", i));
            inboxes.push((id, inbox));
        }
        (Arc::new(RwLock::new(registry)), inboxes)
    }

    fn expect_text(inbox: &mut mpsc::UnboundedReceiver<Message>) -> String {
        match inbox.try_recv().expect("expected a queued message") {
            Message::Text(text) => text,
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_skips_excluded_sender() {
        let (sessions, mut inboxes) = registry_with_sessions(3);
        let event = Event::new(EVENT_BRUSH_LEAVE, vec![json!(1)]);

        broadcast(&event, Some(inboxes[0].0), &sessions).await;

        assert!(inboxes[0].1.try_recv().is_err());
        for (_, inbox) in &mut inboxes[1..] {
            assert_eq!(expect_text(inbox), r#"["brush.leave",1]"#);
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_exclusion_reaches_everyone() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let event = Event::new(EVENT_BRUSH_LEAVE, vec![json!(9)]);

        broadcast(&event, None, &sessions).await;

        for (_, inbox) in &mut inboxes {
            assert_eq!(expect_text(inbox), r#"["brush.leave",9]"#);
        }
    }

    #[tokio::test]
    async fn test_relay_tags_sender_and_appends_color() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig::default();

        relay_frame(
            r#"["brush",10,20,0.5]"#,
            sender_id,
            "#ABCDEF",
            &sessions,
            &config,
        )
        .await;

        let received = Event::decode(&expect_text(&mut inboxes[1].1)).unwrap();
        assert_eq!(received.name, EVENT_BRUSH);
        assert_eq!(
            received.args,
            vec![
                json!(sender_id),
                json!(10),
                json!(20),
                json!(0.5),
                json!("#ABCDEF")
            ]
        );
        // Never echoed back to the sender.
        assert!(inboxes[0].1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_without_color_assignment_is_verbatim() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig {
            assign_colors: false,
            ..RelayConfig::default()
        };

        relay_frame(r#"["brush",1,2,3]"#, sender_id, "#ABCDEF", &sessions, &config).await;

        let received = Event::decode(&expect_text(&mut inboxes[1].1)).unwrap();
        assert_eq!(
            received.args,
            vec![json!(sender_id), json!(1), json!(2), json!(3)]
        );
    }

    #[tokio::test]
    async fn test_relay_forwards_malformed_args_untouched() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig {
            assign_colors: false,
            ..RelayConfig::default()
        };

        // Nulls and strings where numbers were expected still get relayed;
        // tolerating them is the receiving client's job.
        relay_frame(
            r#"["brush",null,"wat"]"#,
            sender_id,
            "#ABCDEF",
            &sessions,
            &config,
        )
        .await;

        let received = Event::decode(&expect_text(&mut inboxes[1].1)).unwrap();
        assert_eq!(
            received.args,
            vec![json!(sender_id), json!(null), json!("wat")]
        );
    }

    #[tokio::test]
    async fn test_relay_drops_non_update_events() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig::default();

        // Clients cannot forge server-originated events.
        relay_frame(r#"["brush.leave",2]"#, sender_id, "#ABCDEF", &sessions, &config).await;
        relay_frame(
            r##"["color","#FFFFFF"]"##,
            sender_id,
            "#ABCDEF",
            &sessions,
            &config,
        )
        .await;

        assert!(inboxes[1].1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_drops_undecodable_frames() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig::default();

        relay_frame("not json", sender_id, "#ABCDEF", &sessions, &config).await;
        relay_frame("[]", sender_id, "#ABCDEF", &sessions, &config).await;

        assert!(inboxes[1].1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relaying_twice_is_stateless() {
        let (sessions, mut inboxes) = registry_with_sessions(2);
        let sender_id = inboxes[0].0;
        let config = RelayConfig::default();

        relay_frame(r#"["brush",1,2]"#, sender_id, "#ABCDEF", &sessions, &config).await;
        relay_frame(r#"["brush",1,2]"#, sender_id, "#ABCDEF", &sessions, &config).await;

        let first = expect_text(&mut inboxes[1].1);
        let second = expect_text(&mut inboxes[1].1);
        assert_eq!(first, second);
    }
}
