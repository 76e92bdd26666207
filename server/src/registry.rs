//! Session registry for the relay
//!
//! Tracks each live connection's assigned identifier, display color, and
//! outbound message queue. The registry is owned exclusively by the relay's
//! network layer; sessions are ephemeral and every trace of one is discarded
//! on removal. There is no position history here by design: the relay
//! forwards each update independently and statelessly.

use log::info;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// One live connection: identifier, lifetime-immutable color, and the
/// sending half of its outbound queue.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned at connect time.
    pub id: u32,
    /// Display color assigned once at connect time, `#RRGGBB`.
    pub color: String,
    /// Outbound queue drained by the connection's writer task.
    outbox: mpsc::UnboundedSender<Message>,
}

/// All currently-connected sessions, keyed by identifier.
///
/// Identifiers are monotonic from 1 and never reused within a server
/// lifetime, so a departure event can always be attributed unambiguously.
pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
    next_session_id: u32,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
        }
    }

    /// Registers a new session and returns its identifier together with the
    /// receiving half of its outbound queue.
    pub fn add_session(&mut self, color: String) -> (u32, mpsc::UnboundedReceiver<Message>) {
        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let (outbox, inbox) = mpsc::unbounded_channel();
        info!("Session {} connected ({})", session_id, color);
        self.sessions.insert(
            session_id,
            Session {
                id: session_id,
                color,
                outbox,
            },
        );

        (session_id, inbox)
    }

    /// Removes a session, returning it only on the first removal. The
    /// departure notifier keys off the `Some` to emit exactly one event per
    /// disconnect.
    pub fn remove_session(&mut self, session_id: &u32) -> Option<Session> {
        let removed = self.sessions.remove(session_id);
        if let Some(session) = &removed {
            info!("Session {} disconnected", session.id);
        }
        removed
    }

    /// Snapshot of every session's outbound queue, for broadcast fan-out.
    pub fn outboxes(&self) -> Vec<(u32, mpsc::UnboundedSender<Message>)> {
        self.sessions
            .iter()
            .map(|(id, session)| (*id, session.outbox.clone()))
            .collect()
    }

    /// The color assigned to a session, if it is still connected.
    pub fn color_of(&self, session_id: &u32) -> Option<&str> {
        self.sessions
            .get(session_id)
            .map(|session| session.color.as_str())
    }

    /// Returns the number of currently connected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are currently connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
