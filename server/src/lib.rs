//! # Relay Server Library
//!
//! This library implements the position-broadcast relay: the one server-side
//! component of the drawing toys. The relay is deliberately thin. It keeps
//! no history, performs no validation of update payloads, and resolves no
//! conflicts; every inbound update is forwarded independently to all other
//! connections with the sender's identifier prepended.
//!
//! ## Responsibilities
//!
//! ### Session Registry
//! Each connection gets a unique identifier and, in the color-assigning
//! protocol revision, a random display color, both fixed for the connection's
//! lifetime. All per-session state fits in one small record and is discarded
//! on disconnect.
//!
//! ### Broadcast Relay
//! Update events are fanned out verbatim to every other connection. No
//! acknowledgment is returned to the sender, nothing is ever echoed back to
//! it, and there is no ordering guarantee beyond the transport's own
//! per-connection ordering.
//!
//! ### Departure Notifier
//! When a connection ends, cleanly or not, every remaining connection
//! receives exactly one departure event carrying the identifier that left.
//!
//! ## Architecture
//!
//! One tokio task pair per connection (reader + writer) over a WebSocket,
//! with the registry behind a read-write lock. Fan-out only enqueues into
//! per-recipient unbounded queues; the relay never awaits a slow socket, so
//! one connection's behavior cannot stall another's. A connection's bad
//! input is logged and dropped without affecting the rest of the server.
//!
//! ## Module Organization
//!
//! - [`registry`]: session records and identifier assignment
//! - [`network`]: accept loop, connection tasks, relay and broadcast
//! - [`color`]: random display-color generation

pub mod color;
pub mod network;
pub mod registry;
