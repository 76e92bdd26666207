//! # Drawing Client Library
//!
//! Client-side state for the multiplayer drawing toys. The library owns
//! everything between the socket and the renderer: the connection to the
//! relay, the local brush, and the roster of remote brushes rebuilt from the
//! event stream. Rendering itself and the webcam/mouse input that steers the
//! local brush are outside this crate; a renderer consumes [`roster::Roster`]
//! each frame.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! WebSocket connection to the relay: sending update events, receiving the
//! decoded event stream, and splitting into halves for use inside a frame
//! loop.
//!
//! ### Brush Module (`brush`)
//! The avatar entity. Holds position, a speed-limited direction vector, and
//! the bounded trail of past positions the renderer draws. Tolerates the
//! non-validated payloads the relay forwards: non-finite direction input
//! degrades to standstill instead of corrupting the position.
//!
//! ### Roster Module (`roster`)
//! The per-tab session context. Applies received events (color assignment,
//! peer updates, departures) and advances all brushes one frame at a time.
//! Peers are created on first sight from the payload's position and color
//! arguments, matching how the relay tags updates.

pub mod brush;
pub mod network;
pub mod roster;
