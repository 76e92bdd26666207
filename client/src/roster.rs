//! Session context: reconstructs the field of brushes from the event stream
//!
//! The relay keeps no history, so everything a renderer needs is rebuilt
//! here, per tab, from the updates that arrive. The roster is an explicit
//! object handed to whoever drives the frame loop; there is no ambient
//! module-level state.
//!
//! The roster interprets the direction-vector revision of the update payload:
//! `[sender, dX, dY, posX, posY, color]` after the relay hop. Other protocol
//! revisions reuse the relay unchanged with their own interpretation.

use crate::brush::Brush;
use log::{debug, info, warn};
use shared::{Event, EVENT_BRUSH_DIE, EVENT_BRUSH_LEAVE, EVENT_COLOR};
use std::collections::HashMap;

/// Fallback for peers whose update carries no usable color argument.
const DEFAULT_PEER_COLOR: &str = "#888888";

/// Everything one connected tab knows: its own brush and every peer brush it
/// has seen so far.
pub struct Roster {
    pub me: Brush,
    peers: HashMap<u32, Brush>,
    assigned_color: Option<String>,
}

impl Roster {
    pub fn new(me: Brush) -> Self {
        Roster {
            me,
            peers: HashMap::new(),
            assigned_color: None,
        }
    }

    /// The color the relay assigned to this session, once received.
    pub fn assigned_color(&self) -> Option<&str> {
        self.assigned_color.as_deref()
    }

    pub fn peer(&self, sender: u32) -> Option<&Brush> {
        self.peers.get(&sender)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> impl Iterator<Item = (&u32, &Brush)> {
        self.peers.iter()
    }

    /// Applies one received event to the session state. Unknown events are
    /// logged and ignored; malformed arguments degrade to defaults instead of
    /// tearing the session down.
    pub fn apply(&mut self, event: &Event) {
        if event.name == EVENT_COLOR {
            match event.str_arg(0) {
                Some(color) => {
                    self.me.color = color.to_string();
                    self.assigned_color = Some(color.to_string());
                }
                None => warn!("Color event without a color argument"),
            }
            return;
        }

        if event.name == EVENT_BRUSH_LEAVE || event.name == EVENT_BRUSH_DIE {
            match event.id_arg(0) {
                Some(sender) => self.depart(sender),
                None => warn!("Departure event without a sender identifier"),
            }
            return;
        }

        let sender = match event.id_arg(0) {
            Some(sender) => sender,
            None => {
                warn!(
                    "Update '{}' without a sender identifier, dropping",
                    event.name
                );
                return;
            }
        };

        let brush = self.peers.entry(sender).or_insert_with(|| {
            let color = event.str_arg(5).unwrap_or(DEFAULT_PEER_COLOR);
            info!("First sight of sender {} ({})", sender, color);
            Brush::new(event.f32_arg(3), event.f32_arg(4), color)
        });
        brush.set_direction(event.f32_arg(1), event.f32_arg(2));
    }

    /// Advances every brush one frame.
    pub fn step(&mut self) {
        self.me.step();
        for brush in self.peers.values_mut() {
            brush.step();
        }
    }

    fn depart(&mut self, sender: u32) {
        // The trail stays on screen; the brush just stops moving.
        if let Some(brush) = self.peers.get_mut(&sender) {
            brush.halt();
            debug!("Sender {} left, halting their brush", sender);
        }
    }
}
