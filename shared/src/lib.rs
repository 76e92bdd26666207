use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FIELD_WIDTH: f32 = 8000.0;
pub const FIELD_HEIGHT: f32 = 7000.0;
pub const MAX_BRUSH_SPEED: f32 = 15.0;
pub const HALT_THRESHOLD: f32 = 4.0;
pub const TRAIL_CAP: usize = 800;

pub const EVENT_BRUSH: &str = "brush";
pub const EVENT_BRUSH_DIRECTION: &str = "brush.direction";
pub const EVENT_BRUSH_JOIN: &str = "brush.join";
pub const EVENT_BRUSH_LEAVE: &str = "brush.leave";
pub const EVENT_BRUSH_DIE: &str = "brush.die";
pub const EVENT_COLOR: &str = "color";

/// Client-originated event names the relay forwards. Everything else coming
/// in from a client is dropped, so nobody can forge server-originated events.
pub const UPDATE_EVENTS: &[&str] = &[EVENT_BRUSH, EVENT_BRUSH_DIRECTION, EVENT_BRUSH_JOIN];

/// One wire message: an event name plus positional arguments.
///
/// On the wire this is a flat JSON array with the name first, so
/// `Event::new("brush", vec![10.into(), 20.into()])` encodes as
/// `["brush",10,20]`. Arguments are opaque to the relay; they round-trip
/// verbatim, including nulls and whatever numbers the sender produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub args: Vec<Value>,
}

impl Event {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Event {
            name: name.into(),
            args,
        }
    }

    /// Encodes the event into its wire form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes one wire frame. Fails if the frame is not a JSON array whose
    /// first element is a string.
    pub fn decode(text: &str) -> Result<Event, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns a copy with the sender identifier prepended to the arguments.
    /// This is the transformation the relay applies on every hop.
    pub fn with_sender(&self, sender_id: u32) -> Event {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(Value::from(sender_id));
        args.extend(self.args.iter().cloned());
        Event {
            name: self.name.clone(),
            args,
        }
    }

    /// Appends one argument (used by the relay to attach the sender's color).
    pub fn push_arg(&mut self, value: impl Into<Value>) {
        self.args.push(value.into());
    }

    /// Numeric argument at `index`, or 0.0 when missing or not a number.
    /// Receivers use this so a malformed payload degrades instead of panicking.
    pub fn f32_arg(&self, index: usize) -> f32 {
        self.args
            .get(index)
            .and_then(Value::as_f64)
            .map(|value| value as f32)
            .unwrap_or(0.0)
    }

    /// String argument at `index`, if present and actually a string.
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Value::as_str)
    }

    /// Sender-identifier argument at `index`, if present and a non-negative
    /// integer that fits in a u32.
    pub fn id_arg(&self, index: usize) -> Option<u32> {
        self.args
            .get(index)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(&self.name)?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut values = Vec::<Value>::deserialize(deserializer)?;
        if values.is_empty() {
            return Err(de::Error::invalid_length(
                0,
                &"an event name followed by its arguments",
            ));
        }
        let name = match values.remove(0) {
            Value::String(name) => name,
            other => {
                return Err(de::Error::custom(format!(
                    "event name must be a string, got {}",
                    other
                )))
            }
        };
        Ok(Event { name, args: values })
    }
}

/// Relay behavior that differs between the protocol revisions observed in the
/// wild. The relay never interprets update payloads, so these three knobs are
/// the entire configurable surface.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Client events that get relayed (defaults to the full superset).
    pub update_events: Vec<String>,
    /// Event name broadcast when a session disconnects.
    pub departure_event: String,
    /// Whether the server assigns a color per session and attaches it to
    /// relayed updates.
    pub assign_colors: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            update_events: UPDATE_EVENTS.iter().map(|name| name.to_string()).collect(),
            departure_event: EVENT_BRUSH_LEAVE.to_string(),
            assign_colors: true,
        }
    }
}

impl RelayConfig {
    pub fn is_update_event(&self, name: &str) -> bool {
        self.update_events.iter().any(|event| event == name)
    }
}

/// A well-formed display color is `#` followed by exactly six uppercase
/// hexadecimal digits.
pub fn is_display_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            digits.len() == 6
                && digits
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        }
        None => false,
    }
}
