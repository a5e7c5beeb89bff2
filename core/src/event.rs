//! Event types and log entries.
//!
//! An entry in the event log pairs a closed [`EventType`] with a payload whose
//! shape depends on that type. Both live in one enum, [`Event`], so a payload
//! of the wrong shape for its type cannot be constructed.
//!
//! # JSON Shape
//!
//! ```
//! use formlog_core::event::{Event, InputChange};
//! use formlog_core::form::FormField;
//!
//! let event = Event::input_change(FormField::Price, 10.0);
//! let json = serde_json::to_value(&event).unwrap();
//! assert_eq!(
//!     json,
//!     serde_json::json!({"type": "input_change", "data": {"field": "price", "value": 10.0}})
//! );
//! ```

use crate::form::FormField;
use crate::storage::StorageKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for event-type parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid event type: {0}")]
pub struct ParseEventTypeError(pub String);

/// The closed set of event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A form field was edited
    InputChange,
    /// A button was pressed
    ButtonClick,
    /// A response arrived (network reply, storage read)
    ResponseReceived,
}

impl EventType {
    /// Every variant, in declaration order
    pub const ALL: [Self; 3] = [Self::InputChange, Self::ButtonClick, Self::ResponseReceived];

    /// Wire name of the type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputChange => "input_change",
            Self::ButtonClick => "button_click",
            Self::ResponseReceived => "response_received",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEventTypeError(s.to_string()))
    }
}

/// Payload of an `input_change` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputChange {
    /// Field that changed
    pub field: FormField,
    /// New value of the field
    pub value: f64,
}

/// Payload of a `button_click` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonClick {
    /// Name of the button, e.g. `"submit"`
    pub button: String,
}

/// Payload of a `response_received` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseReceived {
    /// Status code of the response
    pub status: u16,
    /// Response body
    pub body: serde_json::Value,
}

/// An event kind together with its optional payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// A form field was edited
    InputChange(Option<InputChange>),
    /// A button was pressed
    ButtonClick(Option<ButtonClick>),
    /// A response arrived
    ResponseReceived(Option<ResponseReceived>),
}

impl Event {
    /// `input_change` with its field and new value
    #[must_use]
    pub const fn input_change(field: FormField, value: f64) -> Self {
        Self::InputChange(Some(InputChange { field, value }))
    }

    /// `button_click` naming the button
    #[must_use]
    pub fn button_click(button: impl Into<String>) -> Self {
        Self::ButtonClick(Some(ButtonClick {
            button: button.into(),
        }))
    }

    /// `response_received` with status and body
    #[must_use]
    pub const fn response_received(status: u16, body: serde_json::Value) -> Self {
        Self::ResponseReceived(Some(ResponseReceived { status, body }))
    }

    /// Builds an event from a type and an untyped payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `data` does not match the payload
    /// shape of `event_type`.
    pub fn from_parts(
        event_type: EventType,
        data: Option<serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        Ok(match (event_type, data) {
            (EventType::InputChange, None) => Self::InputChange(None),
            (EventType::ButtonClick, None) => Self::ButtonClick(None),
            (EventType::ResponseReceived, None) => Self::ResponseReceived(None),
            (EventType::InputChange, Some(v)) => Self::InputChange(Some(serde_json::from_value(v)?)),
            (EventType::ButtonClick, Some(v)) => Self::ButtonClick(Some(serde_json::from_value(v)?)),
            (EventType::ResponseReceived, Some(v)) => {
                Self::ResponseReceived(Some(serde_json::from_value(v)?))
            },
        })
    }

    /// The closed type of this event
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::InputChange(_) => EventType::InputChange,
            Self::ButtonClick(_) => EventType::ButtonClick,
            Self::ResponseReceived(_) => EventType::ResponseReceived,
        }
    }

    /// Whether a payload is attached
    #[must_use]
    pub const fn has_data(&self) -> bool {
        match self {
            Self::InputChange(data) => data.is_some(),
            Self::ButtonClick(data) => data.is_some(),
            Self::ResponseReceived(data) => data.is_some(),
        }
    }
}

/// Identity of a log entry.
///
/// Ids are assigned by the log, start at 1, and strictly increase in
/// insertion order. They are never reused, even after the log is cleared.
///
/// # Examples
///
/// ```
/// use formlog_core::event::EntryId;
///
/// let first = EntryId::FIRST;
/// assert_eq!(first.value(), 1);
/// assert!(first.next() > first);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// Id given to the first entry of a new log.
    pub const FIRST: Self = Self(1);

    /// Create an `EntryId` with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the following id (current + 1).
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EntryId> for u64 {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

/// One immutable record in the event log.
///
/// Entries are only created by the log itself; callers receive clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Assigned by the log
    pub id: EntryId,
    /// Assigned by the log at insertion
    pub timestamp: DateTime<Utc>,
    /// Type and payload
    #[serde(flatten)]
    pub event: Event,
    /// Human-readable summary, possibly empty
    pub message: String,
    /// Storage key touched by this event, if any
    #[serde(
        rename = "localStorage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_storage: Option<StorageKey>,
}

impl LogEntry {
    /// The closed type of this entry
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event.event_type()
    }
}
