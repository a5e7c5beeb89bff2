//! Append-only event log.
//!
//! The log assigns every entry its id and timestamp. Callers describe what
//! happened with a [`LogRequest`] and get back an immutable copy of the stored
//! [`LogEntry`].
//!
//! # Ordering
//!
//! - Ids start at [`EntryId::FIRST`] and increase by one per append.
//! - Timestamps never decrease. If the clock reports a time earlier than the
//!   previous entry, the previous timestamp is reused.
//! - `clear()` drops the entries but keeps the id counter, so ids stay unique
//!   for the lifetime of the log.
//!
//! # Concurrency
//!
//! All operations take `&self`. One mutex guards the counter, the last
//! timestamp and the entries; the clock is read while it is held, so id order
//! and timestamp order agree even when several threads append at once.
//!
//! # Example
//!
//! ```
//! use formlog_core::environment::SystemClock;
//! use formlog_core::event::{Event, EventType};
//! use formlog_core::event_log::{EventLog, LogRequest};
//! use formlog_core::form::FormField;
//!
//! let log = EventLog::new(SystemClock);
//! log.append(LogRequest::new(Event::input_change(FormField::Price, 10.0), "price changed"));
//! log.append(LogRequest::new(Event::button_click("submit"), "submit"));
//!
//! let ids: Vec<u64> = log.entries().iter().map(|e| e.id.value()).collect();
//! assert_eq!(ids, vec![1, 2]);
//! assert_eq!(log.find_by_type(EventType::ButtonClick).len(), 1);
//! ```

use crate::environment::Clock;
use crate::event::{EntryId, Event, EventType, LogEntry};
use crate::storage::StorageKey;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors from the untyped append path.
#[derive(Error, Debug)]
pub enum EventLogError {
    /// The type name is not one of the supported event types.
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),

    /// The payload does not have the shape required by the event type.
    #[error("Invalid payload for {event_type}: {reason}")]
    InvalidPayload {
        /// Type the payload was given for
        event_type: EventType,
        /// Why decoding failed
        reason: String,
    },

    /// The storage key is empty.
    #[error("Invalid storage key: {0}")]
    InvalidStorageKey(String),
}

/// Everything the caller supplies for a new entry.
///
/// The log fills in the id and the timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRequest {
    /// Type and payload
    pub event: Event,
    /// Human-readable summary
    pub message: String,
    /// Storage key touched, if any
    pub local_storage: Option<StorageKey>,
}

impl LogRequest {
    /// Request without a storage key
    #[must_use]
    pub fn new(event: Event, message: impl Into<String>) -> Self {
        Self {
            event,
            message: message.into(),
            local_storage: None,
        }
    }

    /// Marks the entry as recording a storage read or write under `key`
    #[must_use]
    pub fn with_storage_key(mut self, key: StorageKey) -> Self {
        self.local_storage = Some(key);
        self
    }
}

#[derive(Debug)]
struct LogInner {
    next_id: EntryId,
    last_timestamp: Option<DateTime<Utc>>,
    entries: Vec<LogEntry>,
}

/// Append-only, insertion-ordered event log.
pub struct EventLog {
    clock: Arc<dyn Clock>,
    inner: Mutex<LogInner>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("EventLog")
            .field("next_id", &inner.next_id)
            .field("len", &inner.entries.len())
            .finish_non_exhaustive()
    }
}

impl EventLog {
    /// Creates an empty log stamping entries with `clock`
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_shared_clock(Arc::new(clock))
    }

    /// Creates an empty log from an already shared clock
    #[must_use]
    pub fn with_shared_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(LogInner {
                next_id: EntryId::FIRST,
                last_timestamp: None,
                entries: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogInner> {
        // Entries are pushed only after they are fully built, so a poisoned
        // guard still holds a consistent log.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry and returns a copy of it.
    ///
    /// This is the only operation that adds to the log.
    pub fn append(&self, request: LogRequest) -> LogEntry {
        let mut inner = self.lock();

        let now = self.clock.now();
        let timestamp = match inner.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };

        let entry = LogEntry {
            id: inner.next_id,
            timestamp,
            event: request.event,
            message: request.message,
            local_storage: request.local_storage,
        };

        inner.next_id = inner.next_id.next();
        inner.last_timestamp = Some(timestamp);
        inner.entries.push(entry.clone());

        entry
    }

    /// Appends an entry described by untyped parts.
    ///
    /// This is the boundary for callers that only have strings and JSON, e.g.
    /// a UI layer forwarding `{type, message, data, localStorage}`.
    ///
    /// # Errors
    ///
    /// - [`EventLogError::InvalidEventType`] if `event_type` is not a known type
    /// - [`EventLogError::InvalidPayload`] if `data` does not match the type
    /// - [`EventLogError::InvalidStorageKey`] if `storage_key` is blank
    ///
    /// The log is unchanged on error.
    pub fn append_raw(
        &self,
        event_type: &str,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
        storage_key: Option<&str>,
    ) -> Result<LogEntry, EventLogError> {
        let parsed_type: EventType = event_type
            .parse()
            .map_err(|_| EventLogError::InvalidEventType(event_type.to_string()))?;

        let event = Event::from_parts(parsed_type, data).map_err(|e| {
            EventLogError::InvalidPayload {
                event_type: parsed_type,
                reason: e.to_string(),
            }
        })?;

        let local_storage = storage_key
            .map(|key| {
                key.parse::<StorageKey>()
                    .map_err(|e| EventLogError::InvalidStorageKey(e.to_string()))
            })
            .transpose()?;

        Ok(self.append(LogRequest {
            event,
            message: message.into(),
            local_storage,
        }))
    }

    /// Snapshot of all entries in insertion order
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    /// Entries of one type, in insertion order
    #[must_use]
    pub fn find_by_type(&self, event_type: EventType) -> Vec<LogEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Entries that touched the given storage key, in insertion order
    #[must_use]
    pub fn find_by_storage_key(&self, key: &StorageKey) -> Vec<LogEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.local_storage.as_ref() == Some(key))
            .cloned()
            .collect()
    }

    /// Entry with the given id, if it is still in the log
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<LogEntry> {
        let inner = self.lock();
        // Ids are sorted, so binary search is valid even after a clear.
        inner
            .entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|index| inner.entries[index].clone())
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<LogEntry> {
        self.lock().entries.last().cloned()
    }

    /// Number of entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the log holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id the next append will receive
    #[must_use]
    pub fn next_id(&self) -> EntryId {
        self.lock().next_id
    }

    /// Removes every entry. The id counter keeps counting.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Pretty-printed JSON array of the current entries.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::form::FormField;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock returning a scripted sequence of offsets (in seconds) from a base.
    struct ScriptedClock {
        base: DateTime<Utc>,
        offsets: Mutex<Vec<i64>>,
        last: AtomicI64,
    }

    impl ScriptedClock {
        fn new(offsets: Vec<i64>) -> Self {
            let mut offsets = offsets;
            offsets.reverse();
            Self {
                base: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                offsets: Mutex::new(offsets),
                last: AtomicI64::new(0),
            }
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            let offset = self
                .offsets
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| self.last.load(Ordering::SeqCst));
            self.last.store(offset, Ordering::SeqCst);
            self.base + Duration::seconds(offset)
        }
    }

    fn log() -> EventLog {
        EventLog::new(ScriptedClock::new(vec![]))
    }

    fn click(name: &str) -> LogRequest {
        LogRequest::new(Event::button_click(name), name)
    }

    #[test]
    fn first_two_entries_get_ids_one_and_two() {
        let log = log();
        log.append(LogRequest::new(
            Event::input_change(FormField::Price, 10.0),
            "price changed",
        ));
        log.append(LogRequest::new(Event::ButtonClick(None), "submit"));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, EntryId::new(1));
        assert_eq!(entries[1].id, EntryId::new(2));
        assert_eq!(entries[0].event_type(), EventType::InputChange);
        assert_eq!(entries[1].event_type(), EventType::ButtonClick);
        assert_eq!(
            entries[0].event,
            Event::input_change(FormField::Price, 10.0)
        );
    }

    #[test]
    fn append_returns_stored_copy() {
        let log = log();
        let returned = log.append(click("submit").with_storage_key(StorageKey::new("formData")));
        assert_eq!(log.last(), Some(returned.clone()));
        assert_eq!(log.get(returned.id), Some(returned));
    }

    #[test]
    fn entries_is_idempotent() {
        let log = log();
        log.append(click("a"));
        log.append(click("b"));
        assert_eq!(log.entries(), log.entries());
    }

    #[test]
    fn unsupported_type_is_rejected_without_change() {
        let log = log();
        log.append(click("a"));

        let result = log.append_raw("unsupported_type", "nope", None, None);

        assert!(matches!(
            result,
            Err(EventLogError::InvalidEventType(ref t)) if t == "unsupported_type"
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(log.next_id(), EntryId::new(2));
    }

    #[test]
    fn append_raw_accepts_matching_payload() {
        let log = log();
        let entry = log
            .append_raw(
                "input_change",
                "qty changed",
                Some(serde_json::json!({"field": "qty", "value": 3.0})),
                Some("formData"),
            )
            .unwrap();

        assert_eq!(entry.event, Event::input_change(FormField::Qty, 3.0));
        assert_eq!(entry.local_storage, Some(StorageKey::new("formData")));
    }

    #[test]
    fn append_raw_rejects_mismatched_payload_and_blank_key() {
        let log = log();

        let payload = log.append_raw(
            "button_click",
            "click",
            Some(serde_json::json!({"status": 200})),
            None,
        );
        assert!(matches!(
            payload,
            Err(EventLogError::InvalidPayload {
                event_type: EventType::ButtonClick,
                ..
            })
        ));

        let key = log.append_raw("button_click", "click", None, Some(""));
        assert!(matches!(key, Err(EventLogError::InvalidStorageKey(_))));

        assert!(log.is_empty());
        assert_eq!(log.next_id(), EntryId::FIRST);
    }

    #[test]
    fn clear_keeps_id_counter() {
        let log = log();
        let issued: Vec<EntryId> = (0..3).map(|i| log.append(click(&i.to_string())).id).collect();

        log.clear();
        assert!(log.entries().is_empty());

        let next = log.append(click("after"));
        assert!(issued.iter().all(|id| next.id > *id));
        assert_eq!(next.id, EntryId::new(4));
        assert_eq!(log.get(EntryId::new(1)), None);
        assert_eq!(log.get(next.id).map(|e| e.id), Some(next.id));
    }

    #[test]
    fn find_by_type_keeps_order() {
        let log = log();
        log.append(click("one"));
        log.append(LogRequest::new(Event::input_change(FormField::Qty, 1.0), "qty"));
        log.append(click("two"));

        let clicks = log.find_by_type(EventType::ButtonClick);
        let messages: Vec<&str> = clicks.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
        assert!(log.find_by_type(EventType::ResponseReceived).is_empty());
    }

    #[test]
    fn find_by_storage_key_filters() {
        let log = log();
        let key = StorageKey::new("formData");
        log.append(click("plain"));
        log.append(click("saved").with_storage_key(key.clone()));

        let touched = log.find_by_storage_key(&key);
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].message, "saved");
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let log = EventLog::new(ScriptedClock::new(vec![10, 5, 20, 0]));
        let stamps: Vec<DateTime<Utc>> = (0..4).map(|_| log.append(click("x")).timestamp).collect();

        assert_eq!(stamps[0], stamps[1]);
        assert!(stamps[2] > stamps[1]);
        assert_eq!(stamps[3], stamps[2]);
    }

    #[test]
    fn concurrent_appends_get_unique_ordered_ids() {
        let log = Arc::new(log());

        std::thread::scope(|scope| {
            for t in 0..8 {
                let log = Arc::clone(&log);
                scope.spawn(move || {
                    for i in 0..50 {
                        log.append(click(&format!("{t}-{i}")));
                    }
                });
            }
        });

        let entries = log.entries();
        assert_eq!(entries.len(), 400);
        assert!(entries.windows(2).all(|w| w[0].id < w[1].id));
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(log.next_id(), EntryId::new(401));
    }

    #[test]
    fn to_json_exports_array() {
        let log = log();
        log.append(click("submit"));
        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(1));
        assert_eq!(json[0]["type"], "button_click");
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(ops in prop::collection::vec(any::<bool>(), 1..60)) {
            let log = log();
            let mut issued = Vec::new();
            for clear in ops {
                if clear {
                    log.clear();
                } else {
                    issued.push(log.append(click("p")).id);
                }
            }
            prop_assert!(issued.windows(2).all(|w| w[0] < w[1]));
            let held: Vec<EntryId> = log.entries().iter().map(|e| e.id).collect();
            prop_assert!(held.iter().all(|id| issued.contains(id)));
            prop_assert!(held.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
