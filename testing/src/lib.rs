//! # Formlog Testing
//!
//! Testing utilities and helpers for formlog.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `SteppingClock`)
//! - In-memory storage doubles (`InMemoryStorage`, `FailingStorage`)
//! - A Given-When-Then harness for reducers (`ReducerTest`)
//!
//! ## Example
//!
//! ```
//! use formlog_core::event_log::{EventLog, LogRequest};
//! use formlog_core::event::Event;
//! use formlog_testing::test_clock;
//!
//! let log = EventLog::new(test_clock());
//! let entry = log.append(LogRequest::new(Event::button_click("submit"), "submit"));
//! assert_eq!(entry.timestamp, test_clock().time());
//! ```

use chrono::{DateTime, Duration, Utc};
use formlog_core::environment::Clock;

pub mod storage_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use formlog_testing::mocks::FixedClock;
    /// use formlog_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// The time this clock always reports
        #[must_use]
        pub const fn time(&self) -> DateTime<Utc> {
            self.time
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that moves by a fixed step on every read.
    ///
    /// A negative step makes time run backwards, which is useful for checking
    /// that the event log keeps timestamps non-decreasing.
    ///
    /// # Example
    ///
    /// ```
    /// use formlog_testing::mocks::SteppingClock;
    /// use formlog_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = SteppingClock::new(Utc::now(), Duration::seconds(1));
    /// let t1 = clock.now();
    /// let t2 = clock.now();
    /// assert_eq!(t2 - t1, Duration::seconds(1));
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Create a clock whose first reading is `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self
                .next
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use storage_mocks::{FailingStorage, InMemoryStorage};
