//! # Formlog Core
//!
//! Core types for a numeric form and the event log that records what
//! happens to it.
//!
//! This crate is the functional core of formlog. It owns the domain state and
//! the append-only log, and describes side effects as values for a runtime to
//! execute.
//!
//! ## Core Concepts
//!
//! - **`FormState`**: `price`, `qty`, the derived `amount`, and an update `counter`
//! - **`EventLog`**: Append-only, identity-bearing record of interactions
//! - **Action**: All inputs to a reducer (field edits, button clicks, responses)
//! - **Reducer**: `(State, Action, Environment) → Result<Effects, Error>`
//! - **Effect**: Side effect descriptions (log appends, storage reads and writes)
//! - **Environment**: Injected dependencies via traits (`Clock`, storage key)
//!
//! ## Example
//!
//! ```
//! use formlog_core::form::{FormState, InputField};
//!
//! let mut form = FormState::new();
//! form.update(InputField::Price, 10.0).unwrap();
//! let data = form.update(InputField::Qty, 3.0).unwrap();
//!
//! assert_eq!(data.amount, 30.0);
//! assert_eq!(data.counter, 2);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Form fields, form state, and the form reducer
pub mod form;

/// Event types, payloads, and log entries
pub mod event;

/// The append-only event log
pub mod event_log;

/// Key/value storage collaborator
pub mod storage;

/// Reducer module - The core trait for business logic
///
/// Reducers validate an action, update state in place, and return effect
/// descriptions. A rejected action returns an error and leaves state as it was.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Error`: Validation failure reported back to the sender
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for FormReducer {
    ///     type State = FormState;
    ///     type Action = FormAction;
    ///     type Environment = FormEnvironment;
    ///     type Error = FormError;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut FormState,
    ///         action: FormAction,
    ///         env: &FormEnvironment,
    ///     ) -> Result<SmallVec<[Effect<FormAction>; 4]>, FormError> {
    ///         match action {
    ///             FormAction::Update { field, value } => {
    ///                 state.update(field, value)?;
    ///                 Ok(smallvec![Effect::None])
    ///             }
    ///             _ => Ok(smallvec![Effect::None]),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The error returned when an action is rejected
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action fails validation. State must be
        /// unchanged in that case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<SmallVec<[Effect<Self::Action>; 4]>, Self::Error>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), so reducers stay deterministic.
pub mod effect {
    use crate::event_log::LogRequest;
    use crate::storage::StorageKey;

    /// Callback turning a storage read into an optional follow-up action
    pub type OnLoad<Action> = fn(StorageKey, Option<String>) -> Option<Action>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in order, stopping at the first failure
        Sequential(Vec<Effect<Action>>),

        /// Append an entry to the event log
        Log(LogRequest),

        /// Write a value to storage
        Persist {
            /// Key to write
            key: StorageKey,
            /// Serialized value
            value: String,
        },

        /// Read a value from storage
        ///
        /// `on_load` receives the key and the stored value (if any). If it returns
        /// `Some`, the action is fed back into the reducer.
        Load {
            /// Key to read
            key: StorageKey,
            /// Maps the read result to a follow-up action
            on_load: OnLoad<Action>,
        },
    }

    // Manual Debug implementation so Action does not need to be Debug for fn pointers
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Log(request) => f.debug_tuple("Effect::Log").field(request).finish(),
                Effect::Persist { key, value } => f
                    .debug_struct("Effect::Persist")
                    .field("key", key)
                    .field("value", value)
                    .finish(),
                Effect::Load { key, .. } => f
                    .debug_struct("Effect::Load")
                    .field("key", key)
                    .finish_non_exhaustive(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Short name of the variant, used for logging and metrics labels
        #[must_use]
        pub const fn kind(&self) -> &'static str {
            match self {
                Effect::None => "none",
                Effect::Sequential(_) => "sequential",
                Effect::Log(_) => "log",
                Effect::Persist { .. } => "persist",
                Effect::Load { .. } => "load",
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// The event log stamps entries with `now()`. A clock that goes backwards is
    /// tolerated: the log clamps timestamps so they never decrease.
    ///
    /// # Examples
    ///
    /// ```
    /// use formlog_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let t1 = clock.now();
    /// let t2 = clock.now();
    /// assert!(t2 >= t1);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
