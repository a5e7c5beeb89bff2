//! # Formlog Runtime
//!
//! Runtime implementation for formlog.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state and runs the reducer for each action
//! - **Effect Executor**: Appends log entries, reads and writes storage, and
//!   feeds follow-up actions back to the reducer
//! - **`SessionConfig`**: Environment-driven configuration
//!
//! Everything runs synchronously. `send` returns once the action, its effects
//! and any actions they produced have all been processed.
//!
//! ## Example
//!
//! ```
//! use formlog_core::environment::SystemClock;
//! use formlog_core::form::{FormAction, InputField};
//! use formlog_runtime::{FormStore, SessionConfig};
//! use formlog_testing::InMemoryStorage;
//! use std::sync::Arc;
//!
//! let store = FormStore::for_form(
//!     &SessionConfig::default(),
//!     Arc::new(SystemClock),
//!     Arc::new(InMemoryStorage::new()),
//! );
//!
//! store.send(FormAction::Update { field: InputField::Price, value: 10.0 }).unwrap();
//! store.send(FormAction::Update { field: InputField::Qty, value: 3.0 }).unwrap();
//!
//! assert_eq!(store.state(|s| s.data().amount), 30.0);
//! assert_eq!(store.event_log().len(), 2);
//! ```

use formlog_core::{effect::Effect, reducer::Reducer};

/// Environment-driven session configuration
pub mod config;

/// Prometheus metrics for observability
pub mod metrics;

pub use config::SessionConfig;

/// Error types for the Store runtime
pub mod error {
    use formlog_core::storage::StorageError;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// # Type Parameters
    ///
    /// - `E`: The reducer's validation error
    #[derive(Error, Debug)]
    pub enum StoreError<E> {
        /// The reducer rejected the action
        ///
        /// State is unchanged for the rejected action.
        #[error("Action rejected: {0}")]
        Rejected(E),

        /// A storage effect failed
        ///
        /// Effects after the failing one were not executed.
        #[error("Storage effect failed: {0}")]
        Storage(#[from] StorageError),
    }
}

pub use error::StoreError;

/// Store module - The runtime for reducers
pub mod store {
    use super::{Effect, Reducer, StoreError};
    use crate::config::SessionConfig;
    use crate::metrics::{EffectMetrics, EventLogMetrics, StorageMetrics, StoreMetrics};
    use formlog_core::environment::Clock;
    use formlog_core::event_log::EventLog;
    use formlog_core::form::{FormAction, FormEnvironment, FormReducer, FormState};
    use formlog_core::storage::{Storage, StorageError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Instant;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store:
    /// 1. Owns the current state (behind a mutex)
    /// 2. Runs the reducer for every action sent to it
    /// 3. Executes the returned effects against the event log and storage
    /// 4. Feeds actions produced by `Load` effects back into the reducer
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer type
    ///
    /// # Concurrency
    ///
    /// `send` holds the state lock until the action and everything it
    /// triggered are done, so concurrent senders are fully serialized.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Mutex<S>,
        reducer: R,
        environment: E,
        event_log: Arc<EventLog>,
        storage: Arc<dyn Storage>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        S: Clone,
        R: Reducer<State = S, Action = A, Environment = E>,
        R::Error: std::fmt::Display,
    {
        /// Create a new store
        ///
        /// # Arguments
        ///
        /// - `initial_state`: Initial state value
        /// - `reducer`: The reducer function
        /// - `environment`: Dependencies injected into the reducer
        /// - `event_log`: Log receiving `Log` effects
        /// - `storage`: Backend for `Persist` and `Load` effects
        #[must_use]
        pub fn new(
            initial_state: S,
            reducer: R,
            environment: E,
            event_log: Arc<EventLog>,
            storage: Arc<dyn Storage>,
        ) -> Self {
            Self {
                state: Mutex::new(initial_state),
                reducer,
                environment,
                event_log,
                storage,
            }
        }

        fn lock_state(&self) -> MutexGuard<'_, S> {
            // Reducers leave state untouched on error, so a poisoned lock
            // still guards consistent state.
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Send an action to the store
        ///
        /// Runs the reducer, executes its effects in order, then processes any
        /// follow-up actions the same way before returning.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Rejected`] if the reducer rejects an action
        /// - [`StoreError::Storage`] if a storage effect fails. The state
        ///   change of the action whose effect failed is rolled back.
        ///
        /// Effects of earlier actions in the same `send` have already run when
        /// a follow-up action fails.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) -> Result<(), StoreError<R::Error>> {
            let start = Instant::now();
            let mut state = self.lock_state();
            let mut pending = VecDeque::from([action]);

            while let Some(action) = pending.pop_front() {
                tracing::debug!("Processing action");
                StoreMetrics::record_action();

                let before = (*state).clone();
                let effects = match self.reducer.reduce(&mut *state, action, &self.environment) {
                    Ok(effects) => effects,
                    Err(error) => {
                        tracing::warn!(%error, "Action rejected by reducer");
                        StoreMetrics::record_rejection();
                        return Err(StoreError::Rejected(error));
                    },
                };

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                for effect in effects {
                    if let Err(error) = self.execute_effect(effect, &mut pending) {
                        tracing::warn!(%error, "Storage effect failed, rolling back state");
                        *state = before;
                        return Err(StoreError::Storage(error));
                    }
                }
            }

            StoreMetrics::record_send(start.elapsed());
            Ok(())
        }

        fn execute_effect(
            &self,
            effect: Effect<A>,
            pending: &mut VecDeque<A>,
        ) -> Result<(), StorageError> {
            EffectMetrics::record_execution(effect.kind());

            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Sequential(effects) => {
                    tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                    for effect in effects {
                        self.execute_effect(effect, pending)?;
                    }
                },
                Effect::Log(request) => {
                    let entry = self.event_log.append(request);
                    EventLogMetrics::record_append(entry.event_type().as_str());
                    tracing::debug!(
                        id = %entry.id,
                        event_type = %entry.event_type(),
                        local_storage = ?entry.local_storage,
                        "Appended log entry"
                    );
                },
                Effect::Persist { key, value } => {
                    self.storage.set(&key, value).inspect_err(|error| {
                        StorageMetrics::record_error();
                        tracing::error!(%key, %error, "Storage write failed");
                    })?;
                    StorageMetrics::record_write();
                    tracing::debug!(%key, "Persisted value");
                },
                Effect::Load { key, on_load } => {
                    let raw = self.storage.get(&key).inspect_err(|error| {
                        StorageMetrics::record_error();
                        tracing::error!(%key, %error, "Storage read failed");
                    })?;
                    StorageMetrics::record_read();
                    tracing::debug!(%key, found = raw.is_some(), "Loaded value");

                    if let Some(action) = on_load(key, raw) {
                        tracing::trace!("Effect::Load produced an action, queueing it");
                        pending.push_back(action);
                    }
                },
            }

            Ok(())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let amount = store.state(|s| s.data().amount);
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.lock_state();
            f(&*state)
        }

        /// Shared handle to the event log
        #[must_use]
        pub fn event_log(&self) -> Arc<EventLog> {
            Arc::clone(&self.event_log)
        }

        /// The environment injected into the reducer
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }
    }

    /// Store running the form reducer
    pub type FormStore = Store<FormState, FormAction, FormEnvironment, FormReducer>;

    impl Store<FormState, FormAction, FormEnvironment, FormReducer> {
        /// Create a form store with an empty form and a fresh log
        #[must_use]
        pub fn for_form(
            config: &SessionConfig,
            clock: Arc<dyn Clock>,
            storage: Arc<dyn Storage>,
        ) -> Self {
            Self::new(
                FormState::new(),
                FormReducer::new(),
                config.environment(),
                Arc::new(EventLog::with_shared_clock(clock)),
                storage,
            )
        }
    }
}

pub use store::{FormStore, Store};
