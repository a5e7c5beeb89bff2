//! Reducer logic for the form.
//!
//! Validates edits, updates [`FormState`], and describes what should be logged
//! and persisted. Nothing here touches the log or storage directly; the
//! runtime executes the returned effects.

use super::{FormData, FormError, FormState, InputField};
use crate::effect::Effect;
use crate::event::Event;
use crate::event_log::LogRequest;
use crate::reducer::Reducer;
use crate::storage::StorageKey;
use smallvec::{SmallVec, smallvec};

/// Inputs to the form reducer
#[derive(Clone, Debug, PartialEq)]
pub enum FormAction {
    /// A numeric field was edited
    Update {
        /// Edited field
        field: InputField,
        /// New value
        value: f64,
    },

    /// A field was edited with raw text, e.g. straight from an input box
    UpdateText {
        /// Edited field
        field: InputField,
        /// Text as typed
        input: String,
    },

    /// The reset button was pressed
    Reset,

    /// The submit button was pressed
    Submit,

    /// A response arrived from an external service
    ResponseReceived {
        /// Status code
        status: u16,
        /// Response body
        body: serde_json::Value,
    },

    /// Load the saved form from storage
    Restore,

    /// Storage answered a `Restore`
    Restored {
        /// Key that was read
        key: StorageKey,
        /// Saved form, if one was stored
        data: Option<FormData>,
    },

    /// The saved form could not be decoded
    RestoreFailed {
        /// Key that was read
        key: StorageKey,
        /// Decoding error
        reason: String,
    },
}

/// Environment dependencies for the form reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormEnvironment {
    /// Storage slot holding the saved form
    pub storage_key: StorageKey,
    /// Persist the form after every edit and reset
    pub autosave: bool,
}

impl FormEnvironment {
    /// Creates a new `FormEnvironment`
    #[must_use]
    pub const fn new(storage_key: StorageKey, autosave: bool) -> Self {
        Self {
            storage_key,
            autosave,
        }
    }
}

/// Reducer for the form
#[derive(Clone, Copy, Debug, Default)]
pub struct FormReducer;

impl FormReducer {
    /// Creates a new `FormReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Log `request`, persisting `data` first when autosave is on
    fn log_with_autosave(
        data: FormData,
        request: LogRequest,
        env: &FormEnvironment,
    ) -> SmallVec<[Effect<FormAction>; 4]> {
        if env.autosave {
            smallvec![Self::persist_then_log(data, request, env)]
        } else {
            smallvec![Effect::Log(request)]
        }
    }

    fn persist_then_log(
        data: FormData,
        request: LogRequest,
        env: &FormEnvironment,
    ) -> Effect<FormAction> {
        Effect::chain(vec![
            Effect::Persist {
                key: env.storage_key.clone(),
                value: data.to_string(),
            },
            Effect::Log(request.with_storage_key(env.storage_key.clone())),
        ])
    }

    fn edited(
        field: InputField,
        data: FormData,
        env: &FormEnvironment,
    ) -> SmallVec<[Effect<FormAction>; 4]> {
        let field = field.into();
        let request = LogRequest::new(
            Event::input_change(field, data.get(field)),
            format!("{field} changed"),
        );
        Self::log_with_autosave(data, request, env)
    }
}

/// Maps a storage read to the follow-up action
fn restored_from_storage(key: StorageKey, raw: Option<String>) -> Option<FormAction> {
    let action = match raw {
        None => FormAction::Restored { key, data: None },
        Some(text) => match serde_json::from_str::<FormData>(&text) {
            Ok(data) => FormAction::Restored {
                key,
                data: Some(data),
            },
            Err(e) => FormAction::RestoreFailed {
                key,
                reason: e.to_string(),
            },
        },
    };
    Some(action)
}

impl Reducer for FormReducer {
    type State = FormState;
    type Action = FormAction;
    type Environment = FormEnvironment;
    type Error = FormError;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<SmallVec<[Effect<Self::Action>; 4]>, Self::Error> {
        match action {
            FormAction::Update { field, value } => {
                let data = state.update(field, value)?;
                Ok(Self::edited(field, data, env))
            },
            FormAction::UpdateText { field, input } => {
                let data = state.update_from_str(field, &input)?;
                Ok(Self::edited(field, data, env))
            },
            FormAction::Reset => {
                let data = state.reset();
                let request = LogRequest::new(Event::button_click("reset"), "form reset");
                Ok(Self::log_with_autosave(data, request, env))
            },
            FormAction::Submit => {
                let request = LogRequest::new(Event::button_click("submit"), "form submitted");
                Ok(smallvec![Self::persist_then_log(state.data(), request, env)])
            },
            FormAction::ResponseReceived { status, body } => {
                let request = LogRequest::new(
                    Event::response_received(status, body),
                    format!("response received with status {status}"),
                );
                Ok(smallvec![Effect::Log(request)])
            },
            FormAction::Restore => Ok(smallvec![Effect::Load {
                key: env.storage_key.clone(),
                on_load: restored_from_storage,
            }]),
            FormAction::Restored { key, data } => {
                let message = match data {
                    Some(data) => {
                        state.restore(data)?;
                        "form restored from storage"
                    },
                    None => "no saved form in storage",
                };
                let request = LogRequest::new(Event::ResponseReceived(None), message)
                    .with_storage_key(key);
                Ok(smallvec![Effect::Log(request)])
            },
            FormAction::RestoreFailed { key, reason } => {
                let request = LogRequest::new(
                    Event::ResponseReceived(None),
                    format!("saved form unreadable: {reason}"),
                )
                .with_storage_key(key);
                Ok(smallvec![Effect::Log(request)])
            },
        }
    }
}
