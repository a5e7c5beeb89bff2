//! Form session example
//!
//! A scripted walk through a typical session: the user types a price and a
//! quantity, submits, gets a response, resets the form and finally restores
//! the saved copy. With autosave on, the reset is what gets restored.

use formlog_core::form::{FormAction, FormError, InputField};
use formlog_runtime::{FormStore, StoreError};

/// The scripted session, in order
#[must_use]
pub fn scenario() -> Vec<FormAction> {
    vec![
        FormAction::UpdateText {
            field: InputField::Price,
            input: "10".to_string(),
        },
        FormAction::UpdateText {
            field: InputField::Qty,
            input: "3".to_string(),
        },
        FormAction::Submit,
        FormAction::ResponseReceived {
            status: 201,
            body: serde_json::json!({ "accepted": true }),
        },
        FormAction::Reset,
        FormAction::Restore,
    ]
}

/// Send every action of [`scenario`] to `store`
///
/// # Errors
///
/// Returns the first error reported by the store.
pub fn run_scenario(store: &FormStore) -> Result<(), StoreError<FormError>> {
    for action in scenario() {
        tracing::info!(?action, "Sending action");
        store.send(action)?;
    }
    Ok(())
}
