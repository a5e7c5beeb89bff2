//! Numeric form state.
//!
//! The form holds a unit `price`, a quantity `qty`, the derived
//! `amount = price * qty`, and a `counter` of successful user updates.
//! `amount` and `counter` have no setters; they only change as a consequence
//! of [`FormState::update`], [`FormState::reset`] or [`FormState::restore`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod reducer;

pub use reducer::{FormAction, FormEnvironment, FormReducer};

/// Error type for field-name parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown form field: {0}")]
pub struct ParseFieldError(String);

/// Any field of the form, as referenced by `input_change` log entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    /// Unit price
    Price,
    /// Quantity
    Qty,
    /// Derived total
    Amount,
}

impl FormField {
    /// Lowercase wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Qty => "qty",
            Self::Amount => "amount",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(Self::Price),
            "qty" => Ok(Self::Qty),
            "amount" => Ok(Self::Amount),
            other => Err(ParseFieldError(other.to_string())),
        }
    }
}

/// The user-settable subset of [`FormField`].
///
/// `amount` is derived, so it cannot be the target of an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputField {
    /// Unit price
    Price,
    /// Quantity
    Qty,
}

impl InputField {
    /// Lowercase wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Qty => "qty",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(Self::Price),
            "qty" => Ok(Self::Qty),
            other => Err(ParseFieldError(other.to_string())),
        }
    }
}

impl From<InputField> for FormField {
    fn from(field: InputField) -> Self {
        match field {
            InputField::Price => Self::Price,
            InputField::Qty => Self::Qty,
        }
    }
}

/// Snapshot of the form.
///
/// This is also the persisted format: it serializes to
/// `{"price":..,"qty":..,"amount":..,"counter":..}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    /// Unit price, finite and non-negative
    pub price: f64,
    /// Quantity, finite and non-negative
    pub qty: f64,
    /// Always `price * qty`
    pub amount: f64,
    /// Successful updates since the last reset
    pub counter: u64,
}

impl FormData {
    /// Value of a single field
    #[must_use]
    pub const fn get(&self, field: FormField) -> f64 {
        match field {
            FormField::Price => self.price,
            FormField::Qty => self.qty,
            FormField::Amount => self.amount,
        }
    }
}

/// Formats as the persisted JSON object
impl fmt::Display for FormData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Errors from form updates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The value is negative, not finite, or not a number at all.
    #[error("Invalid value for {field}: {input}")]
    InvalidValue {
        /// Field the value was meant for
        field: InputField,
        /// The rejected input, as received
        input: String,
    },
}

/// Owner of the current [`FormData`].
///
/// All mutations go through methods that keep `amount` consistent.
/// A failed call leaves the state exactly as it was.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    data: FormData,
}

impl FormState {
    /// Creates a form with every field at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    #[must_use]
    pub const fn data(&self) -> FormData {
        self.data
    }

    /// Sets `field` to `value`, recomputes `amount` and bumps `counter`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidValue`] if `value` is negative, NaN or
    /// infinite, or if the resulting `amount` would overflow.
    pub fn update(&mut self, field: InputField, value: f64) -> Result<FormData, FormError> {
        let value = validate(field, value)?;

        let (price, qty) = match field {
            InputField::Price => (value, self.data.qty),
            InputField::Qty => (self.data.price, value),
        };
        let amount = checked_amount(field, value, price, qty)?;

        self.data = FormData {
            price,
            qty,
            amount,
            counter: self.data.counter.saturating_add(1),
        };
        Ok(self.data)
    }

    /// Parses `input` as a number and applies it with [`FormState::update`].
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidValue`] if `input` is not numeric or fails
    /// the checks of [`FormState::update`].
    pub fn update_from_str(&mut self, field: InputField, input: &str) -> Result<FormData, FormError> {
        let value = input.trim().parse::<f64>().map_err(|_| FormError::InvalidValue {
            field,
            input: input.to_string(),
        })?;
        self.update(field, value)
    }

    /// Returns the form to its all-zero default, counter included.
    pub fn reset(&mut self) -> FormData {
        self.data = FormData::default();
        self.data
    }

    /// Loads a previously persisted snapshot.
    ///
    /// The stored `amount` is ignored and recomputed; the stored `counter` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidValue`] if the stored price or quantity is
    /// negative or not finite, or if their product overflows.
    pub fn restore(&mut self, data: FormData) -> Result<FormData, FormError> {
        let price = validate(InputField::Price, data.price)?;
        let qty = validate(InputField::Qty, data.qty)?;
        let amount = checked_amount(InputField::Qty, qty, price, qty)?;

        self.data = FormData {
            price,
            qty,
            amount,
            counter: data.counter,
        };
        Ok(self.data)
    }
}

fn validate(field: InputField, value: f64) -> Result<f64, FormError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FormError::InvalidValue {
            field,
            input: value.to_string(),
        })
    }
}

/// `price * qty`, rejected as `field = value` when it is not finite
///
/// A non-finite amount serializes as `null` and could not be restored.
fn checked_amount(field: InputField, value: f64, price: f64, qty: f64) -> Result<f64, FormError> {
    let amount = price * qty;
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(FormError::InvalidValue {
            field,
            input: value.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_is_all_zero() {
        let form = FormState::new();
        assert_eq!(
            form.data(),
            FormData {
                price: 0.0,
                qty: 0.0,
                amount: 0.0,
                counter: 0,
            }
        );
    }

    #[test]
    fn price_then_qty() {
        let mut form = FormState::new();
        form.update(InputField::Price, 10.0).unwrap();
        let data = form.update(InputField::Qty, 3.0).unwrap();

        assert_eq!(
            data,
            FormData {
                price: 10.0,
                qty: 3.0,
                amount: 30.0,
                counter: 2,
            }
        );
    }

    #[test]
    fn negative_value_leaves_state_unchanged() {
        let mut form = FormState::new();
        form.update(InputField::Price, 4.0).unwrap();
        form.update(InputField::Qty, 2.0).unwrap();
        let before = form.data();

        let err = form.update(InputField::Price, -5.0).unwrap_err();

        assert_eq!(
            err,
            FormError::InvalidValue {
                field: InputField::Price,
                input: "-5".to_string(),
            }
        );
        assert_eq!(form.data(), before);
        assert_eq!(form.data().amount, 8.0);
        assert_eq!(form.data().counter, 2);
    }

    #[test]
    fn non_finite_values_rejected() {
        let mut form = FormState::new();
        assert!(form.update(InputField::Qty, f64::NAN).is_err());
        assert!(form.update(InputField::Qty, f64::INFINITY).is_err());
        assert_eq!(form.data().counter, 0);
    }

    #[test]
    fn overflowing_amount_rejected() {
        let mut form = FormState::new();
        form.update(InputField::Price, 1e200).unwrap();
        let before = form.data();

        let err = form.update(InputField::Qty, 1e200).unwrap_err();

        assert!(matches!(
            err,
            FormError::InvalidValue {
                field: InputField::Qty,
                ..
            }
        ));
        assert_eq!(form.data(), before);
        assert_eq!(form.data().counter, 1);
        assert_eq!(form.data().amount, 0.0);
    }

    #[test]
    fn restore_rejects_overflowing_amount() {
        let mut form = FormState::new();
        form.update(InputField::Price, 2.0).unwrap();
        let before = form.data();

        let saved = FormData {
            price: 1e200,
            qty: 1e200,
            amount: 0.0,
            counter: 2,
        };

        assert!(form.restore(saved).is_err());
        assert_eq!(form.data(), before);
    }

    #[test]
    fn update_from_str_parses_and_rejects_text() {
        let mut form = FormState::new();
        let data = form.update_from_str(InputField::Price, " 12.5 ").unwrap();
        assert_eq!(data.price, 12.5);

        let err = form.update_from_str(InputField::Qty, "three").unwrap_err();
        assert_eq!(
            err,
            FormError::InvalidValue {
                field: InputField::Qty,
                input: "three".to_string(),
            }
        );
        assert_eq!(form.data().counter, 1);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut form = FormState::new();
        form.update(InputField::Price, 10.0).unwrap();
        form.update(InputField::Qty, 3.0).unwrap();

        assert_eq!(form.reset(), FormData::default());

        let data = form.update(InputField::Qty, 1.0).unwrap();
        assert_eq!(data.counter, 1);
        assert_eq!(data.amount, 0.0);
    }

    #[test]
    fn restore_recomputes_amount() {
        let mut form = FormState::new();
        let data = form
            .restore(FormData {
                price: 2.0,
                qty: 5.0,
                amount: 999.0,
                counter: 7,
            })
            .unwrap();

        assert_eq!(data.amount, 10.0);
        assert_eq!(data.counter, 7);
    }

    #[test]
    fn restore_rejects_negative_quantity() {
        let mut form = FormState::new();
        let result = form.restore(FormData {
            price: 2.0,
            qty: -1.0,
            amount: -2.0,
            counter: 1,
        });

        assert!(matches!(
            result,
            Err(FormError::InvalidValue {
                field: InputField::Qty,
                ..
            })
        ));
        assert_eq!(form.data(), FormData::default());
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("amount".parse::<FormField>(), Ok(FormField::Amount));
        assert_eq!("qty".parse::<InputField>(), Ok(InputField::Qty));
        assert!("amount".parse::<InputField>().is_err());
        assert!("total".parse::<FormField>().is_err());
        assert_eq!(FormField::from(InputField::Price), FormField::Price);
    }

    #[test]
    fn form_data_json_shape() {
        let data = FormData {
            price: 10.0,
            qty: 3.0,
            amount: 30.0,
            counter: 2,
        };
        let json = serde_json::to_value(data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"price": 10.0, "qty": 3.0, "amount": 30.0, "counter": 2})
        );
    }

    fn arb_update() -> impl Strategy<Value = (InputField, f64)> {
        (
            prop_oneof![Just(InputField::Price), Just(InputField::Qty)],
            0.0f64..1_000_000.0,
        )
    }

    proptest! {
        #[test]
        fn prop_amount_tracks_price_times_qty(updates in prop::collection::vec(arb_update(), 0..50)) {
            let mut form = FormState::new();
            for (field, value) in &updates {
                form.update(*field, *value).unwrap();
            }
            let data = form.data();
            prop_assert_eq!(data.amount, data.price * data.qty);
        }

        #[test]
        fn prop_counter_counts_successful_updates(
            updates in prop::collection::vec((arb_update(), any::<bool>()), 0..50)
        ) {
            let mut form = FormState::new();
            let mut successes = 0u64;
            for ((field, value), negate) in &updates {
                let value = if *negate && *value > 0.0 { -*value } else { *value };
                if form.update(*field, value).is_ok() {
                    successes += 1;
                }
            }
            prop_assert_eq!(form.data().counter, successes);
        }
    }
}
