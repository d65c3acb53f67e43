//! Dashboard form state.
//!
//! A form is `Editing` while the operator types, `Submitting` once its input
//! validated and a store write is in flight, and `Idle` after the write
//! succeeded and the form was reset. Any failure returns it to `Editing`.

pub mod event_form;
pub mod invoice_form;

use std::collections::BTreeMap;
use validator::ValidationErrors;

pub use event_form::{EventForm, EventFormInput, ExpenseRow};
pub use invoice_form::{InvoiceForm, InvoiceFormInput, ItemRow};

/// Message shown when the store rejects an otherwise valid submission.
pub const STORE_FAILURE_MESSAGE: &str = "Could not save your changes. Please try again.";

/// Message shown when the entered amounts cannot be totalled.
pub const OVERFLOW_MESSAGE: &str = "Amounts are too large to total.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Editing,
    Submitting,
    Idle,
}

/// What the operator asked for when posting the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormIntent {
    #[default]
    Submit,
    /// Re-render with recomputed totals, nothing is stored.
    Recalculate,
    AddRow,
}

impl FormIntent {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("recalculate") => FormIntent::Recalculate,
            Some("add_row") => FormIntent::AddRow,
            _ => FormIntent::Submit,
        }
    }
}

/// Inline validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, failures) in errors.field_errors() {
            let message = failures
                .iter()
                .find_map(|failure| failure.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "This field is invalid".to_string());
            let name = if field == "event_type" { "type" } else { field.as_ref() };
            fields.insert(name, message);
        }
        fields
    }
}

/// Pair up repeated form columns, padding the shorter ones with blanks.
pub(crate) fn zip_columns<const N: usize>(columns: [Vec<String>; N]) -> Vec<[String; N]> {
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|row| std::array::from_fn(|col| columns[col].get(row).cloned().unwrap_or_default()))
        .collect()
}
