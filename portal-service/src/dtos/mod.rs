pub mod auth;
pub mod events;
pub mod invoices;

use chrono::NaiveDate;
use std::borrow::Cow;
use validator::ValidationError;

pub use auth::{LoginRequest, SessionResponse};
pub use events::{CreateEventRequest, EventResponse, UpdateEventRequest};
pub use invoices::{
    CreateInvoiceRequest, InvoiceItemRequest, InvoiceItemResponse, InvoiceResponse,
    UpdateInvoiceRequest,
};

/// Calendar dates travel as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "This field is required"));
    }
    Ok(())
}

pub(crate) fn validate_date(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    match parse_date(value) {
        Some(_) => Ok(()),
        None => Err(error("date", "Date must be in YYYY-MM-DD format")),
    }
}

pub(crate) fn validate_event_type(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    value
        .parse::<crate::models::EventType>()
        .map(|_| ())
        .map_err(|_| error("event_type", "Unknown event type"))
}

pub(crate) fn validate_invoice_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<crate::models::InvoiceStatus>()
        .map(|_| ())
        .map_err(|_| error("status", "Status must be Paid or Unpaid"))
}
