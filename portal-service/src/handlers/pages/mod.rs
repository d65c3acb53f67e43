//! Server-rendered dashboard.

pub mod dashboard;
pub mod invoices;
pub mod session;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use crate::models::{Event, Invoice, InvoiceStatus};
use crate::services::calculator::{format_amount, format_computed, format_currency};

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: String,
    pub message: String,
}

/// An [`AppError`] rendered as an HTML page instead of JSON.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "Page request failed");
            "Something went wrong. Please try again.".to_string()
        } else {
            tracing::debug!(error = %self.0, "Page request rejected");
            self.0.to_string()
        };

        let page = ErrorTemplate {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        };
        (status, page).into_response()
    }
}

pub type PageResult = Result<Response, PageError>;

pub(crate) fn not_found(kind: &str) -> PageError {
    PageError(AppError::NotFound(anyhow::anyhow!("{} not found", kind)))
}

/// Status for a form re-rendered after a failed submit.
pub(crate) fn rejected_status(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        other => other.status_code(),
    }
}

/// One row of the events table.
pub struct EventRow {
    pub id: String,
    pub date: String,
    pub name: String,
    pub type_label: &'static str,
    pub expenses: String,
    pub revenue: String,
    pub profit: String,
    pub loss: bool,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_hex(),
            date: event.date.format(crate::dtos::DATE_FORMAT).to_string(),
            name: event.name.clone(),
            type_label: event.event_type.label(),
            expenses: format_currency(event.expenses),
            revenue: format_currency(event.revenue),
            profit: format_currency(event.profit),
            loss: event.profit.is_sign_negative() && !event.profit.is_zero(),
        }
    }
}

/// One row of the invoices table.
pub struct InvoiceRow {
    pub id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub event_name: String,
    pub total: String,
    pub status: &'static str,
    pub paid: bool,
}

impl From<&Invoice> for InvoiceRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id.to_hex(),
            invoice_number: invoice.invoice_number.clone(),
            client_name: invoice.client_name.clone(),
            client_phone: invoice.client_phone.clone(),
            event_name: invoice.event_name.clone(),
            total: format_currency(invoice.total),
            status: invoice.status.as_str(),
            paid: invoice.status == InvoiceStatus::Paid,
        }
    }
}

/// Printable line of an invoice.
pub struct PrintLine {
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

/// Everything shown on the printable invoice.
pub struct InvoiceSheet {
    pub invoice_number: String,
    pub issued: String,
    pub client_name: String,
    pub client_phone: String,
    pub event_name: String,
    pub lines: Vec<PrintLine>,
    pub subtotal: String,
    pub discount_pct: String,
    pub discount: String,
    pub total: String,
    pub status: &'static str,
}

impl From<&Invoice> for InvoiceSheet {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_number: invoice.invoice_number.clone(),
            issued: invoice.created_utc.format("%Y-%m-%d").to_string(),
            client_name: invoice.client_name.clone(),
            client_phone: invoice.client_phone.clone(),
            event_name: invoice.event_name.clone(),
            lines: invoice
                .items
                .iter()
                .map(|item| PrintLine {
                    description: item.description.clone(),
                    quantity: item.quantity.normalize().to_string(),
                    rate: format_currency(item.rate),
                    amount: format_computed(item.line_total()),
                })
                .collect(),
            subtotal: format_currency(invoice.subtotal),
            discount_pct: invoice.discount.normalize().to_string(),
            discount: format_amount(invoice.discount_amount()),
            total: format_currency(invoice.total),
            status: invoice.status.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventType, InvoiceItem, NewEvent, NewInvoice};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn event() -> Event {
        Event::new(NewEvent {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            name: "Khan Wedding".to_string(),
            event_type: EventType::Custom,
            expenses: dec!(150),
        })
    }

    #[test]
    fn event_row_formats_money() {
        let row = EventRow::from(&event());
        assert_eq!(row.type_label, "Custom Event");
        assert_eq!(row.expenses, "$150.00");
        assert_eq!(row.profit, "-$150.00");
        assert!(row.loss);
    }

    #[test]
    fn invoice_sheet_lists_lines_and_totals() {
        let invoice = Invoice::for_event(
            &event(),
            NewInvoice {
                invoice_number: "INV-9".to_string(),
                client_name: "Sara".to_string(),
                client_phone: "555".to_string(),
                items: vec![
                    InvoiceItem::new("Stage", dec!(2), dec!(50)),
                    InvoiceItem::new("Lights", dec!(1), dec!(30)),
                ],
                discount: dec!(10),
            },
        )
        .unwrap();
        let sheet = InvoiceSheet::from(&invoice);
        assert_eq!(sheet.lines.len(), 2);
        assert_eq!(sheet.lines[0].amount, "$100.00");
        assert_eq!(sheet.subtotal, "$130.00");
        assert_eq!(sheet.discount, "13.00");
        assert_eq!(sheet.total, "$117.00");
        assert_eq!(sheet.status, "Unpaid");
    }

    #[test]
    fn server_errors_hide_details() {
        let response =
            PageError(AppError::DatabaseError(anyhow::anyhow!("socket closed"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
