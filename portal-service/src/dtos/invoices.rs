use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::{validate_invoice_status, validate_not_blank};
use crate::models::{Invoice, InvoiceItem, InvoicePatch, InvoiceStatus, NewInvoice};
use crate::services::calculator;
use crate::utils::numeric::{deserialize_lenient_decimal, deserialize_lenient_decimal_opt};

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceItemRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_lenient_decimal")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "deserialize_lenient_decimal")]
    pub rate: Decimal,
}

impl From<InvoiceItemRequest> for InvoiceItem {
    fn from(item: InvoiceItemRequest) -> Self {
        InvoiceItem::new(item.description, item.quantity, item.rate)
    }
}

/// Totals are always derived server-side; any `subtotal`/`total` sent by the
/// client is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub invoice_number: String,

    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub client_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub client_phone: String,

    #[serde(default)]
    pub items: Vec<InvoiceItemRequest>,

    #[serde(default, deserialize_with = "deserialize_lenient_decimal")]
    pub discount: Decimal,
}

impl CreateInvoiceRequest {
    pub fn into_draft(self) -> Result<NewInvoice, AppError> {
        self.validate()?;
        let items: Vec<InvoiceItem> = self.items.into_iter().map(InvoiceItem::from).collect();
        calculator::total(&items, self.discount)?;
        Ok(NewInvoice {
            invoice_number: self.invoice_number.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
            client_phone: self.client_phone.trim().to_string(),
            items,
            discount: self.discount,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub invoice_number: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub client_name: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub client_phone: Option<String>,

    pub items: Option<Vec<InvoiceItemRequest>>,

    #[serde(default, deserialize_with = "deserialize_lenient_decimal_opt")]
    pub discount: Option<Decimal>,

    #[validate(custom(function = "validate_invoice_status"))]
    pub status: Option<String>,
}

impl UpdateInvoiceRequest {
    pub fn into_patch(self) -> Result<InvoicePatch, AppError> {
        self.validate()?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<InvoiceStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;

        Ok(InvoicePatch {
            invoice_number: self.invoice_number.map(|v| v.trim().to_string()),
            client_name: self.client_name.map(|v| v.trim().to_string()),
            client_phone: self.client_phone.map(|v| v.trim().to_string()),
            items: self
                .items
                .map(|items| items.into_iter().map(InvoiceItem::from).collect()),
            discount: self.discount,
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItemResponse {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

impl From<InvoiceItem> for InvoiceItemResponse {
    fn from(item: InvoiceItem) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            rate: item.rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub event_id: String,
    pub event_name: String,
    pub items: Vec<InvoiceItemResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id.to_hex(),
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name,
            client_phone: invoice.client_phone,
            event_id: invoice.event_id.to_hex(),
            event_name: invoice.event_name,
            items: invoice.items.into_iter().map(Into::into).collect(),
            discount: invoice.discount,
            subtotal: invoice.subtotal,
            total: invoice.total,
            status: invoice.status,
            created_utc: invoice.created_utc,
            updated_utc: invoice.updated_utc,
        }
    }
}
