use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::Event;
use crate::services::calculator::{self, AmountOverflow};
use crate::services::repository::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unpaid => "Unpaid",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Paid" | "paid" => Ok(InvoiceStatus::Paid),
            "Unpaid" | "unpaid" => Ok(InvoiceStatus::Unpaid),
            other => Err(anyhow::anyhow!("unknown invoice status: {}", other)),
        }
    }
}

/// One billable row on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, rate: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            rate,
        }
    }

    pub fn line_total(&self) -> Result<Decimal, AmountOverflow> {
        calculator::line_total(self)
    }
}

impl Default for InvoiceItem {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: Decimal::ONE,
            rate: Decimal::ZERO,
        }
    }
}

/// A client invoice issued against an event.
///
/// `event_name` is a snapshot taken when the invoice is created and is not
/// updated when the event is renamed. `subtotal` and `total` are derived from
/// `items` and `discount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub event_id: ObjectId,
    pub event_name: String,
    pub items: Vec<InvoiceItem>,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub version: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

/// Validated input for a new invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub items: Vec<InvoiceItem>,
    pub discount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoicePatch {
    pub invoice_number: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub items: Option<Vec<InvoiceItem>>,
    pub discount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
}

impl Invoice {
    /// Build an unpaid invoice for `event`, copying its current name.
    pub fn for_event(event: &Event, draft: NewInvoice) -> Result<Self, AmountOverflow> {
        let now = Utc::now();
        let mut invoice = Self {
            id: ObjectId::new(),
            invoice_number: draft.invoice_number,
            client_name: draft.client_name,
            client_phone: draft.client_phone,
            event_id: event.id,
            event_name: event.name.clone(),
            items: draft.items,
            discount: draft.discount,
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            status: InvoiceStatus::Unpaid,
            version: 0,
            created_utc: now,
            updated_utc: now,
        };
        invoice.recompute_totals()?;
        Ok(invoice)
    }

    /// Merge `patch`. On overflow the invoice is left partly patched; callers
    /// discard it.
    pub fn apply_patch(&mut self, patch: &InvoicePatch) -> Result<(), AmountOverflow> {
        if let Some(number) = &patch.invoice_number {
            self.invoice_number = number.clone();
        }
        if let Some(client_name) = &patch.client_name {
            self.client_name = client_name.clone();
        }
        if let Some(client_phone) = &patch.client_phone {
            self.client_phone = client_phone.clone();
        }
        if let Some(items) = &patch.items {
            self.items = items.clone();
        }
        if let Some(discount) = patch.discount {
            self.discount = discount;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.recompute_totals()
    }

    /// Stored totals already fit, so their difference does too.
    pub fn discount_amount(&self) -> Decimal {
        self.subtotal.saturating_sub(self.total)
    }

    fn recompute_totals(&mut self) -> Result<(), AmountOverflow> {
        self.subtotal = calculator::subtotal(&self.items)?;
        self.total = calculator::total(&self.items, self.discount)?;
        Ok(())
    }
}

impl Record for Invoice {
    const KIND: &'static str = "invoice";

    fn id(&self) -> ObjectId {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn created_utc(&self) -> DateTime<Utc> {
        self.created_utc
    }

    fn mark_written(&mut self) {
        self.version += 1;
        self.updated_utc = Utc::now();
    }
}
