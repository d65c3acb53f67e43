use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{
    zip_columns, FieldErrors, FormIntent, FormState, OVERFLOW_MESSAGE, STORE_FAILURE_MESSAGE,
};
use crate::dtos::{CreateInvoiceRequest, InvoiceItemRequest, UpdateInvoiceRequest};
use crate::models::{Invoice, InvoiceItem, InvoicePatch, InvoiceStatus, NewInvoice};
use crate::services::calculator::{self, AmountOverflow};
use crate::utils::numeric::coerce_decimal;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFormInput {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub item_description: Vec<String>,
    #[serde(default)]
    pub item_quantity: Vec<String>,
    #[serde(default)]
    pub item_rate: Vec<String>,
    #[serde(default)]
    pub discount: String,
    pub status: Option<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub description: String,
    pub quantity: String,
    pub rate: String,
}

impl ItemRow {
    fn item(&self) -> InvoiceItem {
        InvoiceItem::new(
            self.description.trim(),
            coerce_decimal(&self.quantity),
            coerce_decimal(&self.rate),
        )
    }

    pub fn line_total_display(&self) -> String {
        calculator::format_computed(self.item().line_total())
    }
}

impl Default for ItemRow {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: "1".to_string(),
            rate: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceForm {
    pub state: FormState,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub items: Vec<ItemRow>,
    pub discount: String,
    pub status: InvoiceStatus,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl InvoiceForm {
    pub fn blank() -> Self {
        Self {
            state: FormState::Editing,
            invoice_number: String::new(),
            client_name: String::new(),
            client_phone: String::new(),
            items: vec![ItemRow::default()],
            discount: "0".to_string(),
            status: InvoiceStatus::Unpaid,
            errors: FieldErrors::default(),
            error: None,
        }
    }

    pub fn for_invoice(invoice: &Invoice) -> Self {
        let items = invoice
            .items
            .iter()
            .map(|item| ItemRow {
                description: item.description.clone(),
                quantity: item.quantity.normalize().to_string(),
                rate: calculator::format_amount(item.rate),
            })
            .collect::<Vec<_>>();

        Self {
            invoice_number: invoice.invoice_number.clone(),
            client_name: invoice.client_name.clone(),
            client_phone: invoice.client_phone.clone(),
            items: if items.is_empty() { vec![ItemRow::default()] } else { items },
            discount: invoice.discount.normalize().to_string(),
            status: invoice.status,
            ..Self::blank()
        }
    }

    pub fn from_input(input: InvoiceFormInput) -> (Self, FormIntent) {
        let intent = FormIntent::parse(input.intent.as_deref());
        let mut items: Vec<ItemRow> =
            zip_columns([input.item_description, input.item_quantity, input.item_rate])
                .into_iter()
                .map(|[description, quantity, rate]| ItemRow {
                    description,
                    quantity,
                    rate,
                })
                .collect();
        if intent == FormIntent::AddRow || items.is_empty() {
            items.push(ItemRow::default());
        }

        let status = input
            .status
            .as_deref()
            .and_then(|raw| raw.parse::<InvoiceStatus>().ok())
            .unwrap_or_default();

        let form = Self {
            invoice_number: input.invoice_number,
            client_name: input.client_name,
            client_phone: input.client_phone,
            items,
            discount: input.discount,
            status,
            ..Self::blank()
        };
        (form, intent)
    }

    pub fn invoice_items(&self) -> Vec<InvoiceItem> {
        self.items.iter().map(ItemRow::item).collect()
    }

    pub fn discount_pct(&self) -> Decimal {
        coerce_decimal(&self.discount)
    }

    pub fn subtotal(&self) -> Result<Decimal, AmountOverflow> {
        calculator::subtotal(&self.invoice_items())
    }

    pub fn discount_amount(&self) -> Result<Decimal, AmountOverflow> {
        calculator::discount_amount(self.subtotal()?, self.discount_pct())
    }

    pub fn total(&self) -> Result<Decimal, AmountOverflow> {
        calculator::total(&self.invoice_items(), self.discount_pct())
    }

    pub fn subtotal_display(&self) -> String {
        calculator::format_computed(self.subtotal())
    }

    pub fn discount_display(&self) -> String {
        calculator::format_computed(self.discount_amount())
    }

    pub fn total_display(&self) -> String {
        calculator::format_computed(self.total())
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    fn item_requests(&self) -> Vec<InvoiceItemRequest> {
        self.invoice_items()
            .into_iter()
            .map(|item| InvoiceItemRequest {
                description: item.description,
                quantity: item.quantity,
                rate: item.rate,
            })
            .collect()
    }

    fn request(&self) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            invoice_number: self.invoice_number.clone(),
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
            items: self.item_requests(),
            discount: self.discount_pct(),
        }
    }

    pub fn begin_create(&mut self) -> Option<NewInvoice> {
        self.error = None;
        if let Err(errors) = self.request().validate() {
            self.errors = FieldErrors::from(&errors);
            self.state = FormState::Editing;
            return None;
        }
        if self.total().is_err() {
            return self.reject_overflow();
        }
        match self.request().into_draft() {
            Ok(draft) => {
                self.errors.clear();
                self.state = FormState::Submitting;
                Some(draft)
            }
            Err(_) => self.reject_generic(),
        }
    }

    pub fn begin_update(&mut self) -> Option<InvoicePatch> {
        self.error = None;
        if let Err(errors) = self.request().validate() {
            self.errors = FieldErrors::from(&errors);
            self.state = FormState::Editing;
            return None;
        }
        if self.total().is_err() {
            return self.reject_overflow();
        }

        let request = UpdateInvoiceRequest {
            invoice_number: Some(self.invoice_number.clone()),
            client_name: Some(self.client_name.clone()),
            client_phone: Some(self.client_phone.clone()),
            items: Some(self.item_requests()),
            discount: Some(self.discount_pct()),
            status: Some(self.status.as_str().to_string()),
        };
        match request.into_patch() {
            Ok(patch) => {
                self.errors.clear();
                self.state = FormState::Submitting;
                Some(patch)
            }
            Err(_) => self.reject_generic(),
        }
    }

    pub fn succeeded(&mut self) {
        *self = Self {
            state: FormState::Idle,
            ..Self::blank()
        };
    }

    pub fn failed(&mut self) {
        self.state = FormState::Editing;
        self.error = Some(STORE_FAILURE_MESSAGE.to_string());
    }

    fn reject_overflow<T>(&mut self) -> Option<T> {
        self.state = FormState::Editing;
        self.error = Some(OVERFLOW_MESSAGE.to_string());
        None
    }

    fn reject_generic<T>(&mut self) -> Option<T> {
        self.state = FormState::Editing;
        self.error = Some("Please check the highlighted fields.".to_string());
        None
    }
}

impl Default for InvoiceForm {
    fn default() -> Self {
        Self::blank()
    }
}
