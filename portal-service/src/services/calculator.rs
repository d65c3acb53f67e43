//! Pure money arithmetic for events and invoices.
//!
//! Values are exact decimals; rounding happens only when formatting for display.

use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use thiserror::Error;

use crate::models::{ExpenseLine, InvoiceItem};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A sum or product left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Amount is too large")]
pub struct AmountOverflow;

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

fn sum(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AmountOverflow> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .ok_or(AmountOverflow)
}

pub fn total_expenses(lines: &[ExpenseLine]) -> Result<Decimal, AmountOverflow> {
    sum(lines.iter().map(|line| line.amount))
}

pub fn line_total(item: &InvoiceItem) -> Result<Decimal, AmountOverflow> {
    item.quantity.checked_mul(item.rate).ok_or(AmountOverflow)
}

pub fn subtotal(items: &[InvoiceItem]) -> Result<Decimal, AmountOverflow> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(line_total(item)?).ok_or(AmountOverflow)
        })
}

/// `discount_pct` is a percentage and is not clamped to 0..=100.
pub fn discount_amount(subtotal: Decimal, discount_pct: Decimal) -> Result<Decimal, AmountOverflow> {
    subtotal
        .checked_mul(discount_pct)
        .and_then(|scaled| scaled.checked_div(HUNDRED))
        .ok_or(AmountOverflow)
}

pub fn total(items: &[InvoiceItem], discount_pct: Decimal) -> Result<Decimal, AmountOverflow> {
    let subtotal = subtotal(items)?;
    subtotal
        .checked_sub(discount_amount(subtotal, discount_pct)?)
        .ok_or(AmountOverflow)
}

pub fn profit(revenue: Decimal, expenses: Decimal) -> Result<Decimal, AmountOverflow> {
    revenue.checked_sub(expenses).ok_or(AmountOverflow)
}

/// Signed change between two totals, used when re-posting revenue.
pub fn difference(after: Decimal, before: Decimal) -> Result<Decimal, AmountOverflow> {
    after.checked_sub(before).ok_or(AmountOverflow)
}

/// Two-decimal amount without currency symbol, e.g. `-150.00`.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

/// Display form used on pages and printed invoices, e.g. `$117.00`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_cents(value);
    if rounded.is_sign_negative() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded)
    }
}

/// [`format_currency`] for a computed amount; overflow shows as a notice.
pub fn format_computed(value: Result<Decimal, AmountOverflow>) -> String {
    match value {
        Ok(value) => format_currency(value),
        Err(_) => "Amount too large".to_string(),
    }
}

fn round_cents(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Avoid rendering "-0.00" for tiny negative amounts.
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}
