//! Lenient numeric input.
//!
//! Data entry never fails on a bad number: anything that does not parse as a
//! decimal becomes zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Parse a user-typed amount, falling back to zero.
pub fn coerce_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Serde adapter accepting JSON numbers, numeric strings or `null`.
pub fn deserialize_lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => coerce_decimal(&number.to_string()),
        Value::String(text) => coerce_decimal(&text),
        _ => Decimal::ZERO,
    })
}

/// Same as [`deserialize_lenient_decimal`] for optional patch fields: an absent
/// field stays `None`, a present but garbage value becomes `Some(0)`.
pub fn deserialize_lenient_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_lenient_decimal(deserializer).map(Some)
}
