use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

use super::{parse_date, validate_date, validate_event_type, validate_not_blank};
use crate::models::{Event, EventPatch, EventType, NewEvent};
use crate::services::calculator::AmountOverflow;
use crate::utils::numeric::coerce_decimal;

/// `expenses` may be sent as a list of lines or as an already summed amount.
fn expenses_total(value: Value) -> Result<Decimal, AmountOverflow> {
    match value {
        Value::Array(lines) => lines.into_iter().try_fold(Decimal::ZERO, |acc, line| {
            let amount = match line {
                Value::Object(mut fields) => match fields.remove("amount") {
                    Some(amount) => expenses_total(amount)?,
                    None => Decimal::ZERO,
                },
                other => expenses_total(other)?,
            };
            acc.checked_add(amount).ok_or(AmountOverflow)
        }),
        Value::Number(number) => Ok(coerce_decimal(&number.to_string())),
        Value::String(text) => Ok(coerce_decimal(&text)),
        _ => Ok(Decimal::ZERO),
    }
}

fn deserialize_expenses<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    expenses_total(value).map_err(de::Error::custom)
}

fn deserialize_expenses_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_expenses(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_date"))]
    pub date: String,

    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[serde(rename = "type", default)]
    #[validate(custom(function = "validate_event_type"))]
    pub event_type: String,

    /// Summed expense lines.
    #[serde(default, deserialize_with = "deserialize_expenses")]
    pub expenses: Decimal,
}

impl CreateEventRequest {
    pub fn into_draft(self) -> Result<NewEvent, AppError> {
        self.validate()?;
        Ok(NewEvent {
            date: required_date(&self.date)?,
            name: self.name.trim().to_string(),
            event_type: parse_event_type(&self.event_type)?,
            expenses: self.expenses,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    #[validate(custom(function = "validate_event_type"))]
    pub event_type: Option<String>,

    #[serde(default, deserialize_with = "deserialize_expenses_opt")]
    pub expenses: Option<Decimal>,
}

impl UpdateEventRequest {
    pub fn into_patch(self) -> Result<EventPatch, AppError> {
        self.validate()?;
        Ok(EventPatch {
            date: self.date.as_deref().map(required_date).transpose()?,
            name: self.name.map(|name| name.trim().to_string()),
            event_type: self.event_type.as_deref().map(parse_event_type).transpose()?,
            expenses: self.expenses,
        })
    }
}

fn required_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid date: {}", raw)))
}

fn parse_event_type(raw: &str) -> Result<EventType, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_hex(),
            date: event.date,
            name: event.name,
            event_type: event.event_type,
            expenses: event.expenses,
            revenue: event.revenue,
            profit: event.profit,
            created_utc: event.created_utc,
            updated_utc: event.updated_utc,
        }
    }
}
