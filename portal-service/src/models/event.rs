use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::services::calculator::{self, AmountOverflow};
use crate::services::repository::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Wedding,
    Birthday,
    Engagement,
    Anniversary,
    Custom,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Wedding,
        EventType::Birthday,
        EventType::Engagement,
        EventType::Anniversary,
        EventType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Wedding => "wedding",
            EventType::Birthday => "birthday",
            EventType::Engagement => "engagement",
            EventType::Anniversary => "anniversary",
            EventType::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::Wedding => "Wedding",
            EventType::Birthday => "Birthday",
            EventType::Engagement => "Engagement",
            EventType::Anniversary => "Anniversary",
            EventType::Custom => "Custom Event",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// One row of an expense breakdown. Only the aggregate is ever stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub description: String,
    pub amount: Decimal,
}

impl ExpenseLine {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// A decor engagement with its cost and income.
///
/// `profit` is derived: every mutation goes through a method that recomputes it
/// as `revenue - expenses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub expenses: Decimal,
    pub revenue: Decimal,
    pub profit: Decimal,
    #[serde(default)]
    pub version: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

/// Validated input for a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub date: NaiveDate,
    pub name: String,
    pub event_type: EventType,
    pub expenses: Decimal,
}

impl NewEvent {
    pub fn from_lines(
        date: NaiveDate,
        name: impl Into<String>,
        event_type: EventType,
        lines: &[ExpenseLine],
    ) -> Result<Self, AmountOverflow> {
        Ok(Self {
            date,
            name: name.into(),
            event_type,
            expenses: calculator::total_expenses(lines)?,
        })
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub event_type: Option<EventType>,
    pub expenses: Option<Decimal>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.name.is_none()
            && self.event_type.is_none()
            && self.expenses.is_none()
    }
}

impl Event {
    pub fn new(draft: NewEvent) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            date: draft.date,
            name: draft.name,
            event_type: draft.event_type,
            expenses: draft.expenses,
            revenue: Decimal::ZERO,
            // Nothing invoiced yet; negation cannot overflow.
            profit: -draft.expenses,
            version: 0,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn apply_patch(&mut self, patch: &EventPatch) -> Result<(), AmountOverflow> {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(event_type) = patch.event_type {
            self.event_type = event_type;
        }
        if let Some(expenses) = patch.expenses {
            self.expenses = expenses;
        }
        self.recompute_profit()
    }

    /// Add (or, with a negative amount, withdraw) invoiced income.
    pub fn post_revenue(&mut self, amount: Decimal) -> Result<(), AmountOverflow> {
        self.revenue = self.revenue.checked_add(amount).ok_or(AmountOverflow)?;
        self.recompute_profit()
    }

    fn recompute_profit(&mut self) -> Result<(), AmountOverflow> {
        self.profit = calculator::profit(self.revenue, self.expenses)?;
        Ok(())
    }
}

impl Record for Event {
    const KIND: &'static str = "event";

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
