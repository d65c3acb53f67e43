use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{
    zip_columns, FieldErrors, FormIntent, FormState, OVERFLOW_MESSAGE, STORE_FAILURE_MESSAGE,
};
use crate::dtos::{CreateEventRequest, UpdateEventRequest};
use crate::models::{Event, EventPatch, EventType, ExpenseLine, NewEvent};
use crate::services::calculator::{self, AmountOverflow};
use crate::utils::numeric::coerce_decimal;

const BLANK_EXPENSE_ROWS: usize = 3;

/// Raw form post. Expense rows arrive as repeated fields.
#[derive(Debug, Default, Deserialize)]
pub struct EventFormInput {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub expense_description: Vec<String>,
    #[serde(default)]
    pub expense_amount: Vec<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseRow {
    pub description: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    pub state: FormState,
    pub date: String,
    pub name: String,
    pub event_type: String,
    pub expenses: Vec<ExpenseRow>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl EventForm {
    pub fn blank() -> Self {
        Self {
            state: FormState::Editing,
            date: String::new(),
            name: String::new(),
            event_type: String::new(),
            expenses: vec![ExpenseRow::default(); BLANK_EXPENSE_ROWS],
            errors: FieldErrors::default(),
            error: None,
        }
    }

    /// Edit form: the stored aggregate becomes a single "Total Expenses" row.
    pub fn for_event(event: &Event) -> Self {
        let mut expenses = vec![ExpenseRow {
            description: "Total Expenses".to_string(),
            amount: calculator::format_amount(event.expenses),
        }];
        expenses.resize(BLANK_EXPENSE_ROWS, ExpenseRow::default());

        Self {
            date: event.date.format(crate::dtos::DATE_FORMAT).to_string(),
            name: event.name.clone(),
            event_type: event.event_type.as_str().to_string(),
            expenses,
            ..Self::blank()
        }
    }

    /// Rebuild the form from a post, applying row-level intents.
    pub fn from_input(input: EventFormInput) -> (Self, FormIntent) {
        let intent = FormIntent::parse(input.intent.as_deref());
        let mut expenses: Vec<ExpenseRow> =
            zip_columns([input.expense_description, input.expense_amount])
                .into_iter()
                .map(|[description, amount]| ExpenseRow {
                    description,
                    amount,
                })
                .collect();
        if intent == FormIntent::AddRow || expenses.is_empty() {
            expenses.push(ExpenseRow::default());
        }

        let form = Self {
            date: input.date,
            name: input.name,
            event_type: input.event_type,
            expenses,
            ..Self::blank()
        };
        (form, intent)
    }

    pub fn expense_lines(&self) -> Vec<ExpenseLine> {
        self.expenses
            .iter()
            .map(|row| ExpenseLine::new(row.description.trim(), coerce_decimal(&row.amount)))
            .collect()
    }

    pub fn total_expenses(&self) -> Result<Decimal, AmountOverflow> {
        calculator::total_expenses(&self.expense_lines())
    }

    pub fn total_expenses_display(&self) -> String {
        calculator::format_computed(self.total_expenses())
    }

    pub fn event_types(&self) -> &'static [EventType] {
        &EventType::ALL
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    fn request(&self, expenses: Decimal) -> CreateEventRequest {
        CreateEventRequest {
            date: self.date.clone(),
            name: self.name.clone(),
            event_type: self.event_type.clone(),
            expenses,
        }
    }

    /// Validate for creation. On success the form moves to `Submitting` and
    /// the draft is returned; otherwise it stays `Editing` with inline errors.
    pub fn begin_create(&mut self) -> Option<NewEvent> {
        self.error = None;
        let Ok(expenses) = self.total_expenses() else {
            return self.reject_overflow();
        };
        match self.request(expenses).validate() {
            Ok(()) => match self.request(expenses).into_draft() {
                Ok(draft) => {
                    self.errors.clear();
                    self.state = FormState::Submitting;
                    Some(draft)
                }
                Err(_) => self.reject_generic(),
            },
            Err(errors) => {
                self.errors = FieldErrors::from(&errors);
                self.state = FormState::Editing;
                None
            }
        }
    }

    /// Validate for an edit; every field is sent, so the patch overwrites
    /// date, name, type and expenses.
    pub fn begin_update(&mut self) -> Option<EventPatch> {
        self.error = None;
        let Ok(expenses) = self.total_expenses() else {
            return self.reject_overflow();
        };
        if let Err(errors) = self.request(expenses).validate() {
            self.errors = FieldErrors::from(&errors);
            self.state = FormState::Editing;
            return None;
        }

        let request = UpdateEventRequest {
            date: Some(self.date.clone()),
            name: Some(self.name.clone()),
            event_type: Some(self.event_type.clone()),
            expenses: Some(expenses),
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

    /// The store accepted the write: reset to a blank form.
    pub fn succeeded(&mut self) {
        *self = Self {
            state: FormState::Idle,
            ..Self::blank()
        };
    }

    /// The store rejected the write: keep the input and show a generic error.
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

impl Default for EventForm {
    fn default() -> Self {
        Self::blank()
    }
}
