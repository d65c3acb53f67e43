use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::Form;
use serde::Deserialize;

use super::{not_found, rejected_status, EventRow, InvoiceRow, PageError, PageResult};
use crate::forms::{EventForm, EventFormInput, FormIntent, InvoiceForm, InvoiceFormInput};
use crate::middleware::AuthUser;
use crate::utils::parse_object_id;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Events,
    Invoices,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub tab: Tab,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub operator: String,
    pub show_invoices: bool,
    pub form: EventForm,
    pub events: Vec<EventRow>,
    pub invoices: Vec<InvoiceRow>,
}

#[derive(Template)]
#[template(path = "event_edit.html")]
pub struct EventEditTemplate {
    pub operator: String,
    pub event_id: String,
    pub form: EventForm,
}

#[derive(Template)]
#[template(path = "invoice_form.html")]
pub struct InvoiceFormTemplate {
    pub operator: String,
    pub heading: String,
    pub action: String,
    pub event_name: String,
    pub editing: bool,
    pub form: InvoiceForm,
}

async fn render_dashboard(
    state: &AppState,
    operator: String,
    tab: Tab,
    form: EventForm,
) -> Result<DashboardTemplate, PageError> {
    let events = state.events.list().await?;
    let invoices = state.invoices.list().await?;
    Ok(DashboardTemplate {
        operator,
        show_invoices: tab == Tab::Invoices,
        form,
        events: events.iter().map(EventRow::from).collect(),
        invoices: invoices.iter().map(InvoiceRow::from).collect(),
    })
}

pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    query: Option<Query<DashboardQuery>>,
) -> PageResult {
    // An unrecognised tab shows the events list.
    let tab = query.map(|Query(query)| query.tab).unwrap_or_default();
    let page = render_dashboard(&state, claims.sub, tab, EventForm::blank()).await?;
    Ok(page.into_response())
}

#[tracing::instrument(skip_all)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Form(input): Form<EventFormInput>,
) -> PageResult {
    let (mut form, intent) = EventForm::from_input(input);

    if intent != FormIntent::Submit {
        let page = render_dashboard(&state, claims.sub, Tab::Events, form).await?;
        return Ok(page.into_response());
    }

    let Some(draft) = form.begin_create() else {
        let page = render_dashboard(&state, claims.sub, Tab::Events, form).await?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    };

    match state.events.create(draft).await {
        Ok(_) => {
            form.succeeded();
            Ok(Redirect::to("/dashboard?tab=events").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to create event: {}", e);
            form.failed();
            let page = render_dashboard(&state, claims.sub, Tab::Events, form).await?;
            Ok((rejected_status(&e), page).into_response())
        }
    }
}

pub async fn edit_event_page(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let event_id = parse_object_id(&id)?;
    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| not_found("Event"))?;

    Ok(EventEditTemplate {
        operator: claims.sub,
        event_id: event_id.to_hex(),
        form: EventForm::for_event(&event),
    }
    .into_response())
}

#[tracing::instrument(skip(state, claims, input))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Form(input): Form<EventFormInput>,
) -> PageResult {
    let event_id = parse_object_id(&id)?;
    let (mut form, intent) = EventForm::from_input(input);
    let page = |form: EventForm| EventEditTemplate {
        operator: claims.sub.clone(),
        event_id: event_id.to_hex(),
        form,
    };

    if intent != FormIntent::Submit {
        return Ok(page(form).into_response());
    }

    let Some(patch) = form.begin_update() else {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page(form)).into_response());
    };

    match state.events.update(&event_id, patch).await {
        Ok(ack) if ack.matched_count == 0 => Err(not_found("Event")),
        Ok(_) => {
            form.succeeded();
            Ok(Redirect::to("/dashboard?tab=events").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to update event: {}", e);
            form.failed();
            Ok((rejected_status(&e), page(form)).into_response())
        }
    }
}

#[tracing::instrument(skip(state, _user))]
pub async fn delete_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let event_id = parse_object_id(&id)?;
    state.events.delete(&event_id).await?;
    Ok(Redirect::to("/dashboard?tab=events").into_response())
}

pub async fn new_invoice_page(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let event_id = parse_object_id(&id)?;
    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| not_found("Event"))?;

    Ok(InvoiceFormTemplate {
        operator: claims.sub,
        heading: "Create Invoice".to_string(),
        action: format!("/dashboard/events/{}/invoices/new", event_id.to_hex()),
        event_name: event.name,
        editing: false,
        form: InvoiceForm::blank(),
    }
    .into_response())
}

#[tracing::instrument(skip(state, claims, input))]
pub async fn create_invoice(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Form(input): Form<InvoiceFormInput>,
) -> PageResult {
    let event_id = parse_object_id(&id)?;
    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| not_found("Event"))?;

    let (mut form, intent) = InvoiceForm::from_input(input);
    let page = |form: InvoiceForm| InvoiceFormTemplate {
        operator: claims.sub.clone(),
        heading: "Create Invoice".to_string(),
        action: format!("/dashboard/events/{}/invoices/new", event_id.to_hex()),
        event_name: event.name.clone(),
        editing: false,
        form,
    };

    if intent != FormIntent::Submit {
        return Ok(page(form).into_response());
    }

    let Some(draft) = form.begin_create() else {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page(form)).into_response());
    };

    match state.invoices.create_for_event(&event_id, draft).await {
        Ok(_) => {
            form.succeeded();
            Ok(Redirect::to("/dashboard?tab=invoices").into_response())
        }
        Err(e @ service_core::error::AppError::NotFound(_)) => Err(PageError(e)),
        Err(e) => {
            tracing::error!("Failed to create invoice: {}", e);
            form.failed();
            Ok((rejected_status(&e), page(form)).into_response())
        }
    }
}
