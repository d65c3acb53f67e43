use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CreateEventRequest, CreateInvoiceRequest, EventResponse, InvoiceResponse, UpdateEventRequest},
    middleware::AuthUser,
    services::{DeleteAck, InsertAck, UpdateAck},
    utils::parse_object_id,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn list_events(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.events.list().await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[tracing::instrument(skip(state, _user, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<InsertAck<EventResponse>>), AppError> {
    let draft = payload.into_draft()?;
    let ack = state.events.create(draft).await?;
    Ok((StatusCode::CREATED, Json(ack.map(EventResponse::from))))
}

/// Responds with `null` for an unknown id.
#[tracing::instrument(skip(state, _user))]
pub async fn get_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Option<EventResponse>>, AppError> {
    let id = parse_object_id(&id)?;
    let event = state.events.get(&id).await?;
    Ok(Json(event.map(EventResponse::from)))
}

#[tracing::instrument(skip(state, _user, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_object_id(&id)?;
    let patch = payload.into_patch()?;
    Ok(Json(state.events.update(&id, patch).await?))
}

#[tracing::instrument(skip(state, _user))]
pub async fn delete_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(state.events.delete(&id).await?))
}

#[tracing::instrument(skip(state, _user))]
pub async fn list_event_invoices(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let id = parse_object_id(&id)?;
    let invoices = state.invoices.list_for_event(&id).await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

#[tracing::instrument(skip(state, _user, payload))]
pub async fn create_event_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InsertAck<InvoiceResponse>>), AppError> {
    let event_id = parse_object_id(&id)?;
    let draft = payload.into_draft()?;
    let ack = state.invoices.create_for_event(&event_id, draft).await?;
    Ok((StatusCode::CREATED, Json(ack.map(InvoiceResponse::from))))
}
