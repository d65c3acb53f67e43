use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{InvoiceResponse, UpdateInvoiceRequest},
    middleware::AuthUser,
    services::{DeleteAck, UpdateAck},
    utils::parse_object_id,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn list_invoices(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.invoices.list().await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

/// Responds with `null` for an unknown id.
#[tracing::instrument(skip(state, _user))]
pub async fn get_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Option<InvoiceResponse>>, AppError> {
    let id = parse_object_id(&id)?;
    let invoice = state.invoices.get(&id).await?;
    Ok(Json(invoice.map(InvoiceResponse::from)))
}

#[tracing::instrument(skip(state, _user, payload))]
pub async fn update_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_object_id(&id)?;
    let patch = payload.into_patch()?;
    Ok(Json(state.invoices.update(&id, patch).await?))
}

/// Deleting an invoice withdraws its total from the event's revenue.
#[tracing::instrument(skip(state, _user))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(state.invoices.delete(&id).await?))
}
