use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::Form;

use super::dashboard::InvoiceFormTemplate;
use super::{not_found, rejected_status, InvoiceSheet, PageResult};
use crate::forms::{FormIntent, InvoiceForm, InvoiceFormInput};
use crate::middleware::AuthUser;
use crate::utils::parse_object_id;
use crate::AppState;

#[derive(Template)]
#[template(path = "invoice_print.html")]
pub struct InvoicePrintTemplate {
    pub invoice: InvoiceSheet,
}

fn edit_page(operator: String, invoice_id: &str, event_name: String, form: InvoiceForm) -> InvoiceFormTemplate {
    InvoiceFormTemplate {
        operator,
        heading: "Edit Invoice".to_string(),
        action: format!("/dashboard/invoices/{}", invoice_id),
        event_name,
        editing: true,
        form,
    }
}

pub async fn edit_invoice_page(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let invoice_id = parse_object_id(&id)?;
    let invoice = state
        .invoices
        .get(&invoice_id)
        .await?
        .ok_or_else(|| not_found("Invoice"))?;

    let form = InvoiceForm::for_invoice(&invoice);
    Ok(edit_page(claims.sub, &invoice_id.to_hex(), invoice.event_name, form).into_response())
}

#[tracing::instrument(skip(state, claims, input))]
pub async fn update_invoice(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Form(input): Form<InvoiceFormInput>,
) -> PageResult {
    let invoice_id = parse_object_id(&id)?;
    let invoice = state
        .invoices
        .get(&invoice_id)
        .await?
        .ok_or_else(|| not_found("Invoice"))?;
    let hex_id = invoice_id.to_hex();

    let (mut form, intent) = InvoiceForm::from_input(input);

    if intent != FormIntent::Submit {
        return Ok(edit_page(claims.sub, &hex_id, invoice.event_name, form).into_response());
    }

    let Some(patch) = form.begin_update() else {
        let page = edit_page(claims.sub, &hex_id, invoice.event_name, form);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    };

    match state.invoices.update(&invoice_id, patch).await {
        Ok(ack) if ack.matched_count == 0 => Err(not_found("Invoice")),
        Ok(_) => {
            form.succeeded();
            Ok(Redirect::to("/dashboard?tab=invoices").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to update invoice: {}", e);
            form.failed();
            let page = edit_page(claims.sub, &hex_id, invoice.event_name, form);
            Ok((rejected_status(&e), page).into_response())
        }
    }
}

#[tracing::instrument(skip(state, _user))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let invoice_id = parse_object_id(&id)?;
    state.invoices.delete(&invoice_id).await?;
    Ok(Redirect::to("/dashboard?tab=invoices").into_response())
}

pub async fn print_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> PageResult {
    let invoice_id = parse_object_id(&id)?;
    let invoice = state
        .invoices
        .get(&invoice_id)
        .await?
        .ok_or_else(|| not_found("Invoice"))?;

    Ok(InvoicePrintTemplate {
        invoice: InvoiceSheet::from(&invoice),
    }
    .into_response())
}
