use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{AddItemResponse, SavedInvoicesResponse, UpdateCustomerRequest, UpdateItemRequest};
use crate::editor::{EditorView, SaveOutcome};
use crate::models::{Currency, ItemField, LineItemId};
use crate::startup::AppState;

pub async fn get_invoice(State(state): State<AppState>) -> Json<EditorView> {
    Json(state.editor.view().await)
}

pub async fn update_customer(
    State(state): State<AppState>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<EditorView>, AppError> {
    // Validate before touching the draft so a bad currency changes nothing.
    let currency = req
        .currency
        .as_deref()
        .map(str::parse::<Currency>)
        .transpose()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    if let Some(name) = req.customer_name {
        state.editor.set_customer_name(name).await;
    }
    if let Some(email) = req.customer_email {
        state.editor.set_customer_email(email).await;
    }
    if let Some(currency) = currency {
        state.editor.set_currency(currency).await;
    }

    Ok(Json(state.editor.view().await))
}

pub async fn add_item(State(state): State<AppState>) -> impl IntoResponse {
    let id = state.editor.add_item().await;
    let invoice = state.editor.view().await;
    (StatusCode::CREATED, Json(AddItemResponse { id, invoice }))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<EditorView>, AppError> {
    let field: ItemField = req
        .field
        .parse()
        .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))?;

    state
        .editor
        .update_item(LineItemId(id), field, req.value)
        .await;

    Ok(Json(state.editor.view().await))
}

pub async fn remove_item(State(state): State<AppState>, Path(id): Path<u64>) -> Json<EditorView> {
    state.editor.remove_item(LineItemId(id)).await;
    Json(state.editor.view().await)
}

pub async fn save_invoice(State(state): State<AppState>) -> Json<SaveOutcome> {
    Json(state.editor.save().await)
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<SavedInvoicesResponse>, AppError> {
    let invoices = state.editor.saved_invoices().await?;
    let total = invoices.len();
    Ok(Json(SavedInvoicesResponse { invoices, total }))
}

pub async fn print_invoice(State(state): State<AppState>) -> impl IntoResponse {
    state.editor.print(&state.config.print).await
}
