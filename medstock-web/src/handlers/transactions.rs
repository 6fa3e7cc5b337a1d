//! Stock movement handlers

use super::types::MovementBody;
use crate::auth::CurrentSession;
use crate::error::ErrorResponse;
use crate::{ApiError, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use medstock_ledger::{LedgerEntry, MovementOutcome, MovementRequest, TransactionFilter};

/// List ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    summary = "List transactions",
    params(TransactionFilter),
    responses(
        (status = 200, description = "Ledger entries", body = Vec<LedgerEntry>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    Ok(Json(state.ledger.list_transactions(&session, &filter).await?))
}

/// Record a stock movement
///
/// Applies the movement and appends the ledger entry atomically. A stock-out
/// larger than the current quantity is rejected with 409.
#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "Transactions",
    summary = "Record movement",
    request_body = MovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = MovementOutcome),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Insufficient stock", body = ErrorResponse),
        (status = 422, description = "Invalid or malformed quantity", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    WithRejection(Json(body), _): WithRejection<Json<MovementBody>, ApiError>,
) -> Result<(StatusCode, Json<MovementOutcome>), ApiError> {
    let request = MovementRequest::try_from(body)?;
    let outcome = state.ledger.apply_movement(&session, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
