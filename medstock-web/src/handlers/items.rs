//! Catalog handlers

use crate::auth::CurrentSession;
use crate::error::ErrorResponse;
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use medstock_ledger::{ItemView, NewItem};

/// List items with their low-stock flag
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Items",
    summary = "List items",
    responses(
        (status = 200, description = "All items, newest first", body = Vec<ItemView>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn list_items(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    Ok(Json(state.ledger.list_items(&session).await?))
}

/// Items at or below their minimum stock
#[utoipa::path(
    get,
    path = "/api/items/low-stock",
    tag = "Items",
    summary = "Low-stock items",
    responses(
        (status = 200, description = "Items needing reorder", body = Vec<ItemView>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn low_stock_items(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    Ok(Json(state.ledger.low_stock_items(&session).await?))
}

/// Get one item
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Items",
    summary = "Get item",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemView),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn get_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i64>,
) -> Result<Json<ItemView>, ApiError> {
    Ok(Json(state.ledger.get_item(&session, id).await?))
}

/// Catalog intake
///
/// The initial quantity becomes the item's baseline; later changes go
/// through stock movements.
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Items",
    summary = "Add item",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item created", body = ItemView),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 422, description = "Invalid item", body = ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
pub async fn create_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    WithRejection(Json(request), _): WithRejection<Json<NewItem>, ApiError>,
) -> Result<(StatusCode, Json<ItemView>), ApiError> {
    let item = state.ledger.create_item(&session, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}
