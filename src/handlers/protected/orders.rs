// handlers/protected/orders.rs - Order placement and history for the caller

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::database::models::Order;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::services::{OrderError, OrderLineRequest, OrderService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderLineRequest>>,
}

/// POST /orders - Place an order owned by the caller
///
/// Expected Input:
/// ```json
/// { "items": [ { "productId": 1, "quantity": 2 } ] }
/// ```
///
/// Responds 201 with the order, its items and each item's product.
pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<Order> {
    // A body that does not even parse as an item list is an invalid item list
    let Json(payload) =
        payload.map_err(|_| ApiError::from(OrderError::InvalidItems))?;

    let order = OrderService::place(state.store(), identity.id(), payload.items).await?;
    Ok(ApiResponse::created(order))
}

/// GET /orders/my
pub async fn my_orders(State(state): State<AppState>, identity: Identity) -> ApiResult<Vec<Order>> {
    let orders = state.store().list_orders_for_user(identity.id()).await?;
    Ok(ApiResponse::ok(orders))
}
