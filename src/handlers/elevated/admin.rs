// handlers/elevated/admin.rs - Admin reporting and role management under /admin

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::database::models::{Order, Role, RoleAssignment, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::state::AppState;

pub const INVALID_ROLE: &str = "Invalid role";
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_sales: Decimal,
    pub total_orders: i64,
    pub total_users: i64,
    pub total_products: i64,
}

/// GET /admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store().list_users().await?;
    Ok(ApiResponse::ok(users))
}

/// PATCH /admin/users/:id/role
///
/// Expected Input:
/// ```json
/// { "role": "ADMIN" }
/// ```
///
/// Anything other than `ADMIN` or `USER` is rejected before the store is touched.
pub async fn set_user_role(
    State(state): State<AppState>,
    admin: Identity,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SetRoleRequest>, JsonRejection>,
) -> ApiResult<RoleAssignment> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let role = payload
        .role
        .as_deref()
        .and_then(|r| Role::from_str(r).ok())
        .ok_or_else(|| ApiError::bad_request(INVALID_ROLE))?;

    let updated = state
        .store()
        .set_user_role(id, role)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    tracing::info!("admin {} set role of user {} to {}", admin.id(), updated.id, updated.role);
    Ok(ApiResponse::ok(updated))
}

/// GET /admin/orders - every order with its owner and items
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<Order>> {
    let orders = state.store().list_all_orders().await?;
    Ok(ApiResponse::ok(orders))
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    let store = state.store();
    let (sales, total_users, total_products) = tokio::try_join!(
        store.sales_summary(),
        store.count_users(),
        store.count_products()
    )?;

    Ok(ApiResponse::ok(AdminStats {
        total_sales: sales.total_sales,
        total_orders: sales.order_count,
        total_users,
        total_products,
    }))
}
