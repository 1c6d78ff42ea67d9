// handlers/public/products.rs - Product catalog CRUD under /products

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::database::models::{Product, ProductFields, ProductFilter};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const PRODUCT_IN_USE: &str = "Product is referenced by existing orders";
pub const INVALID_PRICE: &str = "Price must be between 0 and 9999999999.99";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_price: Option<Decimal>,
}

/// `?minPrice=` means no bound, same as leaving it out
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Decimal::from_str(value)
            .or_else(|_| Decimal::from_scientific(value))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            query: query.q.filter(|q| !q.is_empty()),
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

/// GET /products?q=&minPrice=&maxPrice= - newest first
pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Vec<Product>> {
    let Query(query) = query?;
    let products = state.store().list_products(&query.into()).await?;
    Ok(ApiResponse::ok(products))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Product> {
    let Path(id) = id?;
    state
        .store()
        .get_product(id)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))
}

/// POST /products
///
/// Expected Input:
/// ```json
/// { "name": "Mug", "description": "Stoneware", "price": 12.5, "image": "/img/mug.png" }
/// ```
pub async fn create_product(
    State(state): State<AppState>,
    fields: Result<Json<ProductFields>, JsonRejection>,
) -> ApiResult<Product> {
    let Json(fields) = fields?;
    let fields = fields
        .with_checked_price()
        .ok_or_else(|| ApiError::bad_request(INVALID_PRICE))?;
    let product = state.store().create_product(fields).await?;
    tracing::info!("created product {} '{}'", product.id, product.name);
    Ok(ApiResponse::created(product))
}

/// PUT /products/:id - overwrites name, description, price and image
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    fields: Result<Json<ProductFields>, JsonRejection>,
) -> ApiResult<Product> {
    let Path(id) = id?;
    let Json(fields) = fields?;
    let fields = fields
        .with_checked_price()
        .ok_or_else(|| ApiError::bad_request(INVALID_PRICE))?;
    let product = state
        .store()
        .update_product(id, fields)
        .await?
        .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;
    tracing::info!("updated product {}", product.id);
    Ok(ApiResponse::ok(product))
}

/// DELETE /products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Ack> {
    let Path(id) = id?;
    let deleted = state.store().delete_product(id).await.map_err(|e| match e {
        DatabaseError::InUse(_) => ApiError::bad_request(PRODUCT_IN_USE),
        other => other.into(),
    })?;
    if !deleted {
        return Err(ApiError::not_found(PRODUCT_NOT_FOUND));
    }
    tracing::info!("deleted product {}", id);
    Ok(ApiResponse::ok(Ack {
        message: "Product deleted",
    }))
}
