use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::product::Product;

/// An order with its line items (and each item's product) eagerly loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    /// Owner summary, only present on the admin listing
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<OrderOwner>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Product price frozen at order time
    pub unit_price: Decimal,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderOwner {
    pub id: i64,
    pub email: String,
}

/// One line to insert alongside a new order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Aggregate over every order in the store
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SalesSummary {
    pub total_sales: Decimal,
    pub order_count: i64,
}

/// Flat `orders` row
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// `order_items` joined with `products`, one row per line item
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub product_created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            product: Product {
                id: row.product_id,
                name: row.product_name,
                description: row.product_description,
                price: row.product_price,
                image: row.product_image,
                created_at: row.product_created_at,
            },
        }
    }
}
