use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::database::models::{money, NewOrderLine, Order, Product};
use crate::database::{DatabaseError, Store};

/// One requested line: which product and how many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid item list")]
    InvalidItems,
    #[error("One or more products do not exist")]
    UnknownProducts,
    #[error("Order total exceeds the maximum amount")]
    TotalOutOfRange,
    #[error("Order could not be stored: {0}")]
    Database(#[from] DatabaseError),
}

/// Order placement: validate, price against the live catalog, persist atomically.
pub struct OrderService;

impl OrderService {
    pub async fn place(
        store: &dyn Store,
        user_id: i64,
        items: Option<Vec<OrderLineRequest>>,
    ) -> Result<Order, OrderError> {
        let items = Self::validate(items)?;

        // Repeated product ids are looked up once
        let product_ids: Vec<i64> = items
            .iter()
            .map(|item| item.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let products = store.find_products(&product_ids).await?;
        if products.len() != product_ids.len() {
            return Err(OrderError::UnknownProducts);
        }

        let (total, lines) = Self::price_lines(&items, &products)?;
        let order = store.insert_order(user_id, total, &lines).await?;

        tracing::info!(
            "order {} placed by user {} ({} items, total {})",
            order.id,
            user_id,
            order.items.len(),
            order.total
        );
        Ok(order)
    }

    /// Non-empty, every quantity at least one
    fn validate(items: Option<Vec<OrderLineRequest>>) -> Result<Vec<OrderLineRequest>, OrderError> {
        match items {
            Some(items) if !items.is_empty() && items.iter().all(|i| i.quantity >= 1) => Ok(items),
            _ => Err(OrderError::InvalidItems),
        }
    }

    /// Freeze each line's unit price and sum price x quantity.
    ///
    /// Lines keep request order; one line per requested entry. A total that
    /// overflows or does not fit the stored money range is rejected.
    pub fn price_lines(
        items: &[OrderLineRequest],
        products: &[Product],
    ) -> Result<(Decimal, Vec<NewOrderLine>), OrderError> {
        let prices: HashMap<i64, Decimal> = products.iter().map(|p| (p.id, p.price)).collect();

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let unit_price = *prices
                .get(&item.product_id)
                .ok_or(OrderError::UnknownProducts)?;
            total = unit_price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or(OrderError::TotalOutOfRange)?;
            lines.push(NewOrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price,
            });
        }
        let total = money::checked_amount(total).ok_or(OrderError::TotalOutOfRange)?;
        Ok((total, lines))
    }
}
