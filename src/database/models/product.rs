use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Writable product columns. Update is a full overwrite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductFields {
    /// Same fields with the price rounded to cents, or `None` when the
    /// price is negative or too large to store.
    pub fn with_checked_price(mut self) -> Option<Self> {
        self.price = money::checked_amount(self.price)?;
        Some(self)
    }
}

/// Catalog listing filter. Every bound is optional and applied independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub query: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// Case-insensitive substring match on name or description, inclusive price bounds.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, description: Option<&str>, price: i64) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            description: description.map(str::to_string),
            price: Decimal::from(price),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ProductFilter::default().matches(&product("Mug", None, 3)));
    }

    #[test]
    fn query_matches_name_or_description_ignoring_case() {
        let filter = ProductFilter {
            query: Some("foo".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&product("FOOTBALL", None, 10)));
        assert!(filter.matches(&product("Ball", Some("a Foo thing"), 10)));
        assert!(!filter.matches(&product("Ball", Some("round"), 10)));
        assert!(!filter.matches(&product("Ball", None, 10)));
    }

    fn fields(price: Decimal) -> ProductFields {
        ProductFields {
            name: "Mug".to_string(),
            description: None,
            price,
            image: None,
        }
    }

    #[test]
    fn checked_price_rounds_to_cents() {
        let checked = fields(Decimal::new(1005, 3)).with_checked_price().unwrap();
        assert_eq!(checked.price, Decimal::new(101, 2));
    }

    #[test]
    fn checked_price_rejects_negative_and_oversized() {
        assert!(fields(Decimal::new(-1, 0)).with_checked_price().is_none());
        assert!(fields(Decimal::new(5, 0) * Decimal::from(10_i64.pow(18)))
            .with_checked_price()
            .is_none());
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let filter = ProductFilter {
            min_price: Some(Decimal::from(10)),
            max_price: Some(Decimal::from(20)),
            ..Default::default()
        };
        assert!(filter.matches(&product("a", None, 10)));
        assert!(filter.matches(&product("b", None, 20)));
        assert!(!filter.matches(&product("c", None, 9)));
        assert!(!filter.matches(&product("d", None, 21)));
    }
}
