use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{
    NewOrderLine, NewUser, Order, OrderItem, OrderOwner, Product, ProductFields, ProductFilter,
    Role, RoleAssignment, SalesSummary, User, UserRecord,
};
use super::store::Store;

/// In-process store for tests and database-less development runs.
///
/// Every mutation takes the single write lock, so an order and its items
/// become visible together or not at all.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, StoredOrder>,
    items: BTreeMap<i64, StoredItem>,
    next_user_id: i64,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
}

struct StoredOrder {
    user_id: i64,
    total: Decimal,
    created_at: DateTime<Utc>,
}

struct StoredItem {
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Newest first, ties broken by higher id
fn newest_first<T>(rows: &mut [(i64, DateTime<Utc>, T)]) {
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of order and order item rows, for atomicity checks
    pub async fn row_counts(&self) -> (usize, usize) {
        let tables = self.tables.read().await;
        (tables.orders.len(), tables.items.len())
    }
}

impl Tables {
    fn load_order(&self, id: i64, with_owner: bool) -> Option<Order> {
        let stored = self.orders.get(&id)?;
        let items = self
            .items
            .iter()
            .filter(|(_, item)| item.order_id == id)
            .filter_map(|(item_id, item)| {
                let product = self.products.get(&item.product_id)?.clone();
                Some(OrderItem {
                    id: *item_id,
                    order_id: id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    product,
                })
            })
            .collect();
        let user = if with_owner {
            self.users.get(&stored.user_id).map(|u| OrderOwner {
                id: u.id,
                email: u.email.clone(),
            })
        } else {
            None
        };

        Some(Order {
            id,
            user_id: stored.user_id,
            total: stored.total,
            created_at: stored.created_at,
            user,
            items,
        })
    }

    fn orders_where(&self, keep: impl Fn(&StoredOrder) -> bool, with_owner: bool) -> Vec<Order> {
        let mut rows: Vec<(i64, DateTime<Utc>, ())> = self
            .orders
            .iter()
            .filter(|(_, o)| keep(o))
            .map(|(id, o)| (*id, o.created_at, ()))
            .collect();
        newest_first(&mut rows);
        rows.into_iter()
            .filter_map(|(id, _, _)| self.load_order(id, with_owner))
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("email already registered".to_string()));
        }
        let id = next_id(&mut tables.next_user_id);
        let record = UserRecord {
            id,
            email: user.email,
            password: user.password_hash,
            name: user.name,
            role: Role::User,
            created_at: Utc::now(),
        };
        tables.users.insert(id, record.clone());
        Ok(User::from(record))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<(i64, DateTime<Utc>, User)> = tables
            .users
            .values()
            .map(|u| (u.id, u.created_at, User::from(u.clone())))
            .collect();
        newest_first(&mut rows);
        Ok(rows.into_iter().map(|(_, _, u)| u).collect())
    }

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<RoleAssignment>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            RoleAssignment {
                id: user.id,
                email: user.email.clone(),
                role,
            }
        }))
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<(i64, DateTime<Utc>, Product)> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .map(|p| (p.id, p.created_at, p.clone()))
            .collect();
        newest_first(&mut rows);
        Ok(rows.into_iter().map(|(_, _, p)| p).collect())
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, fields: ProductFields) -> Result<Product, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_product_id);
        let product = Product {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            image: fields.image,
            created_at: Utc::now(),
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, fields: ProductFields) -> Result<Option<Product>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.name = fields.name;
            product.description = fields.description;
            product.price = fields.price;
            product.image = fields.image;
            product.clone()
        }))
    }

    async fn delete_product(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Ok(false);
        }
        if tables.items.values().any(|item| item.product_id == id) {
            return Err(DatabaseError::InUse(
                "product is referenced by existing orders".to_string(),
            ));
        }
        tables.products.remove(&id);
        Ok(true)
    }

    async fn count_products(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.products.len() as i64)
    }

    async fn insert_order(
        &self,
        user_id: i64,
        total: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<Order, DatabaseError> {
        let mut tables = self.tables.write().await;

        // Same constraints Postgres enforces, checked before anything is written
        if !tables.users.contains_key(&user_id)
            || lines.iter().any(|l| !tables.products.contains_key(&l.product_id))
        {
            return Err(DatabaseError::InUse("order references a missing row".to_string()));
        }

        let order_id = next_id(&mut tables.next_order_id);
        tables.orders.insert(
            order_id,
            StoredOrder {
                user_id,
                total,
                created_at: Utc::now(),
            },
        );
        for line in lines {
            let item_id = next_id(&mut tables.next_item_id);
            tables.items.insert(
                item_id,
                StoredItem {
                    order_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                },
            );
        }

        tables
            .load_order(order_id, false)
            .ok_or(DatabaseError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.orders_where(|o| o.user_id == user_id, false))
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.orders_where(|_| true, true))
    }

    async fn sales_summary(&self) -> Result<SalesSummary, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(SalesSummary {
            total_sales: tables.orders.values().map(|o| o.total).sum(),
            order_count: tables.orders.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, price: i64) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            description: None,
            price: Decimal::from(price),
            image: None,
        }
    }

    async fn seeded_user(store: &MemoryStore) -> User {
        store
            .create_user(NewUser {
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
                name: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        seeded_user(&store).await;
        let err = store
            .create_user(NewUser {
                email: "a@x.com".to_string(),
                password_hash: "other".to_string(),
                name: Some("Dup".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn new_users_default_to_user_role() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn products_list_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_product(fields("first", 1)).await.unwrap();
        let second = store.create_product(fields("second", 2)).await.unwrap();

        let listed = store.list_products(&ProductFilter::default()).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn order_with_missing_product_writes_nothing() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let product = store.create_product(fields("mug", 5)).await.unwrap();

        let lines = vec![
            NewOrderLine { product_id: product.id, quantity: 1, unit_price: product.price },
            NewOrderLine { product_id: 999, quantity: 1, unit_price: Decimal::ONE },
        ];
        assert!(store.insert_order(user.id, Decimal::from(6), &lines).await.is_err());
        assert_eq!(store.row_counts().await, (0, 0));
    }

    #[tokio::test]
    async fn referenced_product_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let product = store.create_product(fields("mug", 5)).await.unwrap();
        let lines = vec![NewOrderLine { product_id: product.id, quantity: 2, unit_price: product.price }];
        store.insert_order(user.id, Decimal::from(10), &lines).await.unwrap();

        let err = store.delete_product(product.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InUse(_)));
        assert!(!store.delete_product(12345).await.unwrap());
    }

    #[tokio::test]
    async fn sales_summary_of_empty_store_is_zero() {
        let store = MemoryStore::new();
        let summary = store.sales_summary().await.unwrap();
        assert_eq!(summary.total_sales, Decimal::ZERO);
        assert_eq!(summary.order_count, 0);
    }
}
