use async_trait::async_trait;
use rust_decimal::Decimal;

use super::manager::DatabaseError;
use super::models::{
    NewOrderLine, NewUser, Order, Product, ProductFields, ProductFilter, Role, RoleAssignment,
    SalesSummary, User, UserRecord,
};

/// Persistence operations behind every handler.
///
/// Listings come back newest first. Order reads always carry their items
/// with each item's product attached.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Users
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<RoleAssignment>, DatabaseError>;

    async fn count_users(&self) -> Result<i64, DatabaseError>;

    // Products
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError>;

    async fn get_product(&self, id: i64) -> Result<Option<Product>, DatabaseError>;

    /// Batch lookup; ids that do not exist are simply absent from the result.
    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError>;

    async fn create_product(&self, fields: ProductFields) -> Result<Product, DatabaseError>;

    async fn update_product(&self, id: i64, fields: ProductFields) -> Result<Option<Product>, DatabaseError>;

    /// Returns false when absent. Fails with `DatabaseError::InUse` when an order references it.
    async fn delete_product(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn count_products(&self) -> Result<i64, DatabaseError>;

    // Orders
    /// Inserts the order and all of its lines as one unit.
    async fn insert_order(
        &self,
        user_id: i64,
        total: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<Order, DatabaseError>;

    async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, DatabaseError>;

    /// Every order, each with its owner summary attached.
    async fn list_all_orders(&self) -> Result<Vec<Order>, DatabaseError>;

    async fn sales_summary(&self) -> Result<SalesSummary, DatabaseError>;
}
