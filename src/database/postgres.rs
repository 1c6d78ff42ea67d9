use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    NewOrderLine, NewUser, Order, OrderItem, OrderItemRow, OrderOwner, OrderRow, Product,
    ProductFields, ProductFilter, Role, RoleAssignment, SalesSummary, User, UserRecord,
};
use super::store::Store;

const MISSING_ORDER_REFERENCE: &str = "order references a missing row";

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, created_at";

const ORDER_ITEMS_WITH_PRODUCTS: &str = r#"
    SELECT
        oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price,
        p.name AS product_name,
        p.description AS product_description,
        p.price AS product_price,
        p.image AS product_image,
        p.created_at AS product_created_at
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
    WHERE oi.order_id = ANY($1)
    ORDER BY oi.id
"#;

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load items for a batch of order rows and stitch them together, keeping row order.
    async fn attach_items(
        &self,
        rows: Vec<OrderRow>,
        mut owners: HashMap<i64, OrderOwner>,
    ) -> Result<Vec<Order>, DatabaseError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(ORDER_ITEMS_WITH_PRODUCTS)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItem::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| Order {
                id: row.id,
                user_id: row.user_id,
                total: row.total,
                created_at: row.created_at,
                user: owners.remove(&row.id),
                items: items_by_order.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password, name, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, "email already registered"))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, name, role, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<RoleAssignment>, DatabaseError> {
        let updated = sqlx::query_as::<_, RoleAssignment>(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING id, email, role",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        // strpos keeps the match a literal substring (no LIKE wildcards from user input)
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL
                   OR strpos(lower(name), lower($1)) > 0
                   OR strpos(lower(coalesce(description, '')), lower($1)) > 0)
              AND ($2::numeric IS NULL OR price >= $2)
              AND ($3::numeric IS NULL OR price <= $3)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&filter.query)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn create_product(&self, fields: ProductFields) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO products (name, description, price, image) VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.price)
            .bind(&fields.image)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    async fn update_product(&self, id: i64, fields: ProductFields) -> Result<Option<Product>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, image = $5
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.price)
            .bind(&fields.image)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_constraint(e, "product is referenced by existing orders"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_products(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_order(
        &self,
        user_id: i64,
        total: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<Order, DatabaseError> {
        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (user_id, total) VALUES ($1, $2) RETURNING id, user_id, total, created_at",
        )
        .bind(user_id)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_constraint(e, MISSING_ORDER_REFERENCE))?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_constraint(e, MISSING_ORDER_REFERENCE))?;
        }

        tx.commit().await?;

        let mut created = self.attach_items(vec![order], HashMap::new()).await?;
        created
            .pop()
            .ok_or(DatabaseError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, total, created_at FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(rows, HashMap::new()).await
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, total, created_at FROM orders ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        let owners = sqlx::query_as::<_, OrderOwner>("SELECT id, email FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .fetch_all(&self.pool)
            .await?;
        let owners_by_user: HashMap<i64, OrderOwner> =
            owners.into_iter().map(|o| (o.id, o)).collect();

        let owners_by_order = rows
            .iter()
            .filter_map(|r| owners_by_user.get(&r.user_id).map(|o| (r.id, o.clone())))
            .collect();

        self.attach_items(rows, owners_by_order).await
    }

    async fn sales_summary(&self) -> Result<SalesSummary, DatabaseError> {
        let (total_sales, order_count): (Option<Decimal>, i64) =
            sqlx::query_as("SELECT SUM(total), COUNT(*) FROM orders")
                .fetch_one(&self.pool)
                .await?;
        Ok(SalesSummary {
            total_sales: total_sales.unwrap_or(Decimal::ZERO),
            order_count,
        })
    }
}
