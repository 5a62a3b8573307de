//! PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    cart::{CartItem, CartLine},
    order::{NewOrder, NewOrderItem, Order, OrderItem},
    product::{NewProduct, Product},
    store::{CartStore, CatalogStore, OrderStore},
};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            title: row.try_get("title")?,
            image_url: row.try_get("image_url")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock_quantity: row.try_get::<i32, _>("stock_quantity")? as u32,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
        Ok(CartItem {
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            payment_method: row.try_get("payment_method")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::InvalidStatus(e.0))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }
}

/// Applies a guarded relative stock update inside `executor`.
///
/// Returns the new stock level, or None when no row matched (product missing
/// or the delta would drive stock negative — callers disambiguate).
async fn try_adjust_stock<'e, E>(executor: E, product_id: ProductId, delta: i64) -> Result<Option<u32>>
where
    E: sqlx::PgExecutor<'e>,
{
    let new_stock: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + $2
        WHERE id = $1 AND stock_quantity + $2 >= 0
        RETURNING stock_quantity
        "#,
    )
    .bind(product_id.as_uuid())
    .bind(delta)
    .fetch_optional(executor)
    .await?;

    Ok(new_stock.map(|s| s as u32))
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let id = ProductId::new();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (id, title, image_url, price_cents, stock_quantity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&product.title)
        .bind(&product.image_url)
        .bind(product.price.cents())
        .bind(product.stock_quantity as i32)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            stock_quantity: product.stock_quantity,
            created_at,
        })
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, image_url, price_cents, stock_quantity, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, image_url, price_cents, stock_quantity, created_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_price(&self, product_id: ProductId, price: Money) -> Result<()> {
        let result = sqlx::query("UPDATE products SET price_cents = $2 WHERE id = $1")
            .bind(product_id.as_uuid())
            .bind(price.cents())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product_id));
        }
        Ok(())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<u32> {
        if let Some(new_stock) = try_adjust_stock(&self.pool, product_id, delta).await? {
            return Ok(new_stock);
        }

        // No row matched: either the product is missing or stock is short.
        let available: Option<i32> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match available {
            None => Err(StoreError::ProductNotFound(product_id)),
            Some(available) => Err(StoreError::InsufficientStock {
                product_id,
                requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
                available: available as u32,
            }),
        }
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn add_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<CartItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (customer_id, product_id, quantity, unit_price_cents, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING customer_id, product_id, quantity, unit_price_cents, added_at
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .bind(unit_price.cents())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_cart_item(row)
    }

    async fn set_cart_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem> {
        let row = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE customer_id = $1 AND product_id = $2
            RETURNING customer_id, product_id, quantity, unit_price_cents, added_at
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_cart_item(row),
            None => Err(StoreError::CartItemNotFound {
                customer_id,
                product_id,
            }),
        }
    }

    async fn remove_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = $2")
                .bind(customer_id.as_uuid())
                .bind(product_id.as_uuid())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cart_lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT c.product_id, p.title, p.image_url, c.quantity, c.unit_price_cents,
                   p.price_cents AS current_price_cents, p.stock_quantity
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.customer_id = $1
            ORDER BY c.added_at ASC
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CartLine {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    title: row.try_get("title")?,
                    image_url: row.try_get("image_url")?,
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                    current_price: Money::from_cents(row.try_get("current_price_cents")?),
                    stock_quantity: row.try_get::<i32, _>("stock_quantity")? as u32,
                })
            })
            .collect()
    }

    async fn clear_cart(&self, customer_id: CustomerId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
            .bind(customer_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Order> {
        let id = OrderId::new();
        let created_at = Utc::now();
        let status = OrderStatus::Pending;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_cents, shipping_address, payment_method, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.total.cents())
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(status.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            // Consume stock inside the same transaction; a short or missing
            // product aborts and rolls back the header and earlier lines.
            let adjusted =
                try_adjust_stock(&mut *tx, item.product_id, -i64::from(item.quantity)).await?;
            if adjusted.is_none() {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                        .bind(item.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                return match available {
                    None => Err(StoreError::ProductNotFound(item.product_id)),
                    Some(available) => Err(StoreError::InsufficientStock {
                        product_id: item.product_id,
                        requested: item.quantity,
                        available: available as u32,
                    }),
                };
            }

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id,
            customer_id: order.customer_id,
            total: order.total,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            status,
            created_at,
        })
    }

    async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, shipping_address, payment_method, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, shipping_address, payment_method, status, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, shipping_address, payment_method, status, created_at
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, customer_id, total_cents, shipping_address, payment_method, status, created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::OrderNotFound(order_id)),
        }
    }
}
