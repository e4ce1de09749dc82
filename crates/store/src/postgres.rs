//! PostgreSQL-backed store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::record::{
    Address, CartItemRecord, CartRecord, CategoryRecord, NewCategory, NewOrder, NewProduct,
    NewUser, OrderItemRecord, OrderRecord, OrderStatus, ProductChanges, ProductPage, ProductQuery,
    ProductRecord, ProductSort, UserRecord,
};
use crate::store::{CartStore, CatalogStore, OrderStore, UserStore};

/// PostgreSQL store over a shared connection pool.
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

    fn row_to_user(row: PgRow) -> Result<UserRecord> {
        Ok(UserRecord {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<CategoryRecord> {
        Ok(CategoryRecord {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            sku: row.try_get("sku")?,
            stock_quantity: row.try_get("stock_quantity")?,
            image_url: row.try_get("image_url")?,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItemRecord> {
        Ok(CartItemRecord {
            id: CartItemId::new(row.try_get("id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            product_id: row
                .try_get::<Option<Uuid>, _>("product_id")?
                .map(ProductId::from_uuid),
            quantity: row.try_get("quantity")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItemRecord>) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Serialization(serde::de::Error::custom(e)))?;
        let shipping: serde_json::Value = row.try_get("shipping_address")?;
        let billing: serde_json::Value = row.try_get("billing_address")?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            total: Money::from_cents(row.try_get("total_cents")?),
            status,
            shipping_address: serde_json::from_value::<Address>(shipping)?,
            billing_address: serde_json::from_value::<Address>(billing)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: row
                .try_get::<Option<Uuid>, _>("product_id")?
                .map(ProductId::from_uuid),
            product_name: row.try_get("product_name")?,
            product_sku: row.try_get("product_sku")?,
            quantity: row.try_get("quantity")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }

    async fn cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, unit_price_cents, added_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY added_at ASC, id ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, product_sku, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_name ASC, id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let id = UserId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("users_email_key")
            {
                return StoreError::DuplicateEmail(user.email.clone());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord> {
        let id = CategoryId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && matches!(
                    db_err.constraint(),
                    Some("categories_name_key") | Some("categories_slug_key")
                )
            {
                return StoreError::DuplicateCategory(category.slug.clone());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_category(row)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, description, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn find_category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let id = ProductId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price_cents, sku, stock_quantity, image_url, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, price_cents, sku, stock_quantity, image_url,
                      category_id, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.sku)
        .bind(product.stock_quantity)
        .bind(&product.image_url)
        .bind(product.category_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("products_sku_key")
            {
                return StoreError::DuplicateSku(product.sku.clone());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_product(row)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>> {
        let sku_for_error = changes.sku.clone();
        let row = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                sku = COALESCE($5, sku),
                stock_quantity = COALESCE($6, stock_quantity),
                image_url = COALESCE($7, image_url),
                category_id = COALESCE($8, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, price_cents, sku, stock_quantity, image_url,
                      category_id, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price.map(|p| p.cents()))
        .bind(changes.sku)
        .bind(changes.stock_quantity)
        .bind(changes.image_url)
        .bind(changes.category_id.map(|c| c.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("products_sku_key")
            {
                return StoreError::DuplicateSku(sku_for_error.unwrap_or_default());
            }
            StoreError::Database(e)
        })?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, sku, stock_quantity, image_url,
                   category_id, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, sku, stock_quantity, image_url,
                   category_id, created_at, updated_at
            FROM products
            WHERE sku = $1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        let page = query.normalized_page();
        let per_page = query.normalized_per_page();

        // Build the shared WHERE clause dynamically, binding in order.
        let mut filters = String::new();
        let mut param_count = 0;

        if query.category_slug.is_some() {
            param_count += 1;
            filters.push_str(&format!(
                " AND category_id IN (SELECT id FROM categories WHERE slug = ${param_count})"
            ));
        }
        if query.search.is_some() {
            param_count += 1;
            filters.push_str(&format!(
                " AND (name ILIKE ${param_count} OR description ILIKE ${param_count})"
            ));
        }

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE 1=1{filters}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref slug) = query.category_slug {
            count_query = count_query.bind(slug);
        }
        if let Some(ref term) = query.search {
            count_query = count_query.bind(format!("%{term}%"));
        }
        let total = count_query.fetch_one(&self.pool).await? as u64;

        let order_by = match query.sort {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceAsc => "price_cents ASC",
            ProductSort::PriceDesc => "price_cents DESC",
        };

        let items_sql = format!(
            "SELECT id, name, description, price_cents, sku, stock_quantity, image_url, \
             category_id, created_at, updated_at \
             FROM products WHERE 1=1{filters} ORDER BY {order_by} \
             LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );

        let mut items_query = sqlx::query(&items_sql);
        if let Some(ref slug) = query.category_slug {
            items_query = items_query.bind(slug);
        }
        if let Some(ref term) = query.search {
            items_query = items_query.bind(format!("%{term}%"));
        }
        let rows = items_query
            .bind(per_page as i64)
            .bind(((page - 1) * per_page) as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductPage {
            items,
            total,
            page,
            total_pages: total.div_ceil(per_page as u64) as u32,
        })
    }

    async fn random_products(&self, limit: u32) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, sku, stock_quantity, image_url,
                   category_id, created_at, updated_at
            FROM products
            ORDER BY RANDOM()
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cart_id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);
        Ok(Some(CartRecord {
            id: cart_id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items: self.cart_items(cart_id).await?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn create_cart(&self, user_id: UserId) -> Result<CartRecord> {
        // The unique constraint on user_id makes concurrent creation a
        // no-op for the loser; both callers observe the same cart.
        sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
            .bind(CartId::new().as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        self.find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<CartItemId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity)
        .bind(unit_price.cents())
        .fetch_one(&self.pool)
        .await?;

        Ok(CartItemId::new(id))
    }

    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $2, unit_price_cents = $3 WHERE id = $1",
        )
        .bind(item_id.as_i64())
        .bind(quantity)
        .bind(unit_price.cents())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_cart_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id.as_i64())
            .bind(cart_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, order: NewOrder) -> Result<OrderRecord> {
        let mut tx = self.pool.begin().await?;

        let order_id = OrderId::new();
        let mut total = Money::zero();
        let mut items: Vec<OrderItemRecord> = Vec::with_capacity(order.lines.len());

        // Re-check stock and snapshot name/SKU inside the transaction so
        // a concurrent checkout cannot oversell. Returning early drops
        // the transaction and rolls everything back.
        for line in &order.lines {
            let row = sqlx::query("SELECT name, sku, stock_quantity FROM products WHERE id = $1")
                .bind(line.product_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

            let Some(row) = row else {
                return Err(StoreError::ProductVanished(line.product_id));
            };

            let stock: i32 = row.try_get("stock_quantity")?;
            if stock < line.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    available: stock,
                    requested: line.quantity,
                });
            }

            total += line.unit_price.multiply(line.quantity as u32);
            items.push(OrderItemRecord {
                id: OrderItemId::new(),
                order_id,
                product_id: Some(line.product_id),
                product_name: Some(row.try_get("name")?),
                product_sku: Some(row.try_get("sku")?),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        let shipping = serde_json::to_value(&order.shipping_address)?;
        let billing = serde_json::to_value(&order.billing_address)?;

        let order_row = sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_cents, status, shipping_address, billing_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(total.cents())
        .bind(OrderStatus::Pending.as_str())
        .bind(&shipping)
        .bind(&billing)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (id, order_id, product_id, product_name, product_sku, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order_id.as_uuid())
            .bind(item.product_id.map(|p| p.as_uuid()))
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.quantity)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        // One conditional decrement per line instead of read-modify-write;
        // zero rows affected means the product vanished (or was drained)
        // between the check above and here.
        for item in &items {
            if let Some(product_id) = item.product_id {
                let result = sqlx::query(
                    r#"
                    UPDATE products
                    SET stock_quantity = stock_quantity - $2, updated_at = NOW()
                    WHERE id = $1 AND stock_quantity >= $2
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::ProductVanished(product_id));
                }
            }
        }

        tx.commit().await?;

        Ok(OrderRecord {
            id: order_id,
            user_id: order.user_id,
            items,
            total,
            status: OrderStatus::Pending,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            created_at: order_row.try_get("created_at")?,
            updated_at: order_row.try_get("updated_at")?,
        })
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_order_by_id(
        &self,
        id: OrderId,
        user_id: Option<UserId>,
    ) -> Result<Option<OrderRecord>> {
        let mut sql = String::from(
            "SELECT id, user_id, total_cents, status, shipping_address, billing_address, \
             created_at, updated_at FROM orders WHERE id = $1",
        );
        if user_id.is_some() {
            sql.push_str(" AND user_id = $2");
        }

        let mut query = sqlx::query(&sql).bind(id.as_uuid());
        if let Some(user_id) = user_id {
            query = query.bind(user_id.as_uuid());
        }

        let Some(row) = query.fetch_optional(&self.pool).await? else {
            return Ok(None);
        };

        let items = self.order_items(id).await?;
        Self::row_to_order(row, items).map(Some)
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let order_rows = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, shipping_address, billing_address,
                   created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.product_name, oi.product_sku,
                   oi.quantity, oi.unit_price_cents
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItemRecord>> = HashMap::new();
        for row in item_rows {
            let item = Self::row_to_order_item(row)?;
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        order_rows
            .into_iter()
            .map(|row| {
                let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
                let items = items_by_order.remove(&id).unwrap_or_default();
                Self::row_to_order(row, items)
            })
            .collect()
    }
}
