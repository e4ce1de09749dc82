//! In-memory store implementation for testing.
//!
//! Mirrors the semantics of the PostgreSQL store, including the
//! all-or-nothing behavior of [`OrderStore::place_order`]: every line is
//! validated before any state is touched, under a single write lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::record::{
    CartItemRecord, CartRecord, CategoryRecord, NewCategory, NewOrder, NewProduct, NewUser,
    OrderItemRecord, OrderRecord, OrderStatus, ProductChanges, ProductPage, ProductQuery,
    ProductRecord, ProductSort, UserRecord,
};
use crate::store::{CartStore, CatalogStore, OrderStore, UserStore};

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    categories: Vec<CategoryRecord>,
    products: Vec<ProductRecord>,
    carts: Vec<CartRecord>,
    orders: Vec<OrderRecord>,
    next_cart_item_id: i64,
}

/// In-memory store for tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: removes a product, nulling cart and order line
    /// references the way the set-null foreign keys would.
    pub async fn remove_product(&self, id: ProductId) {
        let mut inner = self.inner.write().await;
        inner.products.retain(|p| p.id != id);
        for cart in &mut inner.carts {
            for item in &mut cart.items {
                if item.product_id == Some(id) {
                    item.product_id = None;
                }
            }
        }
        for order in &mut inner.orders {
            for item in &mut order.items {
                if item.product_id == Some(id) {
                    item.product_id = None;
                }
            }
        }
    }

    /// Test helper: current stock for a product.
    pub async fn stock_of(&self, id: ProductId) -> Option<i32> {
        let inner = self.inner.read().await;
        inner
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.stock_quantity)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord> {
        let mut inner = self.inner.write().await;
        if inner
            .categories
            .iter()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(StoreError::DuplicateCategory(category.slug));
        }

        let now = Utc::now();
        let record = CategoryRecord {
            id: CategoryId::new(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            created_at: now,
            updated_at: now,
        };
        inner.categories.push(record.clone());
        Ok(record)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let inner = self.inner.read().await;
        let mut categories = inner.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let mut inner = self.inner.write().await;
        if inner.products.iter().any(|p| p.sku == product.sku) {
            return Err(StoreError::DuplicateSku(product.sku));
        }

        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            sku: product.sku,
            stock_quantity: product.stock_quantity,
            image_url: product.image_url,
            category_id: product.category_id,
            created_at: now,
            updated_at: now,
        };
        inner.products.push(record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>> {
        let mut inner = self.inner.write().await;

        if let Some(ref sku) = changes.sku
            && inner.products.iter().any(|p| p.sku == *sku && p.id != id)
        {
            return Err(StoreError::DuplicateSku(sku.clone()));
        }

        let Some(product) = inner.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = Some(description);
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(sku) = changes.sku {
            product.sku = sku;
        }
        if let Some(stock_quantity) = changes.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(image_url) = changes.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = category_id;
        }
        product.updated_at = Utc::now();

        Ok(Some(product.clone()))
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        let inner = self.inner.read().await;
        let page = query.normalized_page();
        let per_page = query.normalized_per_page();

        let category_id = match &query.category_slug {
            Some(slug) => {
                let id = inner
                    .categories
                    .iter()
                    .find(|c| &c.slug == slug)
                    .map(|c| c.id);
                // An unknown slug matches nothing, like the SQL subquery.
                if id.is_none() {
                    return Ok(ProductPage {
                        items: vec![],
                        total: 0,
                        page,
                        total_pages: 0,
                    });
                }
                id
            }
            None => None,
        };

        let term = query.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<ProductRecord> = inner
            .products
            .iter()
            .filter(|p| category_id.is_none_or(|c| p.category_id == c))
            .filter(|p| {
                term.as_deref().is_none_or(|t| {
                    p.name.to_lowercase().contains(t)
                        || p.description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(t))
                })
            })
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok(ProductPage {
            items,
            total,
            page,
            total_pages: total.div_ceil(per_page as u64) as u32,
        })
    }

    async fn random_products(&self, limit: u32) -> Result<Vec<ProductRecord>> {
        // Deterministic stand-in for ORDER BY RANDOM().
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn create_cart(&self, user_id: UserId) -> Result<CartRecord> {
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner.carts.iter().find(|c| c.user_id == user_id) {
            return Ok(cart.clone());
        }

        let now = Utc::now();
        let cart = CartRecord {
            id: CartId::new(),
            user_id,
            items: vec![],
            created_at: now,
            updated_at: now,
        };
        inner.carts.push(cart.clone());
        Ok(cart)
    }

    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<CartItemId> {
        let mut inner = self.inner.write().await;
        inner.next_cart_item_id += 1;
        let id = CartItemId::new(inner.next_cart_item_id);

        let cart = inner
            .carts
            .iter_mut()
            .find(|c| c.id == cart_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        cart.items.push(CartItemRecord {
            id,
            cart_id,
            product_id: Some(product_id),
            quantity,
            unit_price,
            added_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        for cart in &mut inner.carts {
            if let Some(item) = cart.items.iter_mut().find(|i| i.id == item_id) {
                item.quantity = quantity;
                item.unit_price = unit_price;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_cart_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.iter_mut().find(|c| c.id == cart_id) else {
            return Ok(false);
        };
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        Ok(cart.items.len() < before)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.iter_mut().find(|c| c.id == cart_id) else {
            return Ok(0);
        };
        let removed = cart.items.len() as u64;
        cart.items.clear();
        Ok(removed)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, order: NewOrder) -> Result<OrderRecord> {
        let mut inner = self.inner.write().await;

        let order_id = OrderId::new();
        let mut total = Money::zero();
        let mut items: Vec<OrderItemRecord> = Vec::with_capacity(order.lines.len());

        // Validate every line before touching any state so a failure
        // leaves stock and orders exactly as they were.
        for line in &order.lines {
            let product = inner
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(StoreError::ProductVanished(line.product_id))?;

            if product.stock_quantity < line.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    available: product.stock_quantity,
                    requested: line.quantity,
                });
            }

            total += line.unit_price.multiply(line.quantity as u32);
            items.push(OrderItemRecord {
                id: OrderItemId::new(),
                order_id,
                product_id: Some(line.product_id),
                product_name: Some(product.name.clone()),
                product_sku: Some(product.sku.clone()),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        for line in &order.lines {
            let product = inner
                .products
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .expect("validated above");
            product.stock_quantity -= line.quantity;
        }

        let now = Utc::now();
        let record = OrderRecord {
            id: order_id,
            user_id: order.user_id,
            items,
            total,
            status: OrderStatus::Pending,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(record.clone());
        Ok(record)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn find_order_by_id(
        &self,
        id: OrderId,
        user_id: Option<UserId>,
    ) -> Result<Option<OrderRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.id == id && user_id.is_none_or(|u| o.user_id == u))
            .cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<OrderRecord> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
