//! Repository traits implemented by the PostgreSQL and in-memory stores.

use async_trait::async_trait;
use common::{CartId, CartItemId, CategoryId, Money, OrderId, ProductId, UserId};

use crate::Result;
use crate::record::{
    CartRecord, CategoryRecord, NewCategory, NewOrder, NewProduct, NewUser, OrderRecord,
    OrderStatus, ProductChanges, ProductPage, ProductQuery, ProductRecord, UserRecord,
};

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with [`crate::StoreError::DuplicateEmail`]
    /// when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    /// Looks up a user by email, hash included.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Looks up a user by id.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;
}

/// Persistence operations for products and categories.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a new category. Fails with
    /// [`crate::StoreError::DuplicateCategory`] on a name or slug clash.
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord>;

    /// Returns all categories.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>>;

    /// Looks up a category by id.
    async fn find_category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>>;

    /// Inserts a new product. Fails with
    /// [`crate::StoreError::DuplicateSku`] when the SKU is taken.
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord>;

    /// Applies a partial update. Returns `None` when the product does
    /// not exist.
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>>;

    /// Looks up a product by id.
    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Looks up a product by SKU.
    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<ProductRecord>>;

    /// Lists products with filtering, sorting and pagination.
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage>;

    /// Returns up to `limit` randomly chosen products.
    async fn random_products(&self, limit: u32) -> Result<Vec<ProductRecord>>;
}

/// Persistence operations for carts and their line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the user's cart with its items, oldest line first.
    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<CartRecord>>;

    /// Creates the user's cart, or returns the existing one. At most
    /// one cart exists per user.
    async fn create_cart(&self, user_id: UserId) -> Result<CartRecord>;

    /// Inserts a new line item and returns its id.
    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<CartItemId>;

    /// Replaces a line's quantity and price snapshot. Returns false when
    /// the item does not exist.
    async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<bool>;

    /// Deletes a line item scoped to the given cart. Returns false when
    /// no row matched.
    async fn delete_cart_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool>;

    /// Deletes all line items of a cart, returning how many were removed.
    async fn clear_cart(&self, cart_id: CartId) -> Result<u64>;
}

/// Persistence operations for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Places an order atomically: per line, re-checks stock and
    /// snapshots the product's name/SKU; inserts the order and its
    /// items; applies one conditional stock decrement per line. Any
    /// failure rolls the whole transaction back; no partial order or
    /// stock change is ever persisted.
    async fn place_order(&self, order: NewOrder) -> Result<OrderRecord>;

    /// Updates an order's status. Returns false when the order does not
    /// exist.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Loads an order with its items. When `user_id` is given the order
    /// must belong to that user.
    async fn find_order_by_id(
        &self,
        id: OrderId,
        user_id: Option<UserId>,
    ) -> Result<Option<OrderRecord>>;

    /// Returns the user's orders with items, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;
}

/// Everything the application needs from a backing store.
pub trait CommerceStore: UserStore + CatalogStore + CartStore + OrderStore {}

impl<T: UserStore + CatalogStore + CartStore + OrderStore> CommerceStore for T {}
