use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stock check inside the checkout transaction failed.
    #[error(
        "insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// A product referenced by the checkout transaction no longer exists.
    /// This signals data inconsistency between the stock check and the
    /// decrement, not a user-correctable condition.
    #[error("product {0} disappeared during checkout")]
    ProductVanished(ProductId),

    /// The email address is already registered.
    #[error("email address already registered: {0}")]
    DuplicateEmail(String),

    /// The SKU is already used by another product.
    #[error("SKU already in use: {0}")]
    DuplicateSku(String),

    /// The category name or slug is already taken.
    #[error("category name or slug already in use: {0}")]
    DuplicateCategory(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
