//! Domain error types.

use common::{CartItemId, CategoryId, OrderId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The category does not exist.
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// The order does not exist, or does not belong to the caller.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The user has no cart.
    #[error("no cart found for user {0}")]
    CartNotFound(UserId),

    /// The cart item does not exist in the caller's cart.
    #[error("cart item {0} not found in this cart")]
    CartItemNotFound(CartItemId),

    /// Not enough stock to satisfy the requested quantity.
    #[error(
        "insufficient stock for '{product_name}': available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_name: String,
        available: i32,
        requested: i32,
    },

    /// Quantities must be strictly positive.
    #[error("quantity must be greater than zero, got {0}")]
    InvalidQuantity(i32),

    /// Prices must be strictly positive.
    #[error("price must be greater than zero")]
    InvalidPrice,

    /// The email address is already registered.
    #[error("email address already in use: {0}")]
    EmailInUse(String),

    /// The SKU is already used by another product.
    #[error("SKU '{0}' already in use")]
    SkuInUse(String),

    /// The category name or slug is already taken.
    #[error("category name or slug already in use: {0}")]
    CategoryInUse(String),

    /// Email/password validation failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The bearer token failed validation.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Committed state contradicts itself; logged in full, surfaced as
    /// a generic failure.
    #[error("data inconsistency: {0}")]
    Inconsistency(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// An error occurred in the store.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(email) => DomainError::EmailInUse(email),
            StoreError::DuplicateSku(sku) => DomainError::SkuInUse(sku),
            StoreError::DuplicateCategory(slug) => DomainError::CategoryInUse(slug),
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
