//! Checkout error types.

use common::{CartItemId, ProductId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart, or the cart has no items.
    #[error("your shopping cart is empty")]
    EmptyCart,

    /// A line's quantity exceeds the product's current stock.
    #[error(
        "insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// A cart line references a product that was deleted; the user must
    /// remove the line before checking out.
    #[error("cart line {0} references a product that is no longer available")]
    ProductUnavailable(CartItemId),

    /// The postal code did not reduce to eight digits.
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(String),

    /// Committed state contradicts itself; logged in full, surfaced as
    /// a generic failure.
    #[error("data inconsistency: {0}")]
    Inconsistency(String),

    /// Domain error.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            StoreError::ProductVanished(id) => CheckoutError::Inconsistency(format!(
                "product {id} disappeared inside the checkout transaction"
            )),
            other => CheckoutError::Store(other),
        }
    }
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
