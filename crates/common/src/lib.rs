//! Shared value types used across the commerce backend.

pub mod ids;
pub mod money;

pub use ids::{CartId, CartItemId, CategoryId, OrderId, OrderItemId, ProductId, UserId};
pub use money::Money;
