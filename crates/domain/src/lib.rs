//! Domain layer for the commerce backend.
//!
//! Services here hold the business rules (stock validation, price
//! snapshots, credential checks) and stay generic over the backing
//! store so tests can run against the in-memory implementation.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod orders;

pub use cart::{CartService, cart_total};
pub use catalog::CatalogService;
pub use common::{CartId, CartItemId, CategoryId, Money, OrderId, ProductId, UserId};
pub use error::DomainError;
pub use identity::{AuthPayload, AuthService, Claims, TokenConfig, UserProfile};
pub use orders::OrderService;
