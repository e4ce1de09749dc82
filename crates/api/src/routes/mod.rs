//! Route handlers grouped by resource.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod shipping;
