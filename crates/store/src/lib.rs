//! Relational persistence layer for the commerce backend.
//!
//! Exposes repository traits over users, the product catalog, carts and
//! orders, with a PostgreSQL implementation ([`PostgresStore`]) and an
//! in-memory implementation ([`InMemoryStore`]) for tests. The atomic
//! checkout transaction lives here as a single store operation so the
//! database's own isolation is the only concurrency guard.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{
    Address, CartItemRecord, CartRecord, CategoryRecord, NewCategory, NewOrder, NewOrderLine,
    NewProduct, NewUser, OrderItemRecord, OrderRecord, OrderStatus, ProductChanges, ProductPage,
    ProductQuery, ProductRecord, ProductSort, UserRecord,
};
pub use store::{CartStore, CatalogStore, CommerceStore, OrderStore, UserStore};
