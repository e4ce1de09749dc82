//! Order queries and status transitions.
//!
//! Orders are created only by the checkout workflow; once created, the
//! status field is the single mutable thing about them.

use common::{OrderId, UserId};
use store::{OrderRecord, OrderStatus, OrderStore};

use crate::error::{DomainError, Result};

/// Service for reading orders and moving their status.
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Sets an order's status and returns the reloaded order.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderRecord> {
        let updated = self.store.update_order_status(id, status).await?;
        if !updated {
            return Err(DomainError::OrderNotFound(id));
        }
        tracing::info!(order_id = %id, %status, "order status updated");

        self.store
            .find_order_by_id(id, None)
            .await?
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Loads an order with its items. When `user_id` is given, an order
    /// belonging to someone else is indistinguishable from a missing
    /// one.
    #[tracing::instrument(skip(self))]
    pub async fn find_order(&self, id: OrderId, user_id: Option<UserId>) -> Result<OrderRecord> {
        self.store
            .find_order_by_id(id, user_id)
            .await?
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Returns the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        Ok(self.store.list_orders_for_user(user_id).await?)
    }
}
