//! The cart-to-order workflow.

use common::UserId;
use store::{Address, CartStore, NewOrder, NewOrderLine, OrderRecord, OrderStore};

use crate::error::{CheckoutError, Result};
use crate::services::payment::PaymentProcessor;

/// Converts a user's cart into an order.
///
/// The atomic part (stock re-check, order insert, conditional stock
/// decrement) is a single store transaction; everything after the
/// commit is best-effort and can only be logged, never undone.
pub struct CheckoutWorkflow<S, P> {
    store: S,
    payment: P,
}

impl<S, P> CheckoutWorkflow<S, P>
where
    S: CartStore + OrderStore,
    P: PaymentProcessor,
{
    /// Creates a new checkout workflow.
    pub fn new(store: S, payment: P) -> Self {
        Self { store, payment }
    }

    /// Places an order from the user's cart.
    ///
    /// Fails with [`CheckoutError::EmptyCart`] when there is nothing to
    /// buy, and all-or-nothing on any stock shortfall: no order row, no
    /// line items and no stock decrement survive a failure. The billing
    /// address defaults to the shipping address.
    #[tracing::instrument(skip(self, shipping_address, billing_address))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping_address: Address,
        billing_address: Option<Address>,
    ) -> Result<OrderRecord> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await
            .map_err(CheckoutError::from)?;
        let Some(cart) = cart else {
            return Err(self.rejected(CheckoutError::EmptyCart));
        };
        if cart.items.is_empty() {
            return Err(self.rejected(CheckoutError::EmptyCart));
        }

        // Build order lines from the cart's snapshots. The snapshot
        // price is the price paid; only stock and the name/SKU snapshot
        // are re-read inside the transaction.
        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let Some(product_id) = item.product_id else {
                return Err(self.rejected(CheckoutError::ProductUnavailable(item.id)));
            };
            lines.push(NewOrderLine {
                product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        let billing_address = billing_address.unwrap_or_else(|| shipping_address.clone());
        let order = self
            .store
            .place_order(NewOrder {
                user_id,
                lines,
                shipping_address,
                billing_address,
            })
            .await
            .map_err(|e| self.rejected(CheckoutError::from(e)))?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order placed");

        // Post-commit, best-effort: the order exists no matter what
        // happens from here on.
        if let Err(e) = self.store.clear_cart(cart.id).await {
            tracing::error!(cart_id = %cart.id, error = %e, "failed to clear cart after checkout");
        }

        if let Err(e) = self.payment.process_payment(order.id, order.total).await {
            tracing::error!(
                order_id = %order.id,
                error = %e,
                "payment simulation failed; order remains PENDING"
            );
        }

        // Reload so the response reflects whatever the payment step
        // recorded.
        let order = self
            .store
            .find_order_by_id(order.id, Some(user_id))
            .await
            .map_err(CheckoutError::from)?
            .ok_or_else(|| {
                CheckoutError::Inconsistency(format!("order {} missing after commit", order.id))
            })?;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(order)
    }

    fn rejected(&self, e: CheckoutError) -> CheckoutError {
        metrics::counter!("checkout_rejected_total").increment(1);
        e
    }
}
