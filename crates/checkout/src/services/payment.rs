//! Payment processing trait and the random simulator.

use async_trait::async_trait;
use common::{Money, OrderId};
use domain::OrderService;
use store::{OrderStatus, OrderStore};

use crate::error::Result;

/// Probability that the simulator resolves a payment as successful.
const DEFAULT_SUCCESS_RATE: f64 = 0.9;

/// Trait for payment processing after an order has been placed.
///
/// Implementations run post-commit: the order already exists and the
/// user's response has been determined, so failures here must never
/// undo the order.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Processes payment for an order and records the outcome on it.
    async fn process_payment(&self, order_id: OrderId, amount: Money) -> Result<()>;
}

/// Not a real gateway: resolves success or failure with an unweighted
/// random draw and writes PAID or FAILED through the order service.
pub struct SimulatedPaymentProcessor<S> {
    orders: OrderService<S>,
    success_rate: f64,
}

impl<S: OrderStore> SimulatedPaymentProcessor<S> {
    /// Creates a simulator with the default ~90% success rate.
    pub fn new(store: S) -> Self {
        Self::with_success_rate(store, DEFAULT_SUCCESS_RATE)
    }

    /// Creates a simulator with a pinned success rate. Tests use 1.0 or
    /// 0.0 to make the draw deterministic.
    pub fn with_success_rate(store: S, success_rate: f64) -> Self {
        Self {
            orders: OrderService::new(store),
            success_rate,
        }
    }
}

#[async_trait]
impl<S: OrderStore> PaymentProcessor for SimulatedPaymentProcessor<S> {
    #[tracing::instrument(skip(self))]
    async fn process_payment(&self, order_id: OrderId, amount: Money) -> Result<()> {
        tracing::info!(order_id = %order_id, %amount, "simulating payment");

        let succeeded = rand::random::<f64>() < self.success_rate;
        let status = if succeeded {
            OrderStatus::Paid
        } else {
            OrderStatus::Failed
        };

        // The response to the buyer was determined when the order was
        // committed; a failure recording the outcome is logged, never
        // propagated.
        match self.orders.update_status(order_id, status).await {
            Ok(_) => {
                metrics::counter!("payments_simulated_total", "outcome" => status.as_str())
                    .increment(1);
                tracing::info!(order_id = %order_id, %status, "payment simulation recorded");
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "failed to record payment outcome");
            }
        }

        Ok(())
    }
}
