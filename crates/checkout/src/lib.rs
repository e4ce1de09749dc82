//! Cart-to-order conversion and its downstream stubs.
//!
//! The workflow validates the cart, hands the atomic part (stock
//! re-check, order insert, conditional stock decrement) to the store's
//! single-transaction operation, then runs the best-effort post-commit
//! steps: clearing the cart and simulating payment.

pub mod error;
pub mod services;
pub mod workflow;

pub use error::{CheckoutError, Result};
pub use services::payment::{PaymentProcessor, SimulatedPaymentProcessor};
pub use services::shipping::{ShippingEstimator, ShippingQuote, SimulatedShippingEstimator};
pub use workflow::CheckoutWorkflow;
