//! Shipping quote trait and the mock carrier table.

use async_trait::async_trait;
use common::Money;
use serde::Serialize;

use crate::error::{CheckoutError, Result};

/// One shipping option for a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub service: String,
    pub price: Money,
    pub estimated_days: u32,
}

/// Trait for shipping rate lookups.
#[async_trait]
pub trait ShippingEstimator: Send + Sync {
    /// Returns the available options for a destination postal code.
    async fn quote(&self, postal_code: &str) -> Result<Vec<ShippingQuote>>;
}

/// Mock estimator with a fixed carrier table and a small simulated
/// network delay.
#[derive(Debug, Clone, Default)]
pub struct SimulatedShippingEstimator;

impl SimulatedShippingEstimator {
    /// Creates a new mock estimator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShippingEstimator for SimulatedShippingEstimator {
    #[tracing::instrument(skip(self))]
    async fn quote(&self, postal_code: &str) -> Result<Vec<ShippingQuote>> {
        let digits: String = postal_code.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 8 {
            return Err(CheckoutError::InvalidPostalCode(postal_code.to_string()));
        }

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let options = vec![
            ShippingQuote {
                service: "standard".to_string(),
                price: Money::from_cents(2550),
                estimated_days: 10,
            },
            ShippingQuote {
                service: "express".to_string(),
                price: Money::from_cents(4580),
                estimated_days: 3,
            },
        ];

        tracing::debug!(options = options.len(), "returning mock shipping quotes");
        Ok(options)
    }
}
