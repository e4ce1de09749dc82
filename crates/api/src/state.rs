//! Shared application state wired at startup.
//!
//! Module-level dependency injection collapses into a plain set of
//! constructed services over a cloned store handle.

use std::sync::Arc;

use checkout::{CheckoutWorkflow, SimulatedPaymentProcessor, SimulatedShippingEstimator};
use domain::{AuthService, CartService, CatalogService, OrderService, TokenConfig};
use store::CommerceStore;

/// Services shared by all request handlers.
pub struct AppState<S> {
    pub auth: AuthService<S>,
    pub catalog: CatalogService<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub checkout: CheckoutWorkflow<S, SimulatedPaymentProcessor<S>>,
    pub shipping: SimulatedShippingEstimator,
}

/// Builds the application state with the default payment simulator.
pub fn create_state<S>(store: S, token_config: TokenConfig) -> Arc<AppState<S>>
where
    S: CommerceStore + Clone,
{
    let payment = SimulatedPaymentProcessor::new(store.clone());
    create_state_with_payment(store, token_config, payment)
}

/// Builds the application state with a payment simulator pinned to the
/// given success rate. Tests use 1.0 or 0.0 for deterministic outcomes.
pub fn create_state_with_success_rate<S>(
    store: S,
    token_config: TokenConfig,
    success_rate: f64,
) -> Arc<AppState<S>>
where
    S: CommerceStore + Clone,
{
    let payment = SimulatedPaymentProcessor::with_success_rate(store.clone(), success_rate);
    create_state_with_payment(store, token_config, payment)
}

fn create_state_with_payment<S>(
    store: S,
    token_config: TokenConfig,
    payment: SimulatedPaymentProcessor<S>,
) -> Arc<AppState<S>>
where
    S: CommerceStore + Clone,
{
    Arc::new(AppState {
        auth: AuthService::new(store.clone(), token_config),
        catalog: CatalogService::new(store.clone()),
        cart: CartService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        checkout: CheckoutWorkflow::new(store, payment),
        shipping: SimulatedShippingEstimator::new(),
    })
}
