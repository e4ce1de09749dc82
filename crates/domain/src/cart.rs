//! Cart service: line items, stock validation and price snapshots.
//!
//! Prices are snapshotted per line rather than read live from the
//! catalog, so a cart's displayed total stays stable between catalog
//! price changes and checkout. A line's snapshot is refreshed whenever
//! the line is touched, so long-lived carts don't keep wildly stale
//! prices.

use common::{CartItemId, Money, ProductId, UserId};
use store::{CartRecord, CartStore, CatalogStore};

use crate::error::{DomainError, Result};

/// Sum of snapshot price × quantity over the cart's lines.
///
/// An empty cart totals zero; a line with a non-positive quantity
/// contributes zero instead of failing.
pub fn cart_total(cart: &CartRecord) -> Money {
    cart.items
        .iter()
        .map(|item| item.unit_price.multiply(item.quantity.max(0) as u32))
        .sum()
}

/// Service for a user's mutable pre-checkout selection.
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore + CatalogStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the user's cart. Absence is an explicit `None`, not an
    /// error; the user may simply never have added anything.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        Ok(self.store.find_cart_by_user(user_id).await?)
    }

    /// Adds a quantity of a product to the user's cart, creating the
    /// cart on first use.
    ///
    /// If the product is already in the cart the line's quantity becomes
    /// the combined total and its price snapshot is refreshed to the
    /// product's current price. Fails when the combined quantity exceeds
    /// current stock.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartRecord> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }

        let product = self
            .store
            .find_product_by_id(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;

        let cart = match self.store.find_cart_by_user(user_id).await? {
            Some(cart) => cart,
            None => self.store.create_cart(user_id).await?,
        };

        let existing = cart
            .items
            .iter()
            .find(|item| item.product_id == Some(product_id));
        let desired = existing.map_or(0, |item| item.quantity) + quantity;

        if product.stock_quantity < desired {
            return Err(DomainError::InsufficientStock {
                product_name: product.name,
                available: product.stock_quantity,
                requested: desired,
            });
        }

        match existing {
            Some(item) => {
                self.store
                    .update_cart_item(item.id, desired, product.price)
                    .await?;
                tracing::debug!(item_id = %item.id, quantity = desired, "cart line updated");
            }
            None => {
                let item_id = self
                    .store
                    .insert_cart_item(cart.id, product_id, quantity, product.price)
                    .await?;
                tracing::debug!(item_id = %item_id, quantity, "cart line added");
            }
        }

        self.store
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| DomainError::Inconsistency("cart vanished after item write".into()))
    }

    /// Replaces a line's quantity, re-validating stock against the new
    /// quantity (not cumulatively) and refreshing the price snapshot.
    ///
    /// A non-positive quantity delegates to removal. A line whose
    /// product no longer exists is removed instead of erroring.
    #[tracing::instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        new_quantity: i32,
    ) -> Result<Option<CartRecord>> {
        if new_quantity <= 0 {
            return self.remove_item(user_id, item_id).await;
        }

        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(DomainError::CartNotFound(user_id))?;

        let item = cart
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or(DomainError::CartItemNotFound(item_id))?;

        let product = match item.product_id {
            Some(product_id) => self.store.find_product_by_id(product_id).await?,
            None => None,
        };

        match product {
            Some(product) => {
                if product.stock_quantity < new_quantity {
                    return Err(DomainError::InsufficientStock {
                        product_name: product.name,
                        available: product.stock_quantity,
                        requested: new_quantity,
                    });
                }
                self.store
                    .update_cart_item(item_id, new_quantity, product.price)
                    .await?;
            }
            None => {
                // Orphaned line: the product was deleted out from under
                // the cart. Drop it rather than erroring.
                tracing::warn!(item_id = %item_id, "removing orphaned cart line");
                self.store.delete_cart_item(cart.id, item_id).await?;
            }
        }

        self.get_cart(user_id).await
    }

    /// Removes a line from the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartRecord>> {
        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(DomainError::CartNotFound(user_id))?;

        let removed = self.store.delete_cart_item(cart.id, item_id).await?;
        if !removed {
            return Err(DomainError::CartItemNotFound(item_id));
        }

        self.get_cart(user_id).await
    }

    /// Deletes every line in the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or(DomainError::CartNotFound(user_id))?;

        let removed = self.store.clear_cart(cart.id).await?;
        tracing::debug!(cart_id = %cart.id, removed, "cart cleared");

        self.get_cart(user_id).await
    }
}
