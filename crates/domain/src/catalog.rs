//! Catalog service: products and categories.

use common::{CategoryId, ProductId};
use store::{
    CatalogStore, CategoryRecord, NewCategory, NewProduct, ProductChanges, ProductPage,
    ProductQuery, ProductRecord,
};

use crate::error::{DomainError, Result};

/// Number of products returned by the featured listing by default.
const DEFAULT_FEATURED_LIMIT: u32 = 4;

/// Service for browsing and managing the product catalog.
pub struct CatalogService<S> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists products with filtering, sorting and pagination.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        Ok(self.store.list_products(query).await?)
    }

    /// Loads a single product.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRecord> {
        self.store
            .find_product_by_id(id)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Returns a random selection of products for the storefront.
    #[tracing::instrument(skip(self))]
    pub async fn featured_products(&self, limit: Option<u32>) -> Result<Vec<ProductRecord>> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
        Ok(self.store.random_products(limit).await?)
    }

    /// Returns all categories.
    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.store.list_categories().await?)
    }

    /// Creates a category.
    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, category: NewCategory) -> Result<CategoryRecord> {
        Ok(self.store.insert_category(category).await?)
    }

    /// Creates a product after validating its category, SKU and price.
    #[tracing::instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn create_product(&self, product: NewProduct) -> Result<ProductRecord> {
        if !product.price.is_positive() {
            return Err(DomainError::InvalidPrice);
        }
        if product.stock_quantity < 0 {
            return Err(DomainError::InvalidQuantity(product.stock_quantity));
        }

        self.store
            .find_category_by_id(product.category_id)
            .await?
            .ok_or(DomainError::CategoryNotFound(product.category_id))?;

        if let Some(existing) = self.store.find_product_by_sku(&product.sku).await? {
            tracing::warn!(sku = %product.sku, existing = %existing.id, "SKU already taken");
            return Err(DomainError::SkuInUse(product.sku));
        }

        // The unique constraint is the backstop against a concurrent
        // insert between the check above and here.
        let created = self.store.insert_product(product).await?;
        tracing::info!(product_id = %created.id, "product created");
        Ok(created)
    }

    /// Applies a partial update to a product.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<ProductRecord> {
        if let Some(price) = changes.price
            && !price.is_positive()
        {
            return Err(DomainError::InvalidPrice);
        }
        if let Some(stock) = changes.stock_quantity
            && stock < 0
        {
            return Err(DomainError::InvalidQuantity(stock));
        }

        if let Some(category_id) = changes.category_id {
            self.store
                .find_category_by_id(category_id)
                .await?
                .ok_or(DomainError::CategoryNotFound(category_id))?;
        }

        if let Some(ref sku) = changes.sku
            && let Some(existing) = self.store.find_product_by_sku(sku).await?
            && existing.id != id
        {
            return Err(DomainError::SkuInUse(sku.clone()));
        }

        self.store
            .update_product(id, changes)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Returns whether the product has at least `needed` units in stock.
    /// A missing product has no stock.
    pub async fn check_stock(&self, product_id: ProductId, needed: i32) -> Result<bool> {
        Ok(self
            .store
            .find_product_by_id(product_id)
            .await?
            .is_some_and(|p| p.stock_quantity >= needed))
    }
}
