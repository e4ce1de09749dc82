//! Row records and write inputs for the commerce tables.

use chrono::{DateTime, Utc};
use common::{CartId, CartItemId, CategoryId, Money, OrderId, OrderItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// The password hash is deliberately excluded from serialization so a
/// record can never leak it through a response body.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The hash is produced by the identity
/// service before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// Partial update for a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Filter, sort and pagination parameters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: u32,
    pub per_page: u32,
}

impl ProductQuery {
    /// Page numbers are 1-based; zero is treated as the first page.
    pub fn normalized_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size clamped to a sane range.
    pub fn normalized_per_page(&self) -> u32 {
        self.per_page.clamp(1, 100)
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductRecord>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// A user's cart with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct CartRecord {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItemRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line item.
///
/// `product_id` survives product deletion as `None` (set-null foreign
/// key). `unit_price` is the snapshot taken when the line was last
/// added or updated, not the live catalog price.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    pub unit_price: Money,
    pub added_at: DateTime<Utc>,
}

/// Status of a placed order.
///
/// PENDING is the only status set at creation. PAID and FAILED are set
/// by payment processing; SHIPPED, DELIVERED and CANCELED are manual
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Paid,
    Failed,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "PAID" => Ok(OrderStatus::Paid),
            "FAILED" => Ok(OrderStatus::Failed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELED" => Ok(OrderStatus::Canceled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A structured postal address, persisted as JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemRecord>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on a placed order.
///
/// Product name and SKU are denormalized at purchase time so later
/// catalog edits or deletions leave historical orders untouched.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemRecord {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Money,
}

/// One line of an order about to be placed: the cart's snapshot price,
/// not the live catalog price.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// Input for the atomic order-placement transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub lines: Vec<NewOrderLine>,
    pub shipping_address: Address,
    pub billing_address: Address,
}
