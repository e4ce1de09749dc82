//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{Money, UserId};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    Address, CartStore, CatalogStore, NewCategory, NewOrder, NewOrderLine, NewProduct, NewUser,
    OrderStatus, OrderStore, PostgresStore, ProductQuery, ProductRecord, ProductSort,
    StoreError, UserRecord, UserStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_commerce_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE users, categories, products, carts, cart_items, orders, order_items CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_user(store: &PostgresStore, email: &str) -> UserRecord {
    store
        .insert_user(NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$2b$12$hash".to_string(),
        })
        .await
        .unwrap()
}

async fn seed_product(
    store: &PostgresStore,
    sku: &str,
    price_cents: i64,
    stock: i32,
) -> ProductRecord {
    let category = store
        .insert_category(NewCategory {
            name: format!("Category {sku}"),
            slug: format!("category-{}", sku.to_lowercase()),
            description: None,
        })
        .await
        .unwrap();

    store
        .insert_product(NewProduct {
            name: format!("Product {sku}"),
            description: Some("integration test product".to_string()),
            price: Money::from_cents(price_cents),
            sku: sku.to_string(),
            stock_quantity: stock,
            image_url: None,
            category_id: category.id,
        })
        .await
        .unwrap()
}

fn shipping_address() -> Address {
    Address {
        street: "Market St".to_string(),
        number: "1355".to_string(),
        complement: Some("Suite 900".to_string()),
        district: "SoMa".to_string(),
        city: "San Francisco".to_string(),
        state: "CA".to_string(),
        postal_code: "94103".to_string(),
    }
}

#[tokio::test]
#[serial]
async fn place_order_creates_order_and_decrements_stock() {
    let store = get_test_store().await;
    let user = seed_user(&store, "buyer@example.com").await;
    let product_a = seed_product(&store, "SKU-A", 1000, 10).await;
    let product_b = seed_product(&store, "SKU-B", 500, 5).await;

    let order = store
        .place_order(NewOrder {
            user_id: user.id,
            lines: vec![
                NewOrderLine {
                    product_id: product_a.id,
                    quantity: 2,
                    unit_price: Money::from_cents(1000),
                },
                NewOrderLine {
                    product_id: product_b.id,
                    quantity: 1,
                    unit_price: Money::from_cents(500),
                },
            ],
            shipping_address: shipping_address(),
            billing_address: shipping_address(),
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total.cents(), 2500);
    assert_eq!(order.items.len(), 2);

    let a = store.find_product_by_id(product_a.id).await.unwrap().unwrap();
    let b = store.find_product_by_id(product_b.id).await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 8);
    assert_eq!(b.stock_quantity, 4);

    // Reload round-trips items, addresses and status.
    let reloaded = store
        .find_order_by_id(order.id, Some(user.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.total.cents(), 2500);
    assert_eq!(reloaded.items.len(), 2);
    assert_eq!(reloaded.shipping_address, shipping_address());
    assert!(
        reloaded
            .items
            .iter()
            .any(|i| i.product_sku.as_deref() == Some("SKU-A"))
    );
}

#[tokio::test]
#[serial]
async fn place_order_rolls_back_entirely_on_stock_shortfall() {
    let store = get_test_store().await;
    let user = seed_user(&store, "buyer@example.com").await;
    let plenty = seed_product(&store, "SKU-A", 1000, 10).await;
    let scarce = seed_product(&store, "SKU-B", 500, 1).await;

    let err = store
        .place_order(NewOrder {
            user_id: user.id,
            lines: vec![
                NewOrderLine {
                    product_id: plenty.id,
                    quantity: 2,
                    unit_price: Money::from_cents(1000),
                },
                NewOrderLine {
                    product_id: scarce.id,
                    quantity: 3,
                    unit_price: Money::from_cents(500),
                },
            ],
            shipping_address: shipping_address(),
            billing_address: shipping_address(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InsufficientStock { .. }));

    // No order row, no line items, no stock change for any line.
    let orders = store.list_orders_for_user(user.id).await.unwrap();
    assert!(orders.is_empty());

    let order_item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(order_item_count, 0);

    let a = store.find_product_by_id(plenty.id).await.unwrap().unwrap();
    let b = store.find_product_by_id(scarce.id).await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 10);
    assert_eq!(b.stock_quantity, 1);
}

#[tokio::test]
#[serial]
async fn concurrent_checkouts_cannot_oversell_the_last_unit() {
    let store = get_test_store().await;
    let user_a = seed_user(&store, "a@example.com").await;
    let user_b = seed_user(&store, "b@example.com").await;
    let product = seed_product(&store, "SKU-LAST", 9900, 1).await;

    let order_for = move |user_id: UserId| NewOrder {
        user_id,
        lines: vec![NewOrderLine {
            product_id: product.id,
            quantity: 1,
            unit_price: Money::from_cents(9900),
        }],
        shipping_address: shipping_address(),
        billing_address: shipping_address(),
    };

    let store_a = store.clone();
    let store_b = store.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { store_a.place_order(order_for(user_a.id)).await }),
        tokio::spawn(async move { store_b.place_order(order_for(user_b.id)).await }),
    );

    let results = [first.unwrap(), second.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one checkout may win the last unit");

    let remaining = store
        .find_product_by_id(product.id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity;
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[serial]
async fn duplicate_email_and_sku_are_conflicts() {
    let store = get_test_store().await;
    seed_user(&store, "taken@example.com").await;

    let err = store
        .insert_user(NewUser {
            name: "Second".to_string(),
            email: "taken@example.com".to_string(),
            password_hash: "$2b$12$other".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail(_)));

    let product = seed_product(&store, "SKU-UNIQ", 1000, 1).await;
    let err = store
        .insert_product(NewProduct {
            name: "Clone".to_string(),
            description: None,
            price: Money::from_cents(2000),
            sku: "SKU-UNIQ".to_string(),
            stock_quantity: 3,
            image_url: None,
            category_id: product.category_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateSku(_)));
}

#[tokio::test]
#[serial]
async fn deleting_a_product_nulls_cart_line_references() {
    let store = get_test_store().await;
    let user = seed_user(&store, "cart@example.com").await;
    let product = seed_product(&store, "SKU-GONE", 1000, 5).await;

    let cart = store.create_cart(user.id).await.unwrap();
    store
        .insert_cart_item(cart.id, product.id, 2, Money::from_cents(1000))
        .await
        .unwrap();

    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product.id.as_uuid())
        .execute(store.pool())
        .await
        .unwrap();

    let cart = store.find_cart_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, None);
    assert_eq!(cart.items[0].unit_price.cents(), 1000);
}

#[tokio::test]
#[serial]
async fn order_status_update_reports_missing_orders() {
    let store = get_test_store().await;
    let user = seed_user(&store, "status@example.com").await;
    let product = seed_product(&store, "SKU-ST", 1000, 2).await;

    let order = store
        .place_order(NewOrder {
            user_id: user.id,
            lines: vec![NewOrderLine {
                product_id: product.id,
                quantity: 1,
                unit_price: Money::from_cents(1000),
            }],
            shipping_address: shipping_address(),
            billing_address: shipping_address(),
        })
        .await
        .unwrap();

    assert!(
        store
            .update_order_status(order.id, OrderStatus::Paid)
            .await
            .unwrap()
    );
    let reloaded = store.find_order_by_id(order.id, None).await.unwrap().unwrap();
    assert_eq!(reloaded.status, OrderStatus::Paid);

    assert!(
        !store
            .update_order_status(common::OrderId::new(), OrderStatus::Paid)
            .await
            .unwrap()
    );

    // Scoped to the wrong user the order is invisible.
    let other = seed_user(&store, "other@example.com").await;
    let hidden = store
        .find_order_by_id(order.id, Some(other.id))
        .await
        .unwrap();
    assert!(hidden.is_none());
}

#[tokio::test]
#[serial]
async fn list_products_filters_sorts_and_paginates() {
    let store = get_test_store().await;
    let category = store
        .insert_category(NewCategory {
            name: "Decks".to_string(),
            slug: "decks".to_string(),
            description: Some("Skateboard decks".to_string()),
        })
        .await
        .unwrap();

    for (sku, price) in [("DECK-1", 4000), ("DECK-2", 2000), ("DECK-3", 3000)] {
        store
            .insert_product(NewProduct {
                name: format!("Deck {sku}"),
                description: Some("7-ply maple".to_string()),
                price: Money::from_cents(price),
                sku: sku.to_string(),
                stock_quantity: 10,
                image_url: None,
                category_id: category.id,
            })
            .await
            .unwrap();
    }
    // A product outside the category must not match the slug filter.
    seed_product(&store, "WHEEL-1", 1500, 10).await;

    let page = store
        .list_products(ProductQuery {
            category_slug: Some("decks".to_string()),
            search: None,
            sort: ProductSort::PriceAsc,
            page: 1,
            per_page: 2,
        })
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].sku, "DECK-2");
    assert_eq!(page.items[1].sku, "DECK-3");

    let searched = store
        .list_products(ProductQuery {
            category_slug: None,
            search: Some("maple".to_string()),
            sort: ProductSort::Newest,
            page: 1,
            per_page: 10,
        })
        .await
        .unwrap();
    assert_eq!(searched.total, 3);
}
