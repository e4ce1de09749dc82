//! Integration tests for the API server over the in-memory store.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use domain::TokenConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Payment pinned to success so checkout outcomes are deterministic.
fn setup() -> Router {
    let store = InMemoryStore::new();
    let state = api::create_state_with_success_rate(
        store,
        TokenConfig::new("integration-test-secret", 3600),
        1.0,
    );
    api::create_app(state, get_metrics_handle())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Registers a user and returns a bearer token.
async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Test User", "email": email, "password": "hunter2!"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "hunter2!"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Creates a category and a product, returning the product id.
async fn seed_product(app: &Router, token: &str, sku: &str, price_cents: i64, stock: i32) -> String {
    let (status, category) = send(
        app,
        request(
            "POST",
            "/categories",
            Some(token),
            Some(json!({"name": format!("Category {sku}"), "slug": format!("cat-{}", sku.to_lowercase())})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, product) = send(
        app,
        request(
            "POST",
            "/products",
            Some(token),
            Some(json!({
                "name": format!("Product {sku}"),
                "description": "integration test product",
                "price_cents": price_cents,
                "sku": sku,
                "stock_quantity": stock,
                "category_id": category["id"],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    product["id"].as_str().unwrap().to_string()
}

fn shipping_address() -> Value {
    json!({
        "street": "Market St",
        "number": "1355",
        "district": "SoMa",
        "city": "San Francisco",
        "state": "CA",
        "postal_code": "94103",
    })
}

#[tokio::test]
async fn health_check() {
    let app = setup();
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = setup();
    let token = register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(&app, request("GET", "/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, _) = send(&app, request("GET", "/auth/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("GET", "/auth/me", Some("garbage"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = setup();
    register_and_login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Imposter", "email": "ada@example.com", "password": "other"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("ada@example.com"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = setup();
    register_and_login(&app, "ada@example.com").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cart_and_catalog_mutations_require_a_token() {
    let app = setup();

    let (status, _) = send(&app, request("GET", "/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request("POST", "/products", None, Some(json!({"name": "x"}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request("POST", "/orders", None, Some(json!({"shipping_address": shipping_address()}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_purchase_flow() {
    let app = setup();
    let token = register_and_login(&app, "buyer@example.com").await;

    let product_a = seed_product(&app, &token, "SKU-A", 1000, 10).await;
    let product_b = seed_product(&app, &token, "SKU-B", 500, 5).await;

    // Cart starts absent.
    let (status, body) = send(&app, request("GET", "/cart", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    // Add 2 × $10.00 and 1 × $5.00.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": product_a, "quantity": 2})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, cart) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": product_b, "quantity": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_cents"], 2500);
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);

    // Checkout. Payment is pinned to success, so the order comes back
    // PAID with the cart's total.
    let (status, order) = send(
        &app,
        request(
            "POST",
            "/orders",
            Some(&token),
            Some(json!({"shipping_address": shipping_address()})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total_cents"], 2500);
    assert_eq!(order["status"], "PAID");
    assert_eq!(order["billing_address"], shipping_address());

    // Stock decreased by the purchased quantities.
    let (_, product) = send(
        &app,
        request("GET", &format!("/products/{product_a}"), None, None),
    )
    .await;
    assert_eq!(product["stock_quantity"], 8);

    // The cart is empty afterward.
    let (_, cart) = send(&app, request("GET", "/cart", Some(&token), None)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["total_cents"], 0);

    // The order shows up in history and by id.
    let (status, orders) = send(&app, request("GET", "/orders", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let order_id = order["id"].as_str().unwrap();
    let (status, fetched) = send(
        &app,
        request("GET", &format!("/orders/{order_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["items"].as_array().unwrap().len(), 2);

    // Another user cannot see it.
    let other = register_and_login(&app, "other@example.com").await;
    let (status, _) = send(
        &app,
        request("GET", &format!("/orders/{order_id}"), Some(&other), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_with_empty_cart_is_a_bad_request() {
    let app = setup();
    let token = register_and_login(&app, "buyer@example.com").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/orders",
            Some(&token),
            Some(json!({"shipping_address": shipping_address()})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn adding_more_than_stock_is_a_bad_request() {
    let app = setup();
    let token = register_and_login(&app, "buyer@example.com").await;
    let product = seed_product(&app, &token, "SKU-A", 1000, 3).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": product, "quantity": 2})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 2 in cart + 2 requested > 3 in stock.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": product, "quantity": 2})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn unknown_product_in_cart_is_not_found() {
    let app = setup();
    let token = register_and_login(&app, "buyer@example.com").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": uuid::Uuid::new_v4(), "quantity": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_listing_filters_and_sorts() {
    let app = setup();
    let token = register_and_login(&app, "admin@example.com").await;
    seed_product(&app, &token, "SKU-A", 3000, 5).await;
    seed_product(&app, &token, "SKU-B", 1000, 5).await;
    seed_product(&app, &token, "SKU-C", 2000, 5).await;

    let (status, page) = send(
        &app,
        request("GET", "/products?sort=price_asc&per_page=2", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items[0]["price_cents"], 1000);
    assert_eq!(items[1]["price_cents"], 2000);

    let (status, page) = send(
        &app,
        request("GET", "/products?search=product+sku-b", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["sku"], "SKU-B");

    let (status, page) = send(
        &app,
        request("GET", "/products?category=cat-sku-a", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let app = setup();
    let token = register_and_login(&app, "admin@example.com").await;
    seed_product(&app, &token, "SKU-A", 1000, 5).await;

    let (_, categories) = send(&app, request("GET", "/categories", None, None)).await;
    let category_id = categories[0]["id"].clone();

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/products",
            Some(&token),
            Some(json!({
                "name": "Clone",
                "price_cents": 2000,
                "sku": "SKU-A",
                "stock_quantity": 1,
                "category_id": category_id,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn shipping_quotes_validate_the_postal_code() {
    let app = setup();

    let (status, quotes) = send(
        &app,
        request("GET", "/shipping/quotes?postal_code=01310-100", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let quotes = quotes.as_array().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0]["service"], "standard");
    assert_eq!(quotes[0]["price_cents"], 2550);
    assert_eq!(quotes[1]["estimated_days"], 3);

    let (status, _) = send(
        &app,
        request("GET", "/shipping/quotes?postal_code=123", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn updating_cart_item_to_zero_removes_it() {
    let app = setup();
    let token = register_and_login(&app, "buyer@example.com").await;
    let product = seed_product(&app, &token, "SKU-A", 1000, 5).await;

    let (_, cart) = send(
        &app,
        request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({"product_id": product, "quantity": 2})),
        ),
    )
    .await;
    let item_id = cart["items"][0]["id"].clone();

    let (status, cart) = send(
        &app,
        request(
            "PATCH",
            &format!("/cart/items/{item_id}"),
            Some(&token),
            Some(json!({"quantity": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
}
