// tests/http_tests.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use clinic_shop::config::AppConfig;
use clinic_shop::state::AppState;
use clinic_shop::store::{MemoryStore, OrderLedger};
use clinic_shop::web::configure_app_routes;
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn app_state(store: &MemoryStore) -> AppState {
  let config = AppConfig::from_lookup(|name| (name == "DATABASE_URL").then(|| "postgres://unused".to_string())).unwrap();
  AppState {
    store: Arc::new(store.clone()),
    flows: Arc::new(registry()),
    config: Arc::new(config),
  }
}

macro_rules! shop_app {
  ($store:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new(app_state($store)))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
async fn checkout_returns_201_with_summary() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let kibble = store.add_product("Kibble", 1_000, 10).await;
  let collar = store.add_product("Collar", 500, 4).await;
  put_in_cart(&store, user, kibble, 2).await;
  put_in_cart(&store, user, collar, 1).await;
  let app = shop_app!(&store);

  let req = test::TestRequest::post()
    .uri("/shop/checkout")
    .insert_header(("X-User-ID", user.to_string()))
    .set_json(json!({ "shippingAddress": "1 Clinic Way", "paymentMethod": "card" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "success");
  assert_eq!(body["totalCents"], 3_274);
  assert_eq!(body["total"], 32.74);
  assert!(Uuid::parse_str(body["orderId"].as_str().unwrap()).is_ok());
  assert!(store.cart_items(user).await.is_empty());
}

#[actix_web::test]
async fn checkout_without_body_uses_empty_details() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let p = store.add_product("Toy", 250, 3).await;
  put_in_cart(&store, user, p, 1).await;
  let app = shop_app!(&store);

  let req = test::TestRequest::post()
    .uri("/shop/checkout")
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let orders = store.list_orders(user).await.unwrap();
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0].shipping_address, "");
  assert_eq!(orders[0].payment_method, "");
}

#[actix_web::test]
async fn malformed_checkout_body_is_400_and_writes_nothing() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let p = store.add_product("Toy", 250, 10).await;
  put_in_cart(&store, user, p, 1).await;
  let app = shop_app!(&store);

  for body in [
    r#"{"shippingAddress": 12345, "paymentMethod": "card""#,
    r#"{"shippingAddress": 12345, "paymentMethod": "card"}"#,
  ] {
    let req = test::TestRequest::post()
      .uri("/shop/checkout")
      .insert_header(("X-User-ID", user.to_string()))
      .insert_header(("Content-Type", "application/json"))
      .set_payload(body)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  assert!(store.list_orders(user).await.unwrap().is_empty());
  assert_eq!(store.stock_of(p).await, Some(10));
  assert_eq!(store.cart_items(user).await.len(), 1);
}

#[actix_web::test]
async fn empty_cart_checkout_is_400() {
  setup_tracing();
  let store = MemoryStore::new();
  let app = shop_app!(&store);

  let req = test::TestRequest::post()
    .uri("/shop/checkout")
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Cart is empty" }));
}

#[actix_web::test]
async fn short_stock_checkout_is_400_with_item_id() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let p = store.add_product("Carrier", 4_500, 3).await;
  put_in_cart(&store, user, p, 5).await;
  let app = shop_app!(&store);

  let req = test::TestRequest::post()
    .uri("/shop/checkout")
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Not enough stock available for some items");
  assert_eq!(body["itemId"], p.to_string());
}

#[actix_web::test]
async fn missing_user_is_401() {
  setup_tracing();
  let store = MemoryStore::new();
  let app = shop_app!(&store);

  for header in [None, Some("not-a-uuid")] {
    let mut req = test::TestRequest::post().uri("/shop/checkout");
    if let Some(value) = header {
      req = req.insert_header(("X-User-ID", value));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}

#[actix_web::test]
async fn cart_routes_add_update_view_and_remove() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let p = store.add_product("Leash", 1_500, 4).await;
  let app = shop_app!(&store);

  // Adding twice increments the same line.
  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/shop/cart")
      .insert_header(("X-User-ID", user.to_string()))
      .set_json(json!({ "productId": p, "quantity": 1 }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
  let items = store.cart_items(user).await;
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].quantity, 2);
  let item_id = items[0].id;

  // More than is in stock once the existing line is counted.
  let req = test::TestRequest::post()
    .uri("/shop/cart")
    .insert_header(("X-User-ID", user.to_string()))
    .set_json(json!({ "productId": p, "quantity": 3 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::put()
    .uri(&format!("/shop/cart/{item_id}"))
    .insert_header(("X-User-ID", user.to_string()))
    .set_json(json!({ "quantity": 3 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri("/shop/cart")
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["items"][0]["quantity"], 3);
  assert_eq!(body["totals"]["subtotalCents"], 4_500);
  assert_eq!(body["totals"]["totalCents"], 4_500 + 315 + 599);

  // Someone else's item is invisible.
  let req = test::TestRequest::delete()
    .uri(&format!("/shop/cart/{item_id}"))
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::delete()
    .uri(&format!("/shop/cart/{item_id}"))
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
  assert!(store.cart_items(user).await.is_empty());
}

#[actix_web::test]
async fn add_to_cart_unknown_product_is_404() {
  setup_tracing();
  let store = MemoryStore::new();
  let app = shop_app!(&store);

  let req = test::TestRequest::post()
    .uri("/shop/cart")
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .set_json(json!({ "productId": Uuid::new_v4(), "quantity": 1 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn products_and_orders_are_listed() {
  setup_tracing();
  let store = MemoryStore::new();
  let user = Uuid::new_v4();
  let p = store.add_product("Brush", 700, 5).await;
  put_in_cart(&store, user, p, 1).await;
  let app = shop_app!(&store);

  let req = test::TestRequest::get().uri("/shop/products").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["products"][0]["name"], "Brush");

  let req = test::TestRequest::get().uri(&format!("/shop/products/{p}")).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["product"]["priceCents"], 700);

  let req = test::TestRequest::post()
    .uri("/shop/checkout")
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let created: Value = test::call_and_read_body_json(&app, req).await;
  let order_id = created["orderId"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri("/shop/orders")
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["orders"].as_array().unwrap().len(), 1);
  assert_eq!(body["orders"][0]["status"], "pending");

  let req = test::TestRequest::get()
    .uri(&format!("/shop/orders/{order_id}"))
    .insert_header(("X-User-ID", user.to_string()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["items"][0]["priceAtPurchaseCents"], 700);

  let req = test::TestRequest::get()
    .uri(&format!("/shop/orders/{order_id}"))
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn health_is_ok() {
  let store = MemoryStore::new();
  let app = shop_app!(&store);
  let req = test::TestRequest::get().uri("/health").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "ok");
}
