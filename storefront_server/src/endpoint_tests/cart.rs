use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use chrono::Utc;
use serde_json::json;
use storefront_engine::{
    db_types::{CartItem, CartItemId, ProductId, Role, UserId},
    traits::CartApiError,
    CartApi,
};

use super::{
    helpers::{issue_token, json, request, send_authenticated},
    mocks::{cart_line, MockStore},
};
use crate::routes::{AddToCartRoute, ClearCartRoute, GetCartRoute, RemoveCartItemRoute};

fn configure_with(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(AddToCartRoute::<MockStore>::new())
            .service(GetCartRoute::<MockStore>::new())
            .service(ClearCartRoute::<MockStore>::new())
            .service(RemoveCartItemRoute::<MockStore>::new())
            .app_data(web::Data::new(CartApi::new(store)));
    }
}

#[actix_web::test]
async fn view_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_cart_lines()
        .withf(|user_id| *user_id == UserId(4))
        .returning(|_| Ok(vec![cart_line(1, 1, 1500, 2), cart_line(2, 2, 250, 3)]));
    let token = issue_token(4, Role::User);
    let (status, body) = send_authenticated(request(Method::GET, "/cart", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart = json(&body);
    assert_eq!(cart["total"], 3750);
    assert_eq!(cart["currency"], "USD");
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["items"][0]["subtotal"], 3000);
    assert_eq!(cart["items"][1]["product"]["sku"], "SKU-2");
}

#[actix_web::test]
async fn add_to_cart_returns_the_updated_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_upsert_cart_item()
        .withf(|user_id, product_id, qty| *user_id == UserId(4) && *product_id == ProductId(1) && *qty == 2)
        .times(1)
        .returning(|user_id, product_id, quantity| {
            let now = Utc::now();
            Ok(CartItem { id: CartItemId(1), user_id, product_id, quantity, created_at: now, updated_at: now })
        });
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, 1500, 2)]));
    let token = issue_token(4, Role::User);
    let body = json!({"product_id": 1, "quantity": 2});
    let req = request(Method::POST, "/cart", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["total"], 3000);
}

#[actix_web::test]
async fn add_to_cart_errors() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(4, Role::User);

    // Zero quantities never reach the backend
    let store = MockStore::new();
    let req = request(Method::POST, "/cart", Some(&token), Some(json!({"product_id": 1, "quantity": 0})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut store = MockStore::new();
    store.expect_upsert_cart_item().returning(|_, product_id, _| Err(CartApiError::ProductNotFound(product_id)));
    let req = request(Method::POST, "/cart", Some(&token), Some(json!({"product_id": 99, "quantity": 1})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let mut store = MockStore::new();
    store.expect_upsert_cart_item().returning(|_, product_id, requested| {
        Err(CartApiError::InsufficientStock { product_id, requested, available: 1 })
    });
    let req = request(Method::POST, "/cart", Some(&token), Some(json!({"product_id": 1, "quantity": 5})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["error"], "Validation failed");
}

#[actix_web::test]
async fn carts_too_large_to_total() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(4, Role::User);
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, i64::MAX / 2, 3)]));
    let (status, body) = send_authenticated(request(Method::GET, "/cart", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["error"], "Validation failed");

    let mut store = MockStore::new();
    store.expect_upsert_cart_item().returning(|user_id, product_id, quantity| {
        let now = Utc::now();
        Ok(CartItem { id: CartItemId(2), user_id, product_id, quantity, created_at: now, updated_at: now })
    });
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, i64::MAX / 2, 1), cart_line(2, 2, i64::MAX / 2, 2)]));
    let req = request(Method::POST, "/cart", Some(&token), Some(json!({"product_id": 2, "quantity": 2})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["details"].as_str().unwrap().contains("too large"), "{body}");
}

#[actix_web::test]
async fn remove_and_clear() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(4, Role::User);
    let mut store = MockStore::new();
    store.expect_remove_cart_item().returning(|_, item_id| Ok(item_id == CartItemId(7)));
    store.expect_clear_cart().returning(|_| Ok(3));
    let (status, body) = send_authenticated(request(Method::DELETE, "/cart/7", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);

    let mut store = MockStore::new();
    store.expect_remove_cart_item().returning(|_, _| Ok(false));
    let (status, body) = send_authenticated(request(Method::DELETE, "/cart/8", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let mut store = MockStore::new();
    store.expect_clear_cart().times(1).returning(|_| Ok(3));
    let (status, body) = send_authenticated(request(Method::DELETE, "/cart", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["message"], "Removed 3 items from the cart");
}
