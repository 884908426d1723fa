use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use serde_json::json;
use storefront_engine::{
    db_types::{OrderId, OrderStatusType, ProductId, Role, UserId},
    traits::{OrderFlowError, Page},
    OrderFlowApi,
    PaymentApi,
};

use super::{
    helpers::{issue_token, json, request, send_authenticated},
    mocks::{cart_line, order, MockStore},
};
use crate::routes::{
    AdminOrderRoute,
    AdminOrdersRoute,
    ChargeRoute,
    MyOrderRoute,
    MyOrdersRoute,
    PlaceOrderRoute,
    UpdateOrderStatusRoute,
};

fn configure_with(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(PlaceOrderRoute::<MockStore>::new())
            .service(MyOrdersRoute::<MockStore>::new())
            .service(MyOrderRoute::<MockStore>::new())
            .service(AdminOrdersRoute::<MockStore>::new())
            .service(AdminOrderRoute::<MockStore>::new())
            .service(UpdateOrderStatusRoute::<MockStore>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store)));
    }
}

fn configure_payments(store: MockStore, success_rate: f64) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ChargeRoute::<MockStore>::new())
            .app_data(web::Data::new(PaymentApi::with_success_rate(store, success_rate)));
    }
}

fn shipping() -> serde_json::Value {
    json!({"shipping_address": {"street": "1 Main St", "city": "Springfield"}})
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, 1500, 2)]));
    store
        .expect_place_order()
        .withf(|user_id, lines, address| *user_id == UserId(4) && lines.len() == 1 && address["city"] == "Springfield")
        .times(1)
        .returning(|_, _, _| Ok(order(12, 4, OrderStatusType::Pending)));
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(shipping()));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json(&body);
    assert_eq!(order["id"], 12);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], 3000);
    assert_eq!(order["items"][0]["unit_price"], 1500);
    assert_eq!(order["shipping_address"]["street"], "1 Main St");
}

#[actix_web::test]
async fn empty_carts_cannot_be_ordered() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![]));
    store.expect_place_order().never();
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(shipping()));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["error"], "Validation failed");
}

#[actix_web::test]
async fn out_of_stock_orders_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, 1500, 2)]));
    store
        .expect_place_order()
        .returning(|_, _, _| Err(OrderFlowError::InsufficientStock { product_id: ProductId(1), name: "Tea mug".into() }));
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(shipping()));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["details"].as_str().unwrap().contains("Tea mug"), "{body}");
}

#[actix_web::test]
async fn carts_edited_during_placement() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, 1500, 2)]));
    store.expect_place_order().returning(|_, _, _| Err(OrderFlowError::CartChanged));
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(shipping()));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(json(&body)["error"], "Conflict");
}

#[actix_web::test]
async fn overflowing_order_totals_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().returning(|_| Ok(vec![cart_line(1, 1, i64::MAX / 2, 3)]));
    store.expect_place_order().returning(|_, _, _| Err(OrderFlowError::TotalOverflow));
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(shipping()));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["details"].as_str().unwrap().contains("too large"), "{body}");
}

#[actix_web::test]
async fn shipping_address_must_be_an_object() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_lines().never();
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/orders", Some(&token), Some(json!({"shipping_address": "1 Main St"})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn my_orders_are_paginated() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_orders_for_user()
        .withf(|user_id, p| *user_id == UserId(4) && p.page() == 2 && p.size() == 1)
        .returning(|_, p| Ok(Page::new(vec![order(11, 4, OrderStatusType::Paid)], p, 3)));
    let token = issue_token(4, Role::User);
    let req = request(Method::GET, "/orders?page=2&size=1", Some(&token), None);
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["page"], 2);
    assert_eq!(page["size"], 1);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"][0]["id"], 11);
}

#[actix_web::test]
async fn other_users_orders_look_missing() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id| Ok((id == OrderId(12)).then(|| order(12, 5, OrderStatusType::Pending))));
    let token = issue_token(4, Role::User);
    let (status, foreign) =
        send_authenticated(request(Method::GET, "/orders/12", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let (status, missing) =
        send_authenticated(request(Method::GET, "/orders/12", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);

    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 4, OrderStatusType::Pending))));
    let (status, body) =
        send_authenticated(request(Method::GET, "/orders/12", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["user_id"], 4);
}

#[actix_web::test]
async fn admin_routes_need_the_admin_role() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_all_orders().never();
    let token = issue_token(4, Role::User);
    let (status, body) =
        send_authenticated(request(Method::GET, "/admin/orders", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(json(&body)["error"], "Forbidden");

    let mut store = MockStore::new();
    store
        .expect_fetch_all_orders()
        .returning(|p| Ok(Page::new(vec![order(11, 4, OrderStatusType::Paid), order(12, 5, OrderStatusType::Pending)], p, 2)));
    let token = issue_token(1, Role::Admin);
    let (status, body) =
        send_authenticated(request(Method::GET, "/admin/orders", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["items"].as_array().unwrap().len(), 2);

    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 5, OrderStatusType::Pending))));
    let (status, body) =
        send_authenticated(request(Method::GET, "/admin/orders/12", Some(&token), None), configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["user_id"], 5);
}

#[actix_web::test]
async fn admins_update_order_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let mut store = MockStore::new();
    store
        .expect_update_order_status()
        .withf(|id, status| *id == OrderId(12) && *status == OrderStatusType::Shipped)
        .returning(|_, status| Ok(Some(order(12, 5, status).order)));
    let req = request(Method::PATCH, "/admin/orders/12", Some(&token), Some(json!({"status": "shipped"})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "shipped");

    let mut store = MockStore::new();
    store.expect_update_order_status().never();
    let req = request(Method::PATCH, "/admin/orders/12", Some(&token), Some(json!({"status": "lost"})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut store = MockStore::new();
    store.expect_update_order_status().returning(|_, _| Ok(None));
    let req = request(Method::PATCH, "/admin/orders/99", Some(&token), Some(json!({"status": "cancelled"})));
    let (status, body) = send_authenticated(req, configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[actix_web::test]
async fn successful_charge() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 4, OrderStatusType::Pending))));
    store
        .expect_mark_order_paid()
        .withf(|id, payment| *id == OrderId(12) && payment.method == "card" && payment.transaction_id.starts_with("TXN_"))
        .times(1)
        .returning(|_, _| Ok(Some(order(12, 4, OrderStatusType::Paid).order)));
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/payments/charge", Some(&token), Some(json!({"order_id": 12})));
    let (status, body) = send_authenticated(req, configure_payments(store, 1.0)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    assert_eq!(result["status"], "success");
    assert_eq!(result["order_id"], 12);
    assert_eq!(result["transaction_id"].as_str().unwrap().len(), 12);
}

#[actix_web::test]
async fn declined_charges_leave_the_order_alone() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 4, OrderStatusType::Pending))));
    store.expect_mark_order_paid().never();
    let token = issue_token(4, Role::User);
    let req = request(Method::POST, "/payments/charge", Some(&token), Some(json!({"order_id": 12})));
    let (status, body) = send_authenticated(req, configure_payments(store, 0.0)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "failed");
}

#[actix_web::test]
async fn charge_errors() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(4, Role::User);
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 4, OrderStatusType::Paid))));
    store.expect_mark_order_paid().never();
    let req = request(Method::POST, "/payments/charge", Some(&token), Some(json!({"order_id": 12})));
    let (status, body) = send_authenticated(req, configure_payments(store, 1.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order(12, 5, OrderStatusType::Pending))));
    store.expect_mark_order_paid().never();
    let req = request(Method::POST, "/payments/charge", Some(&token), Some(json!({"order_id": 12})));
    let (status, body) = send_authenticated(req, configure_payments(store, 1.0)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}
