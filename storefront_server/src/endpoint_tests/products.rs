use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use serde_json::json;
use sf_common::Cents;
use storefront_engine::{
    db_types::{Json, Product, ProductId, Role},
    traits::{CatalogApiError, Page, ProductSort},
    CatalogApi,
};

use super::{
    helpers::{issue_token, json, request, send_authenticated, send_public},
    mocks::{mug, MockCatalog},
};
use crate::routes::{
    CreateProductRoute,
    DeleteProductRoute,
    ImportProductsRoute,
    ProductByIdRoute,
    ProductsRoute,
    UpdateProductRoute,
};

fn configure_public(catalog: MockCatalog) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ProductsRoute::<MockCatalog>::new())
            .service(ProductByIdRoute::<MockCatalog>::new())
            .app_data(web::Data::new(CatalogApi::new(catalog)));
    }
}

fn configure_admin(catalog: MockCatalog) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateProductRoute::<MockCatalog>::new())
            .service(ImportProductsRoute::<MockCatalog>::new())
            .service(UpdateProductRoute::<MockCatalog>::new())
            .service(DeleteProductRoute::<MockCatalog>::new())
            .app_data(web::Data::new(CatalogApi::new(catalog)));
    }
}

#[actix_web::test]
async fn search_products() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog
        .expect_search_products()
        .withf(|f| {
            f.search.as_deref() == Some("mug") &&
                f.min_price == Some(Cents::from(1000)) &&
                f.max_price.is_none() &&
                f.sort == ProductSort::PriceAsc &&
                f.pagination.page() == 1
        })
        .returning(|f| Ok(Page::new(vec![mug()], f.pagination, 1)));
    let req = request(Method::GET, "/products?q=mug&min_price=1000&sort=price_asc", None, None);
    let (status, body) = send_public(req, configure_public(catalog)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["total"], 1);
    assert_eq!(page["size"], 20);
    assert_eq!(page["items"][0]["sku"], "MUG-1");
    assert_eq!(page["items"][0]["price"], 1500);
}

#[actix_web::test]
async fn bad_product_queries() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_search_products().never();
    let (status, body) =
        send_public(request(Method::GET, "/products?sort=cheapest", None, None), configure_public(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["error"], "Invalid request");

    let mut catalog = MockCatalog::new();
    catalog.expect_search_products().never();
    let (status, body) =
        send_public(request(Method::GET, "/products?min_price=cheap", None, None), configure_public(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn product_by_id() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_product().returning(|id| Ok((id == ProductId(1)).then(mug)));
    let (status, body) = send_public(request(Method::GET, "/products/1", None, None), configure_public(catalog)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["name"], "Tea mug");

    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_product().returning(|_| Ok(None));
    let (status, body) = send_public(request(Method::GET, "/products/2", None, None), configure_public(catalog)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    assert_eq!(json(&body)["error"], "Not found");
}

#[actix_web::test]
async fn only_admins_manage_products() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_insert_product().never();
    let token = issue_token(4, Role::User);
    let body = json!({"sku": "MUG-2", "name": "Coffee mug", "price": 1800, "stock": 4});
    let req = request(Method::POST, "/admin/products", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog
        .expect_insert_product()
        .withf(|p| p.sku == "MUG-2" && p.currency == "EUR" && p.stock == 4)
        .times(1)
        .returning(|p| {
            Ok(Product {
                id: ProductId(2),
                sku: p.sku,
                name: p.name,
                price: p.price,
                currency: p.currency,
                stock: p.stock,
                images: Json(p.images),
                ..mug()
            })
        });
    let token = issue_token(1, Role::Admin);
    let body = json!({"sku": " MUG-2 ", "name": "Coffee mug", "price": 1800, "currency": "eur", "stock": 4});
    let req = request(Method::POST, "/admin/products", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(json(&body)["id"], 2);
    assert_eq!(json(&body)["currency"], "EUR");
}

#[actix_web::test]
async fn create_product_errors() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let mut catalog = MockCatalog::new();
    catalog.expect_insert_product().returning(|p| Err(CatalogApiError::DuplicateSku(p.sku)));
    let body = json!({"sku": "MUG-1", "name": "Tea mug", "price": 1500});
    let req = request(Method::POST, "/admin/products", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let mut catalog = MockCatalog::new();
    catalog.expect_insert_product().never();
    let body = json!({"sku": "MUG-3", "name": "Tea mug", "price": -5});
    let req = request(Method::POST, "/admin/products", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn bulk_import() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let mut catalog = MockCatalog::new();
    catalog.expect_insert_products().withf(|p| p.len() == 2).times(1).returning(|products| {
        Ok(products
            .into_iter()
            .enumerate()
            .map(|(i, p)| Product { id: ProductId(i as i64 + 10), sku: p.sku, name: p.name, ..mug() })
            .collect())
    });
    let body = json!([
        {"sku": "A-1", "name": "Apron", "price": 2500, "stock": 3},
        {"sku": "B-1", "name": "Bowl", "price": 900, "stock": 8}
    ]);
    let req = request(Method::POST, "/admin/products/bulk", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let products = json(&body);
    assert_eq!(products.as_array().unwrap().len(), 2);
    assert_eq!(products[1]["sku"], "B-1");

    // One bad product sinks the whole import
    let mut catalog = MockCatalog::new();
    catalog.expect_insert_products().never();
    let body = json!([
        {"sku": "A-1", "name": "Apron", "price": 2500},
        {"sku": "", "name": "Bowl", "price": 900}
    ]);
    let req = request(Method::POST, "/admin/products/bulk", Some(&token), Some(body));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["details"].as_str().unwrap().contains("Product #2"), "{body}");
}

#[actix_web::test]
async fn update_and_delete() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let mut catalog = MockCatalog::new();
    catalog
        .expect_update_product()
        .withf(|id, u| *id == ProductId(1) && u.stock == Some(0) && u.price.is_none())
        .returning(|_, u| Ok(Some(Product { stock: u.stock.unwrap_or_default(), ..mug() })));
    let req = request(Method::PUT, "/admin/products/1", Some(&token), Some(json!({"stock": 0})));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["stock"], 0);

    let mut catalog = MockCatalog::new();
    catalog.expect_update_product().never();
    let req = request(Method::PUT, "/admin/products/1", Some(&token), Some(json!({})));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut catalog = MockCatalog::new();
    catalog.expect_delete_product().returning(|id| Err(CatalogApiError::ProductInUse(id)));
    let req = request(Method::DELETE, "/admin/products/1", Some(&token), None);
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let mut catalog = MockCatalog::new();
    catalog.expect_delete_product().returning(|id| Ok(id == ProductId(3)));
    let req = request(Method::DELETE, "/admin/products/3", Some(&token), None);
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let req = request(Method::DELETE, "/admin/products/4", Some(&token), None);
    let mut catalog = MockCatalog::new();
    catalog.expect_delete_product().returning(|_| Ok(false));
    let (status, body) = send_authenticated(req, configure_admin(catalog)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}
