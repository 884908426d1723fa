use std::collections::HashMap;

use cucumber::World;
use storefront_engine::{
    cart_objects::CartView,
    db_types::{NewUser, OrderWithItems, ProductId, Role, UserId},
    payment_objects::ChargeResult,
    CartApi,
    CartApiError,
    CatalogApi,
    OrderFlowApi,
    OrderFlowError,
    PaymentApi,
    SqliteDatabase,
    UserManagement,
};

use crate::support::prepare_env::{prepare_test_env, random_db_path};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    pub users: HashMap<String, UserId>,
    pub products: HashMap<String, ProductId>,
    pub last_order: Option<Result<OrderWithItems, OrderFlowError>>,
    pub orders: HashMap<String, Vec<OrderWithItems>>,
    pub race_results: Vec<Result<OrderWithItems, OrderFlowError>>,
    pub cart_result: Option<Result<CartView, CartApiError>>,
    pub charge_result: Option<Result<ChargeResult, OrderFlowError>>,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
}

impl StorefrontWorld {
    pub fn db(&self) -> &SqliteDatabase {
        &self.system.as_ref().expect("Storefront not initialised").db
    }

    pub fn orders_api(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db().clone())
    }

    pub fn cart_api(&self) -> CartApi<SqliteDatabase> {
        CartApi::new(self.db().clone())
    }

    pub fn catalog_api(&self) -> CatalogApi<SqliteDatabase> {
        CatalogApi::new(self.db().clone())
    }

    pub fn payment_api(&self, success_rate: f64) -> PaymentApi<SqliteDatabase> {
        PaymentApi::with_success_rate(self.db().clone(), success_rate)
    }

    pub fn user(&self, name: &str) -> UserId {
        *self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, sku: &str) -> ProductId {
        *self.products.get(sku).unwrap_or_else(|| panic!("No product with SKU {sku}"))
    }

    /// Users are stored directly, so that scenarios do not pay for password hashing.
    pub async fn add_user(&mut self, name: &str) -> UserId {
        let user = NewUser {
            email: format!("{name}@example.com"),
            password_hash: "unused".into(),
            full_name: name.to_string(),
            role: Role::User,
        };
        let user = self.db().insert_user(user).await.expect("Error creating user");
        self.users.insert(name.to_string(), user.id);
        user.id
    }

    /// The most recent order that `name` placed successfully.
    pub fn latest_order_of(&self, name: &str) -> &OrderWithItems {
        self.orders.get(name).and_then(|o| o.last()).unwrap_or_else(|| panic!("{name} has not placed an order"))
    }

    pub fn last_order(&self) -> &Result<OrderWithItems, OrderFlowError> {
        self.last_order.as_ref().expect("No order has been placed")
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url, 5).await;
        Self { db_path: url, db }
    }
}
