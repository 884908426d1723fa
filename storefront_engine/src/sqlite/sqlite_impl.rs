//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use serde_json::Value;
use sf_common::Cents;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{cart, db_url, new_pool, orders, products, users};
use crate::{
    db_types::{
        CartItem,
        CartItemId,
        CartLine,
        NewOrderItem,
        NewProduct,
        NewUser,
        Order,
        OrderId,
        OrderStatusType,
        OrderWithItems,
        PaymentInfo,
        Product,
        ProductId,
        ProductUpdate,
        User,
        UserId,
    },
    traits::{
        AuthApiError,
        CartApiError,
        CartManagement,
        CatalogApiError,
        CatalogManagement,
        OrderFlowError,
        OrderManagement,
        OrderPage,
        Page,
        Pagination,
        ProductQueryFilter,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn insert_products(&self, new_products: Vec<NewProduct>) -> Result<Vec<Product>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let mut result = Vec::with_capacity(new_products.len());
        for product in new_products {
            let product = products::insert_product(product, &mut tx).await?;
            result.push(product);
        }
        tx.commit().await?;
        debug!("🗃️ {} products imported", result.len());
        Ok(result)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn search_products(&self, filter: ProductQueryFilter) -> Result<Page<Product>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let page = products::search_products(filter, &mut tx).await?;
        tx.commit().await?;
        Ok(page)
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        trace!("🗃️ {id} updating with new values: {update:?}");
        products::update_product(id, update, &mut conn).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::delete_product(id, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let lines = cart::fetch_cart_lines(user_id, &mut conn).await?;
        Ok(lines)
    }

    async fn upsert_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn)
            .await?
            .ok_or(CartApiError::ProductNotFound(product_id))?;
        if product.stock < quantity {
            return Err(CartApiError::InsufficientStock { product_id, requested: quantity, available: product.stock });
        }
        // A product deleted between the check and the insert surfaces as a foreign key violation
        cart::upsert_cart_item(user_id, product_id, quantity, &mut conn).await.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => CartApiError::ProductNotFound(product_id),
            _ => CartApiError::from(e),
        })
    }

    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId) -> Result<bool, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = cart::remove_cart_item(user_id, item_id, &mut conn).await?;
        Ok(removed)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = cart::clear_cart(user_id, &mut conn).await?;
        Ok(count)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn place_order(
        &self,
        user_id: UserId,
        lines: &[CartLine],
        shipping_address: Value,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let currency = lines.first().map(|l| l.currency.clone()).ok_or(OrderFlowError::EmptyCart)?;
        let mut tx = self.pool.begin().await?;
        // The first statement in the transaction must be a write. SQLite then takes the write lock before the
        // transaction reads anything, and a second placement waits on the busy timeout instead of failing.
        let mut total = Cents::default();
        let mut staged = Vec::with_capacity(lines.len());
        for line in lines {
            let reserved = products::decrement_stock(line.product_id, line.quantity, &mut tx).await?;
            if !reserved {
                debug!(
                    "🗃️ Could not reserve {} of {} for {user_id}. Placement is rolled back.",
                    line.quantity, line.product_id
                );
                return Err(OrderFlowError::InsufficientStock { product_id: line.product_id, name: line.name.clone() });
            }
            let subtotal = line.subtotal().ok_or(OrderFlowError::TotalOverflow)?;
            total = total.checked_add(subtotal).ok_or(OrderFlowError::TotalOverflow)?;
            staged.push(NewOrderItem { product_id: line.product_id, unit_price: line.unit_price, quantity: line.quantity });
        }
        let order = orders::insert_order(user_id, total, &currency, shipping_address, &mut tx).await?;
        orders::insert_order_items(order.id, &staged, &mut tx).await?;
        let cleared = cart::remove_ordered_items(user_id, lines, &mut tx).await?;
        if cleared == 0 {
            debug!("🗃️ The cart for {user_id} was emptied by a concurrent placement. {} is rolled back.", order.id);
            return Err(OrderFlowError::EmptyCart);
        }
        if cleared != lines.len() as u64 {
            debug!(
                "🗃️ The cart for {user_id} changed after it was read. Only {cleared} of {} items match. {} is rolled \
                 back.",
                lines.len(),
                order.id
            );
            return Err(OrderFlowError::CartChanged);
        }
        tx.commit().await?;
        debug!("🗃️ {} committed with {} line items. {cleared} cart items cleared.", order.id, staged.len());

        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_with_items(order.id, &mut conn).await?.ok_or_else(|| {
            error!("🗃️ {} was not found straight after committing it. This is a bug.", order.id);
            OrderFlowError::OrderNotFound(order.id)
        })
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_with_items(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: UserId, pagination: Pagination) -> Result<OrderPage, OrderFlowError> {
        self.fetch_order_page(Some(user_id), pagination).await
    }

    async fn fetch_all_orders(&self, pagination: Pagination) -> Result<OrderPage, OrderFlowError> {
        self.fetch_order_page(None, pagination).await
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(id, status, &mut conn).await?;
        if order.is_some() {
            debug!("🗃️ {id} status set to {status}");
        }
        Ok(order)
    }

    async fn mark_order_paid(&self, id: OrderId, payment: PaymentInfo) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::mark_order_paid(id, payment, &mut conn).await?;
        Ok(order)
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date by applying any embedded migrations that have not been run yet.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Reads the page and the total count in one transaction, so that they describe the same snapshot.
    async fn fetch_order_page(
        &self,
        user_id: Option<UserId>,
        pagination: Pagination,
    ) -> Result<OrderPage, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let total = orders::count_orders(user_id, &mut tx).await?;
        let page = orders::fetch_orders(user_id, pagination, &mut tx).await?;
        let page = orders::attach_items(page, &mut tx).await?;
        tx.commit().await?;
        Ok(Page::new(page, pagination, total))
    }
}
