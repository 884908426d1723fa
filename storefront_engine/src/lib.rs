//! Storefront Engine
//!
//! The storefront engine holds the core logic of an online store: the product catalog, shopping carts, order
//! placement, and payment for orders. It knows nothing about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). The traits describe what a storage backend must do, and
//!    [`SqliteDatabase`] is the SQLite implementation of all of them. The data types stored in the database are
//!    defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@sf_api`]). This is what clients of the engine should use. Each API wraps a backend that
//!    implements the traits it needs.
//!
//! The most important guarantee the engine makes is that placing an order is atomic: stock is reserved, the order is
//! stored and the cart is cleared together, or not at all, and stock never goes negative no matter how many orders are
//! placed concurrently.
pub mod db_types;
pub mod helpers;
pub mod sf_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use sf_api::{
    auth_api::AuthApi,
    cart_api::CartApi,
    cart_objects,
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
    payment_api::PaymentApi,
    payment_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AuthApiError,
    CartApiError,
    CartManagement,
    CatalogApiError,
    CatalogManagement,
    OrderFlowError,
    OrderManagement,
    UserManagement,
};
