//! # Storefront engine public API
//!
//! The `sf_api` module exposes the programmatic API for the storefront engine. The API is modular, so that clients can
//! pick and choose the functionality they want.
//!
//! * [`auth_api`] registers accounts and checks credentials.
//! * [`catalog_api`] maintains the product catalog.
//! * [`cart_api`] manages each user's shopping cart.
//! * [`order_flow_api`] is the primary API. It places orders from carts, and reads and updates them afterwards.
//! * [`payment_api`] takes (simulated) payment for placed orders.
//!
//! The other submodules hold the request and response types used by these APIs.
//!
//! # API usage
//!
//! Every API is created by supplying a database backend that implements the backend traits it needs.
//!
//! ```rust,ignore
//! use storefront_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 25).await?;
//! // SqliteDatabase implements OrderManagement and CartManagement
//! let api = OrderFlowApi::new(db);
//! let order = api.place_order(user_id, shipping_address).await?;
//! ```

pub mod auth_api;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod order_flow_api;
pub mod payment_api;
pub mod payment_objects;
