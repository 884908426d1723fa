//! # Backend contracts
//!
//! This module defines the behaviour that database backends need to expose in order to be supported by the storefront
//! engine. The public APIs in [`crate::sf_api`] are generic over these traits, so that the server can be pointed at
//! any backend, and so that the APIs can be exercised against mocks.
//!
//! * [`CatalogManagement`] stores and searches products.
//! * [`CartManagement`] maintains per-user shopping carts.
//! * [`OrderManagement`] turns carts into orders and tracks order status. This is where the atomic stock reservation
//!   lives.
//! * [`UserManagement`] stores user accounts.
mod cart_management;
mod catalog_management;
mod order_management;
mod user_management;

pub mod data_objects;

pub use cart_management::{CartApiError, CartManagement};
pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use data_objects::{OrderPage, Page, PageParams, Pagination, ProductQueryFilter, ProductSort};
pub use order_management::{OrderFlowError, OrderManagement};
pub use user_management::{AuthApiError, UserManagement};
