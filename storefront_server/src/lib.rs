//! # Storefront server
//! This crate hosts the HTTP server for the storefront. It is responsible for:
//! * Authenticating users and issuing access tokens.
//! * Exposing the product catalog, shopping carts, order placement and payments.
//! * Translating engine errors into HTTP responses.
//!
//! All the business logic lives in `storefront_engine`. The server only parses requests, checks permissions and
//! calls the engine APIs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/v1/...`: The storefront API. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
