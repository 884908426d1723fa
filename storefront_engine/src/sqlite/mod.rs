//! SQLite database module for the storefront engine.
//!
//! The schema lives in `migrations/` and is embedded in the binary. Call [`SqliteDatabase::migrate`] to apply it.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
