#![allow(dead_code)]
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::SqliteDatabase;

/// A database URL for a fresh SQLite file in the system temp directory.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/sf_test_{}.db", dir.display(), rand::random::<u64>())
}

/// Creates an empty database at `url`, runs the migrations on it and returns a connection to it.
pub async fn prepare_test_env(url: &str, max_connections: u32) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        Sqlite::drop_database(url).await.expect("Error dropping stale database");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, max_connections).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}
