//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) — document collections
//! `product` / `order` / `notification`.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at `db_path` and apply the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("campus")
            .use_db("shop")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!("Database connection established (SurrealDB embedded, RocksDB)");

        Ok(Self { db })
    }
}

/// Table and index definitions (idempotent, applied at startup)
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    let statements = [
        "DEFINE TABLE IF NOT EXISTS product SCHEMALESS",
        "DEFINE TABLE IF NOT EXISTS order SCHEMALESS",
        "DEFINE TABLE IF NOT EXISTS notification SCHEMALESS",
        "DEFINE INDEX IF NOT EXISTS order_created_at ON order FIELDS created_at",
        "DEFINE INDEX IF NOT EXISTS notification_created_at ON notification FIELDS created_at",
        "DEFINE INDEX IF NOT EXISTS notification_is_read ON notification FIELDS is_read",
    ];

    for stmt in statements {
        db.query(stmt)
            .await
            .map_err(|e| AppError::database(format!("Schema definition failed: {e}")))?
            .check()
            .map_err(|e| AppError::database(format!("Schema definition failed: {e}")))?;
    }

    Ok(())
}
