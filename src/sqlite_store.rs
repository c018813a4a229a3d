//! SQLite-backed [`KvStore`] implementation.
//!
//! Each bucket is one row of `note_buckets`, its notes serialized as a JSON
//! array. `set` replaces all given rows in a single transaction, so a
//! failed write leaves every bucket as it was.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use context_notes_core::store::{Bucket, BucketMap, KvStore};

use crate::config::Config;
use crate::db;
use crate::migrate;

/// SQLite implementation of the [`KvStore`] trait.
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using the configured database path and ensure the schema.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::create_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_bucket(key: &str, json: &str) -> Result<Bucket> {
    serde_json::from_str(json).with_context(|| format!("Corrupt note bucket for key '{}'", key))
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, keys: Option<&[String]>) -> Result<BucketMap> {
        let mut out = BucketMap::new();
        match keys {
            None => {
                let rows = sqlx::query("SELECT key, notes_json FROM note_buckets ORDER BY key")
                    .fetch_all(&self.pool)
                    .await?;
                for row in rows {
                    let key: String = row.get("key");
                    let json: String = row.get("notes_json");
                    let bucket = decode_bucket(&key, &json)?;
                    out.insert(key, bucket);
                }
            }
            Some(keys) => {
                for key in keys {
                    let row = sqlx::query("SELECT notes_json FROM note_buckets WHERE key = ?")
                        .bind(key)
                        .fetch_optional(&self.pool)
                        .await?;
                    if let Some(row) = row {
                        let json: String = row.get("notes_json");
                        out.insert(key.clone(), decode_bucket(key, &json)?);
                    }
                }
            }
        }
        Ok(out)
    }

    async fn set(&self, items: BucketMap) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for (key, bucket) in &items {
            let json = serde_json::to_string(bucket)?;
            sqlx::query(
                r#"
                INSERT INTO note_buckets (key, notes_json, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    notes_json = excluded.notes_json,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(&json)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
