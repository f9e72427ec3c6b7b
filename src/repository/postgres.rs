//! PostgreSQL 存储实现
//!
//! 表 `user_records(storage_key, payload JSONB, created_at)`，由 `migrations/` 管理。
//! 条件写入依赖 `INSERT … ON CONFLICT DO NOTHING` 的原子性。

use async_trait::async_trait;
use sqlx::types::Json;

use super::UserRecordAdapter;
use crate::domain::user::UserRecord;
use crate::error::WalletResult;
use crate::infrastructure::db::PgPool;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRecordAdapter for PgUserStore {
    async fn get(&self, key: &str) -> WalletResult<Option<UserRecord>> {
        let row = sqlx::query_scalar::<_, Json<UserRecord>>(
            "SELECT payload FROM user_records WHERE storage_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(record)| record))
    }

    async fn put(&self, key: &str, record: &UserRecord) -> WalletResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_records (storage_key, payload, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (storage_key) DO UPDATE SET payload = EXCLUDED.payload
            "#,
        )
        .bind(key)
        .bind(Json(record))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_if_absent(&self, key: &str, record: &UserRecord) -> WalletResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_records (storage_key, payload, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (storage_key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(Json(record))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, prefix: &str) -> WalletResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT storage_key FROM user_records
            WHERE left(storage_key, char_length($1)) = $1
            ORDER BY storage_key
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_string))
            .collect())
    }

    async fn delete(&self, key: &str) -> WalletResult<bool> {
        let result = sqlx::query("DELETE FROM user_records WHERE storage_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
