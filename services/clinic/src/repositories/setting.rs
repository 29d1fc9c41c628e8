//! System settings repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::ApiKeyStore;
use crate::models::setting::QR_API_KEY_PREFIX;

/// Repository over the `system_settings` table
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for SettingRepository {
    async fn is_active_api_key(&self, key: &str) -> DatabaseResult<bool> {
        let found: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM system_settings
            WHERE starts_with(setting_key, $1)
              AND setting_value = $2
              AND is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(QR_API_KEY_PREFIX)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(found.is_some())
    }
}
