//! System settings store

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{error::AppResult, models::setting::SystemSetting};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Sqlite>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a setting by key
    pub async fn get(&self, key: &str) -> AppResult<Option<SystemSetting>> {
        let setting = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings WHERE setting_key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(setting)
    }

    /// List all settings
    pub async fn list(&self) -> AppResult<Vec<SystemSetting>> {
        let settings =
            sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings ORDER BY setting_key")
                .fetch_all(&self.pool)
                .await?;
        Ok(settings)
    }

    /// Create or update a setting
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> AppResult<SystemSetting> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, updated_at, updated_by)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        Ok(SystemSetting {
            setting_key: key.to_string(),
            setting_value: value.to_string(),
            updated_at: now,
            updated_by: updated_by.map(|s| s.to_string()),
        })
    }
}
