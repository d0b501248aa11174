//! System settings service
//!
//! Typed access to the key/value config store. Numeric settings are parsed
//! here with a fallback default on missing key or parse failure, so the
//! circulation engine never sees a malformed value.

use crate::{
    error::{AppError, AppResult},
    models::setting::SystemSetting,
    repository::Repository,
};

pub const LOAN_PERIOD_DAYS_KEY: &str = "loan_period_days";
pub const FINE_RATE_PER_DAY_KEY: &str = "fine_rate_per_day";
pub const MAX_RENEWALS_KEY: &str = "max_renewals";

pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;
pub const DEFAULT_FINE_RATE_PER_DAY: f64 = 0.50;
pub const DEFAULT_MAX_RENEWALS: i32 = 2;

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get all settings
    pub async fn list(&self) -> AppResult<Vec<SystemSetting>> {
        self.repository.settings.list().await
    }

    /// Get a setting by key
    pub async fn get(&self, key: &str) -> AppResult<SystemSetting> {
        self.repository
            .settings
            .get(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Setting {} not found", key)))
    }

    /// Create or update a setting
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> AppResult<SystemSetting> {
        if key.trim().is_empty() {
            return Err(AppError::Validation("Setting key must not be empty".to_string()));
        }
        self.repository.settings.upsert(key, value, updated_by).await
    }

    /// Loan period in days, default 14
    pub async fn loan_period_days(&self) -> AppResult<i64> {
        Ok(self
            .parsed(LOAN_PERIOD_DAYS_KEY)
            .await?
            .unwrap_or(DEFAULT_LOAN_PERIOD_DAYS))
    }

    /// Fine rate per overdue day in currency units, default 0.50
    pub async fn fine_rate_per_day(&self) -> AppResult<f64> {
        Ok(self
            .parsed(FINE_RATE_PER_DAY_KEY)
            .await?
            .unwrap_or(DEFAULT_FINE_RATE_PER_DAY))
    }

    /// Maximum renewals per loan, default 2
    pub async fn max_renewals(&self) -> AppResult<i32> {
        Ok(self
            .parsed(MAX_RENEWALS_KEY)
            .await?
            .unwrap_or(DEFAULT_MAX_RENEWALS))
    }

    async fn parsed<T: std::str::FromStr>(&self, key: &str) -> AppResult<Option<T>> {
        let setting = self.repository.settings.get(key).await?;
        Ok(setting.and_then(|s| s.setting_value.trim().parse().ok()))
    }
}
