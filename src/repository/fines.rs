//! Fine ledger

use sqlx::{Pool, Sqlite, Transaction};

use crate::{error::AppResult, models::fine::Fine};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Sqlite>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List fines, optionally filtered by user and/or paid flag
    pub async fn list(
        &self,
        user_id: Option<&str>,
        paid: Option<bool>,
    ) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT * FROM fines
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR paid = ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(paid)
        .fetch_all(&self.pool)
        .await?;
        Ok(fines)
    }

    /// Total unpaid amount for a user
    pub async fn sum_outstanding(&self, user_id: &str) -> AppResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0.0) FROM fines WHERE user_id = ?1 AND paid = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Total unpaid amount across all users
    pub async fn sum_unpaid_total(&self) -> AppResult<f64> {
        let total: f64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM fines WHERE paid = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    /// Insert a new fine
    pub async fn create(&self, tx: &mut Transaction<'_, Sqlite>, fine: &Fine) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fines (id, user_id, loan_id, amount, paid, reason, created_at, paid_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&fine.id)
        .bind(&fine.user_id)
        .bind(&fine.loan_id)
        .bind(fine.amount)
        .bind(fine.paid)
        .bind(&fine.reason)
        .bind(fine.created_at)
        .bind(fine.paid_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
