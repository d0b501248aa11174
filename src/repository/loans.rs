//! Loan ledger

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite, Transaction};

use crate::{
    error::AppResult,
    models::{
        book::BookSummary,
        loan::{Loan, LoanDetails, LoanStatus},
        profile::ProfileSummary,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.checkout_date, l.due_date, l.return_date, l.status, l.renewed_count,
           b.id as book_id, b.title, b.author, b.isbn,
           p.id as borrower_id, p.full_name, p.email
    FROM loans l
    JOIN books b ON l.book_id = b.id
    LEFT JOIN profiles p ON l.user_id = p.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Loans that are out (ACTIVE or stored OVERDUE), earliest due first.
    /// The ordering is a user-facing contract for the staff triage queue.
    pub async fn list_active_details(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.status IN ('ACTIVE', 'OVERDUE') ORDER BY l.due_date",
            DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| map_details(row, now)).collect())
    }

    /// Loans out past their due date as of the given instant
    pub async fn list_overdue_details(
        &self,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.status IN ('ACTIVE', 'OVERDUE') AND l.due_date < ?1 ORDER BY l.due_date",
            DETAILS_SELECT
        ))
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| map_details(row, as_of)).collect())
    }

    /// All loans for a user, most recent checkout first
    pub async fn list_user_details(&self, user_id: &str) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.user_id = ?1 ORDER BY l.checkout_date DESC",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| map_details(row, now)).collect())
    }

    /// Count loans currently out
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE status IN ('ACTIVE', 'OVERDUE')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count loans out past their due date
    pub async fn count_overdue(&self, as_of: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE status IN ('ACTIVE', 'OVERDUE') AND due_date < ?1",
        )
        .bind(as_of)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Fetch a loan inside an open circulation transaction
    pub async fn get_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(loan)
    }

    /// Insert a new loan
    pub async fn create(&self, tx: &mut Transaction<'_, Sqlite>, loan: &Loan) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, user_id, book_id, checkout_date, due_date, return_date,
                status, renewed_count, checked_out_by
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.user_id)
        .bind(&loan.book_id)
        .bind(loan.checkout_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status)
        .bind(loan.renewed_count)
        .bind(&loan.checked_out_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Move a loan to its terminal RETURNED state
    pub async fn mark_returned(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE loans SET status = 'RETURNED', return_date = ?2 WHERE id = ?1")
            .bind(id)
            .bind(returned_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Extend a loan's due date and bump its renewal counter
    pub async fn renew(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        new_due_date: DateTime<Utc>,
        renewed_count: i32,
    ) -> AppResult<()> {
        sqlx::query("UPDATE loans SET due_date = ?2, renewed_count = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_due_date)
            .bind(renewed_count)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

fn map_details(row: SqliteRow, now: DateTime<Utc>) -> LoanDetails {
    let status: LoanStatus = row.get("status");
    let due_date: DateTime<Utc> = row.get("due_date");
    let borrower_id: Option<String> = row.get("borrower_id");

    LoanDetails {
        id: row.get("id"),
        checkout_date: row.get("checkout_date"),
        due_date,
        return_date: row.get("return_date"),
        status,
        renewed_count: row.get("renewed_count"),
        is_overdue: status != LoanStatus::Returned && due_date < now,
        book: BookSummary {
            id: row.get("book_id"),
            title: row.get("title"),
            author: row.get("author"),
            isbn: row.get("isbn"),
        },
        borrower: borrower_id.map(|id| ProfileSummary {
            id,
            full_name: row.get("full_name"),
            email: row.get("email"),
        }),
    }
}
