//! Borrow request ledger

use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        borrow_request::{BorrowRequest, BorrowRequestDetails, RequestStatus},
        profile::ProfileSummary,
    },
};

#[derive(Clone)]
pub struct BorrowRequestsRepository {
    pool: Pool<Sqlite>,
}

impl BorrowRequestsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get request by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", id)))
    }

    /// List requests, optionally filtered by user and/or status
    pub async fn list(
        &self,
        user_id: Option<&str>,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<BorrowRequest>> {
        let requests = sqlx::query_as::<_, BorrowRequest>(
            r#"
            SELECT * FROM borrow_requests
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY request_date DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// List requests joined with book and requester for the staff queue
    pub async fn list_with_details(
        &self,
        user_id: Option<&str>,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<BorrowRequestDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.status, r.request_date, r.processed_date, r.processed_by, r.notes,
                   b.id as book_id, b.title, b.author, b.isbn,
                   p.id as requester_id, p.full_name, p.email
            FROM borrow_requests r
            JOIN books b ON r.book_id = b.id
            LEFT JOIN profiles p ON r.user_id = p.id
            WHERE (?1 IS NULL OR r.user_id = ?1)
              AND (?2 IS NULL OR r.status = ?2)
            ORDER BY r.request_date DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            let requester_id: Option<String> = row.get("requester_id");
            result.push(BorrowRequestDetails {
                id: row.get("id"),
                status: row.get("status"),
                request_date: row.get("request_date"),
                processed_date: row.get("processed_date"),
                processed_by: row.get("processed_by"),
                notes: row.get("notes"),
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    isbn: row.get("isbn"),
                },
                requester: requester_id.map(|id| ProfileSummary {
                    id,
                    full_name: row.get("full_name"),
                    email: row.get("email"),
                }),
            });
        }

        Ok(result)
    }

    /// Insert a new request
    pub async fn create(&self, request: &BorrowRequest) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO borrow_requests (
                id, user_id, book_id, status, request_date,
                processed_date, processed_by, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(&request.book_id)
        .bind(request.status)
        .bind(request.request_date)
        .bind(request.processed_date)
        .bind(&request.processed_by)
        .bind(&request.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a request inside an open circulation transaction
    pub async fn get_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> AppResult<Option<BorrowRequest>> {
        let request =
            sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(request)
    }

    /// Move a request to its terminal state
    pub async fn mark_processed(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        status: RequestStatus,
        processed_date: DateTime<Utc>,
        processed_by: &str,
        notes: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE borrow_requests
            SET status = ?2, processed_date = ?3, processed_by = ?4, notes = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(processed_date)
        .bind(processed_by)
        .bind(notes)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
