//! Circulation engine
//!
//! Orchestrates the borrow-request -> loan -> return -> fine lifecycle across
//! the catalog and the three ledgers. This is the sole writer of request
//! status, loan status, fines and book availability; every mutating
//! operation runs as a single transaction so no partial transition can
//! survive a failure.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, RequestStatus},
        fine::Fine,
        loan::{Loan, LoanDetails, LoanStatus},
    },
    repository::Repository,
    services::settings::SettingsService,
};

const MS_PER_DAY: i64 = 86_400_000;

/// Result of returning a loan
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub loan: Loan,
    /// Present only when the loan came back overdue
    pub fine: Option<Fine>,
}

/// Aggregate counts for the staff/admin dashboards
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardCounts {
    pub total_books: i64,
    pub pending_requests: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub unpaid_fines_total: f64,
}

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    settings: SettingsService,
}

impl CirculationService {
    pub fn new(repository: Repository, settings: SettingsService) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Submit a borrow request for a book
    ///
    /// Availability is deliberately not checked here: a request may be
    /// submitted for a book with no free copies and is re-checked at
    /// approval time. Duplicate pending requests are also allowed.
    pub async fn submit_borrow_request(
        &self,
        user_id: &str,
        book_id: &str,
    ) -> AppResult<BorrowRequest> {
        // Book must exist; the requester is deliberately not checked
        self.repository.books.get_by_id(book_id).await?;

        let request = BorrowRequest {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            status: RequestStatus::Pending,
            request_date: Utc::now(),
            processed_date: None,
            processed_by: None,
            notes: None,
        };

        self.repository.borrow_requests.create(&request).await?;
        tracing::info!(request_id = %request.id, book_id, "borrow request submitted");
        Ok(request)
    }

    /// Approve a pending request, creating a loan and taking one copy
    ///
    /// All sub-writes (copy decrement, loan insert, request update) commit
    /// together or not at all. When no copy is available the request stays
    /// PENDING rather than being auto-rejected.
    pub async fn approve_borrow_request(
        &self,
        request_id: &str,
        staff_id: &str,
    ) -> AppResult<Loan> {
        // Settings snapshot, taken before the transaction opens
        let loan_period_days = self.settings.loan_period_days().await?;

        let mut tx = self.repository.pool.begin().await?;

        let request = self
            .repository
            .borrow_requests
            .get_in_tx(&mut tx, request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Borrow request with id {} not found", request_id))
            })?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Request {} has already been processed",
                request_id
            )));
        }

        self.repository
            .books
            .get_in_tx(&mut tx, &request.book_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with id {} not found", request.book_id))
            })?;

        // The guarded decrement is what makes concurrent approvals of the
        // last copy resolve to exactly one winner.
        if !self
            .repository
            .books
            .reserve_copy(&mut tx, &request.book_id)
            .await?
        {
            return Err(AppError::Capacity("No copies available".to_string()));
        }

        let now = Utc::now();
        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id.clone(),
            book_id: request.book_id.clone(),
            checkout_date: now,
            due_date: now + Duration::days(loan_period_days),
            return_date: None,
            status: LoanStatus::Active,
            renewed_count: 0,
            checked_out_by: Some(staff_id.to_string()),
        };
        self.repository.loans.create(&mut tx, &loan).await?;

        self.repository
            .borrow_requests
            .mark_processed(&mut tx, request_id, RequestStatus::Approved, now, staff_id, None)
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id,
            loan_id = %loan.id,
            due_date = %loan.due_date,
            "borrow request approved"
        );
        Ok(loan)
    }

    /// Reject a pending request with a reason
    pub async fn reject_borrow_request(
        &self,
        request_id: &str,
        staff_id: &str,
        reason: &str,
    ) -> AppResult<BorrowRequest> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "Rejection reason must not be empty".to_string(),
            ));
        }

        let mut tx = self.repository.pool.begin().await?;

        let mut request = self
            .repository
            .borrow_requests
            .get_in_tx(&mut tx, request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Borrow request with id {} not found", request_id))
            })?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Request {} has already been processed",
                request_id
            )));
        }

        let now = Utc::now();
        self.repository
            .borrow_requests
            .mark_processed(
                &mut tx,
                request_id,
                RequestStatus::Rejected,
                now,
                staff_id,
                Some(reason),
            )
            .await?;

        tx.commit().await?;

        request.status = RequestStatus::Rejected;
        request.processed_date = Some(now);
        request.processed_by = Some(staff_id.to_string());
        request.notes = Some(reason.to_string());

        tracing::info!(request_id, "borrow request rejected");
        Ok(request)
    }

    /// Return a loan, releasing the copy and assessing a fine when overdue
    pub async fn return_loan(&self, loan_id: &str) -> AppResult<ReturnOutcome> {
        // Settings snapshot, taken before the transaction opens
        let fine_rate = self.settings.fine_rate_per_day().await?;

        let mut tx = self.repository.pool.begin().await?;

        let mut loan = self
            .repository
            .loans
            .get_in_tx(&mut tx, loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.status == LoanStatus::Returned {
            return Err(AppError::InvalidState(format!(
                "Loan {} has already been returned",
                loan_id
            )));
        }

        self.repository
            .books
            .get_in_tx(&mut tx, &loan.book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", loan.book_id)))?;

        let now = Utc::now();

        // Overdue-ness is recomputed from due_date here rather than trusting
        // a stored OVERDUE status.
        let fine = if now > loan.due_date {
            let overdue_ms = (now - loan.due_date).num_milliseconds();
            let days_overdue = ((overdue_ms + MS_PER_DAY - 1) / MS_PER_DAY).max(1);
            let fine = Fine {
                id: Uuid::new_v4().to_string(),
                user_id: loan.user_id.clone(),
                loan_id: loan.id.clone(),
                amount: days_overdue as f64 * fine_rate,
                paid: false,
                reason: format!("Late return: {} day(s) overdue", days_overdue),
                created_at: now,
                paid_at: None,
            };
            self.repository.fines.create(&mut tx, &fine).await?;
            Some(fine)
        } else {
            None
        };

        self.repository.loans.mark_returned(&mut tx, loan_id, now).await?;
        self.repository.books.release_copy(&mut tx, &loan.book_id).await?;

        tx.commit().await?;

        loan.status = LoanStatus::Returned;
        loan.return_date = Some(now);

        tracing::info!(
            loan_id,
            fined = fine.is_some(),
            "loan returned"
        );
        Ok(ReturnOutcome { loan, fine })
    }

    /// Renew a loan, pushing the due date out by one loan period
    pub async fn renew_loan(&self, loan_id: &str) -> AppResult<Loan> {
        let loan_period_days = self.settings.loan_period_days().await?;
        let max_renewals = self.settings.max_renewals().await?;

        let mut tx = self.repository.pool.begin().await?;

        let mut loan = self
            .repository
            .loans
            .get_in_tx(&mut tx, loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.status == LoanStatus::Returned {
            return Err(AppError::InvalidState(
                "Cannot renew a returned loan".to_string(),
            ));
        }

        if loan.renewed_count >= max_renewals {
            return Err(AppError::Capacity(format!(
                "Maximum renewals reached ({}/{})",
                loan.renewed_count, max_renewals
            )));
        }

        let new_due_date = Utc::now() + Duration::days(loan_period_days);
        let new_count = loan.renewed_count + 1;
        self.repository
            .loans
            .renew(&mut tx, loan_id, new_due_date, new_count)
            .await?;

        tx.commit().await?;

        loan.due_date = new_due_date;
        loan.renewed_count = new_count;
        Ok(loan)
    }

    /// Loans currently out, earliest due first
    pub async fn list_active_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_active_details().await
    }

    /// Loans out past their due date as of the given instant (default now)
    pub async fn list_overdue_loans(
        &self,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<LoanDetails>> {
        self.repository
            .loans
            .list_overdue_details(as_of.unwrap_or_else(Utc::now))
            .await
    }

    /// All loans for a user
    pub async fn list_user_loans(&self, user_id: &str) -> AppResult<Vec<LoanDetails>> {
        self.repository.profiles.get_by_id(user_id).await?;
        self.repository.loans.list_user_details(user_id).await
    }

    /// Borrow requests joined with book and requester
    pub async fn list_borrow_requests(
        &self,
        user_id: Option<&str>,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<BorrowRequestDetails>> {
        self.repository
            .borrow_requests
            .list_with_details(user_id, status)
            .await
    }

    /// Fines, optionally filtered by user and paid flag
    pub async fn list_fines(
        &self,
        user_id: Option<&str>,
        paid: Option<bool>,
    ) -> AppResult<Vec<Fine>> {
        self.repository.fines.list(user_id, paid).await
    }

    /// Unpaid fines for a user
    pub async fn list_outstanding_fines(&self, user_id: &str) -> AppResult<Vec<Fine>> {
        self.repository.fines.list(Some(user_id), Some(false)).await
    }

    /// Total unpaid amount for a user
    pub async fn sum_outstanding_fines(&self, user_id: &str) -> AppResult<f64> {
        self.repository.fines.sum_outstanding(user_id).await
    }

    /// Aggregate counts for the dashboards
    pub async fn dashboard_counts(&self) -> AppResult<DashboardCounts> {
        let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.repository.pool)
            .await?;
        let pending_requests: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_requests WHERE status = 'PENDING'")
                .fetch_one(&self.repository.pool)
                .await?;

        Ok(DashboardCounts {
            total_books,
            pending_requests,
            active_loans: self.repository.loans.count_active().await?,
            overdue_loans: self.repository.loans.count_overdue(Utc::now()).await?,
            unpaid_fines_total: self.repository.fines.sum_unpaid_total().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::Book, profile::{Profile, UserRole}};
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (Repository, CirculationService) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::repository::MIGRATOR.run(&pool).await.unwrap();
        let repository = Repository::new(pool);
        let settings = SettingsService::new(repository.clone());
        let engine = CirculationService::new(repository.clone(), settings);
        (repository, engine)
    }

    async fn seed_profile(repo: &Repository, name: &str, role: UserRole) -> String {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            email: format!("{}@example.edu", name.to_lowercase().replace(' ', ".")),
            full_name: name.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        repo.profiles.create(&profile).await.unwrap();
        profile.id
    }

    async fn seed_book(repo: &Repository, total: i32, available: i32) -> String {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Uuid::new_v4().to_string(),
            description: None,
            genre: None,
            cover_image_url: None,
            total_copies: total,
            available_copies: available,
            created_at: now,
            updated_at: now,
        };
        repo.books.create(&book).await.unwrap();
        book.id
    }

    async fn seed_loan(
        repo: &Repository,
        user_id: &str,
        book_id: &str,
        due_date: DateTime<Utc>,
    ) -> String {
        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            checkout_date: due_date - Duration::days(14),
            due_date,
            return_date: None,
            status: LoanStatus::Active,
            renewed_count: 0,
            checked_out_by: None,
        };
        let mut tx = repo.pool.begin().await.unwrap();
        repo.loans.create(&mut tx, &loan).await.unwrap();
        tx.commit().await.unwrap();
        loan.id
    }

    #[tokio::test]
    async fn submit_creates_pending_request() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 2, 2).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.processed_date.is_none());
        assert!(request.processed_by.is_none());
    }

    #[tokio::test]
    async fn submit_for_missing_book_is_not_found() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;

        let err = engine
            .submit_borrow_request(&student, "no-such-book")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn submit_allows_unavailable_book_and_duplicates() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;

        engine.submit_borrow_request(&student, &book).await.unwrap();
        engine.submit_borrow_request(&student, &book).await.unwrap();

        let pending = repo
            .borrow_requests
            .list(Some(&student), Some(RequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn approve_creates_loan_and_takes_a_copy() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 2, 2).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        let loan = engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap();

        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.renewed_count, 0);
        assert_eq!(loan.checked_out_by.as_deref(), Some(staff.as_str()));
        // Default loan period of 14 days
        assert_eq!((loan.due_date - loan.checkout_date).num_days(), 14);

        let updated_book = repo.books.get_by_id(&book).await.unwrap();
        assert_eq!(updated_book.available_copies, 1);

        let processed = repo.borrow_requests.get_by_id(&request.id).await.unwrap();
        assert_eq!(processed.status, RequestStatus::Approved);
        assert_eq!(processed.processed_by.as_deref(), Some(staff.as_str()));
        assert!(processed.processed_date.is_some());
    }

    #[tokio::test]
    async fn approve_honours_configured_loan_period() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 1, 1).await;
        repo.settings
            .upsert("loan_period_days", "7", None)
            .await
            .unwrap();

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        let loan = engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap();
        assert_eq!((loan.due_date - loan.checkout_date).num_days(), 7);
    }

    #[tokio::test]
    async fn approve_without_copies_leaves_request_pending() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 2, 0).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        let err = engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Capacity(_)));

        // The request survives for a later attempt, and nothing was written
        let untouched = repo.borrow_requests.get_by_id(&request.id).await.unwrap();
        assert_eq!(untouched.status, RequestStatus::Pending);
        assert_eq!(repo.loans.count_active().await.unwrap(), 0);
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 0);
    }

    #[tokio::test]
    async fn approve_missing_request_or_book_is_not_found() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;

        let err = engine
            .approve_borrow_request("no-such-request", &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let book = seed_book(&repo, 1, 1).await;
        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        repo.books.delete(&book).await.unwrap();

        let err = engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn approve_is_rejected_on_processed_request() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 2, 2).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap();

        let err = engine
            .approve_borrow_request(&request.id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // The double approval must not have taken a second copy
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn concurrent_approvals_of_last_copy_yield_one_winner() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 1, 1).await;

        let r1 = engine.submit_borrow_request(&student, &book).await.unwrap();
        let r2 = engine.submit_borrow_request(&student, &book).await.unwrap();

        let (a, b) = tokio::join!(
            engine.approve_borrow_request(&r1.id, &staff),
            engine.approve_borrow_request(&r2.id, &staff),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(loser, AppError::Capacity(_)));
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 0);
    }

    #[tokio::test]
    async fn reject_requires_a_reason() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 1, 1).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        let err = engine
            .reject_borrow_request(&request.id, &staff, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let untouched = repo.borrow_requests.get_by_id(&request.id).await.unwrap();
        assert_eq!(untouched.status, RequestStatus::Pending);
        assert!(untouched.notes.is_none());
    }

    #[tokio::test]
    async fn reject_marks_request_with_reason() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 1, 1).await;

        let request = engine.submit_borrow_request(&student, &book).await.unwrap();
        let rejected = engine
            .reject_borrow_request(&request.id, &staff, "Damaged copy under repair")
            .await
            .unwrap();

        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.notes.as_deref(), Some("Damaged copy under repair"));

        // No book or loan mutation
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 1);
        assert_eq!(repo.loans.count_active().await.unwrap(), 0);

        let err = engine
            .reject_borrow_request(&request.id, &staff, "again")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn return_before_due_date_produces_no_fine() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;
        let loan = seed_loan(&repo, &student, &book, Utc::now() + Duration::days(3)).await;

        let outcome = engine.return_loan(&loan).await.unwrap();
        assert!(outcome.fine.is_none());
        assert_eq!(outcome.loan.status, LoanStatus::Returned);
        assert!(outcome.loan.return_date.is_some());
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn overdue_return_creates_fine_at_configured_rate() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;
        repo.settings
            .upsert("fine_rate_per_day", "0.75", None)
            .await
            .unwrap();

        // Five days late, with slack so the ceiling stays at five
        let due = Utc::now() - Duration::days(5) + Duration::seconds(30);
        let loan = seed_loan(&repo, &student, &book, due).await;

        let outcome = engine.return_loan(&loan).await.unwrap();
        let fine = outcome.fine.expect("fine expected");
        assert!((fine.amount - 3.75).abs() < 1e-9);
        assert!(fine.reason.contains("5 day(s)"));
        assert!(!fine.paid);
        assert_eq!(fine.user_id, student);
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn overdue_return_uses_default_rate_when_unset() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;

        let due = Utc::now() - Duration::days(3) + Duration::seconds(30);
        let loan = seed_loan(&repo, &student, &book, due).await;

        let outcome = engine.return_loan(&loan).await.unwrap();
        let fine = outcome.fine.expect("fine expected");
        assert!((fine.amount - 1.50).abs() < 1e-9);
        assert!(fine.reason.contains("3 day(s)"));
    }

    #[tokio::test]
    async fn any_positive_overage_counts_as_one_day() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;

        let loan = seed_loan(&repo, &student, &book, Utc::now() - Duration::minutes(30)).await;

        let outcome = engine.return_loan(&loan).await.unwrap();
        let fine = outcome.fine.expect("fine expected");
        assert!((fine.amount - 0.50).abs() < 1e-9);
        assert!(fine.reason.contains("1 day(s)"));
    }

    #[tokio::test]
    async fn returning_twice_is_rejected() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;
        let loan = seed_loan(&repo, &student, &book, Utc::now() + Duration::days(3)).await;

        engine.return_loan(&loan).await.unwrap();
        let err = engine.return_loan(&loan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // The copy must not have been released twice
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn copies_are_conserved_across_the_lifecycle() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 2, 2).await;

        let r1 = engine.submit_borrow_request(&student, &book).await.unwrap();
        let r2 = engine.submit_borrow_request(&student, &book).await.unwrap();
        let l1 = engine.approve_borrow_request(&r1.id, &staff).await.unwrap();
        engine.approve_borrow_request(&r2.id, &staff).await.unwrap();
        assert_eq!(repo.books.get_by_id(&book).await.unwrap().available_copies, 0);

        engine.return_loan(&l1.id).await.unwrap();
        let after = repo.books.get_by_id(&book).await.unwrap();
        // initial 2, minus 2 approvals, plus 1 return
        assert_eq!(after.available_copies, 1);
        assert!(after.available_copies <= after.total_copies);
    }

    #[tokio::test]
    async fn renew_extends_due_date_up_to_the_limit() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;
        let loan_id = seed_loan(&repo, &student, &book, Utc::now() + Duration::days(2)).await;

        let renewed = engine.renew_loan(&loan_id).await.unwrap();
        assert_eq!(renewed.renewed_count, 1);
        assert!((renewed.due_date - Utc::now()).num_days() >= 13);

        engine.renew_loan(&loan_id).await.unwrap();
        let err = engine.renew_loan(&loan_id).await.unwrap_err();
        assert!(matches!(err, AppError::Capacity(_)));
    }

    #[tokio::test]
    async fn renew_of_returned_loan_is_rejected() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 1, 0).await;
        let loan_id = seed_loan(&repo, &student, &book, Utc::now() + Duration::days(2)).await;

        engine.return_loan(&loan_id).await.unwrap();
        let err = engine.renew_loan(&loan_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn active_loans_are_sorted_by_due_date() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 3, 0).await;

        let due_mid = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let due_first = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let due_last = Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap();
        seed_loan(&repo, &student, &book, due_mid).await;
        seed_loan(&repo, &student, &book, due_first).await;
        seed_loan(&repo, &student, &book, due_last).await;

        let loans = engine.list_active_loans().await.unwrap();
        let due_dates: Vec<_> = loans.iter().map(|l| l.due_date).collect();
        assert_eq!(due_dates, vec![due_first, due_mid, due_last]);
        assert!(loans.iter().all(|l| l.is_overdue));
    }

    #[tokio::test]
    async fn overdue_view_filters_by_cutoff() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let book = seed_book(&repo, 2, 0).await;

        let past = seed_loan(&repo, &student, &book, Utc::now() - Duration::days(1)).await;
        seed_loan(&repo, &student, &book, Utc::now() + Duration::days(7)).await;

        let overdue = engine.list_overdue_loans(None).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, past);
        assert!(overdue[0].is_overdue);

        // A returned loan drops out of the overdue view
        engine.return_loan(&past).await.unwrap();
        assert!(engine.list_overdue_loans(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outstanding_fines_exclude_paid_and_other_users() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let other = seed_profile(&repo, "Duncan Idaho", UserRole::Student).await;
        let book = seed_book(&repo, 3, 0).await;

        let due = Utc::now() - Duration::days(2) + Duration::seconds(30);
        let l1 = seed_loan(&repo, &student, &book, due).await;
        let l2 = seed_loan(&repo, &student, &book, due).await;
        let l3 = seed_loan(&repo, &other, &book, due).await;
        engine.return_loan(&l1).await.unwrap();
        engine.return_loan(&l2).await.unwrap();
        engine.return_loan(&l3).await.unwrap();

        // Settle one of the student's fines directly in the ledger
        let student_fines = engine.list_outstanding_fines(&student).await.unwrap();
        assert_eq!(student_fines.len(), 2);
        sqlx::query("UPDATE fines SET paid = 1, paid_at = ?2 WHERE id = ?1")
            .bind(&student_fines[0].id)
            .bind(Utc::now())
            .execute(&repo.pool)
            .await
            .unwrap();

        let remaining = engine.list_outstanding_fines(&student).await.unwrap();
        assert_eq!(remaining.len(), 1);
        let total = engine.sum_outstanding_fines(&student).await.unwrap();
        assert!((total - 1.0).abs() < 1e-9); // 2 days x 0.50
    }

    #[tokio::test]
    async fn dashboard_counts_reflect_state() {
        let (repo, engine) = setup().await;
        let student = seed_profile(&repo, "Paul Atreides", UserRole::Student).await;
        let staff = seed_profile(&repo, "Gurney Halleck", UserRole::Staff).await;
        let book = seed_book(&repo, 2, 2).await;

        let r1 = engine.submit_borrow_request(&student, &book).await.unwrap();
        engine.submit_borrow_request(&student, &book).await.unwrap();
        engine.approve_borrow_request(&r1.id, &staff).await.unwrap();

        let counts = engine.dashboard_counts().await.unwrap();
        assert_eq!(counts.total_books, 1);
        assert_eq!(counts.pending_requests, 1);
        assert_eq!(counts.active_loans, 1);
        assert_eq!(counts.overdue_loans, 0);
        assert!((counts.unpaid_fines_total - 0.0).abs() < 1e-9);
    }
}
