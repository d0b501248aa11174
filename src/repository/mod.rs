//! Repository layer for database operations

pub mod books;
pub mod borrow_requests;
pub mod fines;
pub mod loans;
pub mod profiles;
pub mod settings;

use sqlx::{migrate::Migrator, Pool, Sqlite};

/// Embedded schema migrations, applied at startup and in tests
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: books::BooksRepository,
    pub profiles: profiles::ProfilesRepository,
    pub borrow_requests: borrow_requests::BorrowRequestsRepository,
    pub loans: loans::LoansRepository,
    pub fines: fines::FinesRepository,
    pub settings: settings::SettingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            profiles: profiles::ProfilesRepository::new(pool.clone()),
            borrow_requests: borrow_requests::BorrowRequestsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            settings: settings::SettingsRepository::new(pool.clone()),
            pool,
        }
    }
}
