//! User profile service
//!
//! CRUD over profiles. Authentication and session handling are deliberately
//! absent; profiles exist as a foreign-key source for requests, loans and
//! fines.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::profile::{CreateProfile, Profile, UpdateProfile},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all profiles
    pub async fn list_users(&self) -> AppResult<Vec<Profile>> {
        self.repository.profiles.list().await
    }

    /// Get a profile by ID
    pub async fn get_user(&self, id: &str) -> AppResult<Profile> {
        self.repository.profiles.get_by_id(id).await
    }

    /// Create a profile
    pub async fn create_user(&self, create: CreateProfile) -> AppResult<Profile> {
        create
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .repository
            .profiles
            .find_by_email(&create.email)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(format!(
                "A user with email {} already exists",
                create.email
            )));
        }

        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            email: create.email,
            full_name: create.full_name,
            role: create.role,
            created_at: now,
            updated_at: now,
        };

        self.repository.profiles.create(&profile).await?;
        Ok(profile)
    }

    /// Apply a partial update to a profile
    pub async fn update_user(&self, id: &str, update: UpdateProfile) -> AppResult<Profile> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut profile = self.repository.profiles.get_by_id(id).await?;

        if let Some(email) = update.email {
            if email != profile.email
                && self.repository.profiles.find_by_email(&email).await?.is_some()
            {
                return Err(AppError::Validation(format!(
                    "A user with email {} already exists",
                    email
                )));
            }
            profile.email = email;
        }
        if let Some(full_name) = update.full_name {
            profile.full_name = full_name;
        }
        if let Some(role) = update.role {
            profile.role = role;
        }

        profile.updated_at = Utc::now();
        self.repository.profiles.update(&profile).await?;
        Ok(profile)
    }

    /// Delete a profile
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        if !self.repository.profiles.delete(id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::UserRole;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn service() -> UsersService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::repository::MIGRATOR.run(&pool).await.unwrap();
        UsersService::new(Repository::new(pool))
    }

    #[tokio::test]
    async fn create_and_fetch_roundtrip() {
        let users = service().await;
        let created = users
            .create_user(CreateProfile {
                email: "ada@example.edu".to_string(),
                full_name: "Ada Lovelace".to_string(),
                role: UserRole::Student,
            })
            .await
            .unwrap();

        let fetched = users.get_user(&created.id).await.unwrap();
        assert_eq!(fetched.email, "ada@example.edu");
        assert_eq!(fetched.role, UserRole::Student);
    }

    #[tokio::test]
    async fn create_rejects_bad_email() {
        let users = service().await;
        let err = users
            .create_user(CreateProfile {
                email: "not-an-email".to_string(),
                full_name: "Someone".to_string(),
                role: UserRole::Staff,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let users = service().await;
        let create = || CreateProfile {
            email: "dup@example.edu".to_string(),
            full_name: "First".to_string(),
            role: UserRole::Student,
        };
        users.create_user(create()).await.unwrap();
        let err = users.create_user(create()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
