//! Profiles repository for user database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::profile::Profile,
};

#[derive(Clone)]
pub struct ProfilesRepository {
    pool: Pool<Sqlite>,
}

impl ProfilesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get profile by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get profile by email
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    /// List all profiles
    pub async fn list(&self) -> AppResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY full_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    /// Insert a new profile
    pub async fn create(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write back a full profile row
    pub async fn update(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE profiles SET email = ?2, full_name = ?3, role = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a profile, returns false when it did not exist
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
