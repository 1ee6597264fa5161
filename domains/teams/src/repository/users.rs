//! User repository

use postdeck_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::User;

const USER_COLUMNS: &str =
    "id, external_id, email, first_name, last_name, image_url, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Case-insensitive email lookup, used to match invitees to accounts.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert or refresh a user row from identity-provider claims.
    ///
    /// Keyed on `external_id`; the only write path that creates users.
    pub async fn upsert(
        &self,
        external_id: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, external_id, email, first_name, last_name, image_url)
            VALUES ($1, $2, lower($3), $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE SET
                email = lower($3),
                first_name = COALESCE($4, users.first_name),
                last_name = COALESCE($5, users.last_name),
                image_url = COALESCE($6, users.image_url),
                updated_at = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(external_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(super::map_constraint_err)?;
        Ok(user)
    }

    /// Update profile fields, leaving absent fields untouched.
    pub async fn update_profile(
        &self,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                image_url = COALESCE($4, image_url),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
