//! Team repository

use postdeck_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Team;

const TEAM_COLUMNS: &str = "id, name, description, owner_id, billing_plan, \
     posts_used_this_month, post_limit_per_month, billing_period_start, created_at, updated_at";

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Team>, RepositoryError> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    /// Update name and/or description. Absent fields are left untouched.
    /// `Some(None)` for the description clears it.
    ///
    /// Surfaces a name collision as `AlreadyExists`.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> Result<Option<Team>, RepositoryError> {
        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams SET
                name = COALESCE($2, name),
                description = CASE WHEN $4 THEN $3 ELSE description END,
                updated_at = now()
            WHERE id = $1
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(description.flatten())
        .bind(description.is_some())
        .fetch_optional(&self.pool)
        .await
        .map_err(super::map_constraint_err)?;
        Ok(team)
    }
}
