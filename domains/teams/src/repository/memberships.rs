//! Membership repository
//!
//! Also hosts [`MembershipRepository::require_role`], the single
//! authorization guard every team-scoped handler goes through.

use chrono::{DateTime, Utc};
use postdeck_common::{Error, RepositoryError};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{BillingPlan, Membership, TeamRole};

const MEMBERSHIP_COLUMNS: &str = "id, team_id, user_id, role, joined_at";

/// Membership row joined with the member's user profile
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MembershipWithUser {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub user_email: String,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_image_url: Option<String>,
}

/// Team row joined with the caller's role in it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamWithRole {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub billing_plan: BillingPlan,
    pub posts_used_this_month: i32,
    pub post_limit_per_month: i32,
    pub billing_period_start: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role: TeamRole,
}

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_team_and_user(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, RepositoryError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE team_id = $1 AND user_id = $2"
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    /// Authorization guard: the user must be a member of the team with at
    /// least `min_role` privilege. Non-members and under-privileged
    /// members both get `ACCESS_DENIED`, so outsiders cannot distinguish
    /// "not a member" from "not privileged enough".
    pub async fn require_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        min_role: TeamRole,
    ) -> Result<Membership, Error> {
        let membership = self
            .get_by_team_and_user(team_id, user_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| {
                Error::AccessDenied("You are not a member of this team".to_string())
            })?;

        if membership.role.rank() < min_role.rank() {
            return Err(Error::AccessDenied(format!(
                "This action requires the {} role",
                min_role
            )));
        }

        Ok(membership)
    }

    /// List members with their profiles, owner first, then by join date.
    pub async fn find_by_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<MembershipWithUser>, RepositoryError> {
        let members = sqlx::query_as::<_, MembershipWithUser>(
            r#"
            SELECT m.id, m.team_id, m.user_id, m.role, m.joined_at,
                   u.email AS user_email,
                   u.first_name AS user_first_name,
                   u.last_name AS user_last_name,
                   u.image_url AS user_image_url
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY CASE m.role
                         WHEN 'owner' THEN 0
                         WHEN 'admin' THEN 1
                         ELSE 2
                     END,
                     m.joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Teams the user belongs to, with their role in each.
    pub async fn find_teams_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<TeamWithRole>, RepositoryError> {
        let teams = sqlx::query_as::<_, TeamWithRole>(
            r#"
            SELECT t.id, t.name, t.description, t.owner_id, t.billing_plan,
                   t.posts_used_this_month, t.post_limit_per_month,
                   t.billing_period_start, t.created_at, t.updated_at,
                   m.role
            FROM memberships m
            JOIN teams t ON t.id = m.team_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    pub async fn update_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Membership, RepositoryError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships SET role = $3
            WHERE team_id = $1 AND user_id = $2
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(membership)
    }

    pub async fn delete(&self, team_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM memberships WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
