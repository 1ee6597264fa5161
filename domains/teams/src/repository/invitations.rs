//! Invitation repository

use chrono::{DateTime, Utc};
use postdeck_common::RepositoryError;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Invitation, InvitationStatus, InviteRole};

const INVITATION_COLUMNS: &str =
    "id, team_id, invited_by, email, role, status, token, expires_at, created_at";

/// Invitation row joined with the inviter's profile, for the admin list
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvitationWithInviter {
    pub id: Uuid,
    pub team_id: Uuid,
    pub invited_by: Uuid,
    pub email: String,
    pub role: InviteRole,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub inviter_email: String,
    pub inviter_first_name: Option<String>,
    pub inviter_last_name: Option<String>,
}

#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Invitation>, RepositoryError> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, RepositoryError> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    /// Pending invitation for this team and email, if one exists.
    /// At most one can exist; the partial unique index enforces it.
    pub async fn find_pending_by_team_and_email(
        &self,
        team_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, RepositoryError> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS} FROM invitations
            WHERE team_id = $1 AND lower(email) = lower($2) AND status = 'pending'
            "#
        ))
        .bind(team_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    /// List a team's invitations, newest first, optionally filtered by
    /// stored status. Statuses are as stored; expiry is applied lazily
    /// elsewhere, so a listed "pending" row may already be past deadline.
    pub async fn find_by_team(
        &self,
        team_id: Uuid,
        status: Option<InvitationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvitationWithInviter>, RepositoryError> {
        let invitations = sqlx::query_as::<_, InvitationWithInviter>(
            r#"
            SELECT i.id, i.team_id, i.invited_by, i.email, i.role, i.status,
                   i.expires_at, i.created_at,
                   u.email AS inviter_email,
                   u.first_name AS inviter_first_name,
                   u.last_name AS inviter_last_name
            FROM invitations i
            JOIN users u ON u.id = i.invited_by
            WHERE i.team_id = $1 AND ($2::invitation_status IS NULL OR i.status = $2)
            ORDER BY i.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(team_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }

    /// Insert a new invitation. A concurrent pending invitation for the
    /// same team and email surfaces as `AlreadyExists` via the partial
    /// unique index.
    pub async fn create(&self, invitation: &Invitation) -> Result<Invitation, RepositoryError> {
        let created = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations
                (id, team_id, invited_by, email, role, status, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(invitation.id)
        .bind(invitation.team_id)
        .bind(invitation.invited_by)
        .bind(&invitation.email)
        .bind(invitation.role)
        .bind(invitation.status)
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(super::map_constraint_err)?;
        Ok(created)
    }

    /// Mark a pending invitation declined.
    pub async fn mark_declined(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.set_status_from_pending(id, InvitationStatus::Declined)
            .await
    }

    /// Record lazy expiry of a pending invitation.
    pub async fn mark_expired(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.set_status_from_pending(id, InvitationStatus::Expired)
            .await
    }

    async fn set_status_from_pending(
        &self,
        id: Uuid,
        status: InvitationStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE invitations SET status = $2 WHERE id = $1 AND status = 'pending'")
                .bind(id)
                .bind(status)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Persist a resend: new token, new deadline, status back to pending.
    pub async fn update_for_resend(
        &self,
        invitation: &Invitation,
    ) -> Result<Invitation, RepositoryError> {
        let updated = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations SET status = $2, token = $3, expires_at = $4
            WHERE id = $1
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(invitation.id)
        .bind(invitation.status)
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(updated)
    }

    /// Hard-delete an invitation (cancel removes the row entirely).
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
