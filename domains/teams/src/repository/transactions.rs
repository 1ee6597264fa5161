//! Transactional write helpers
//!
//! Free functions over `&mut Transaction` for the mutations that must be
//! atomic: team creation with its owner membership, team deletion with
//! its dependents, and invitation acceptance.

use postdeck_common::RepositoryError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Membership, Team};

pub async fn create_team_tx(
    tx: &mut Transaction<'_, Postgres>,
    team: &Team,
) -> Result<Team, RepositoryError> {
    let created = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams
            (id, name, description, owner_id, billing_plan, posts_used_this_month,
             post_limit_per_month, billing_period_start, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, name, description, owner_id, billing_plan, posts_used_this_month,
                  post_limit_per_month, billing_period_start, created_at, updated_at
        "#,
    )
    .bind(team.id)
    .bind(&team.name)
    .bind(&team.description)
    .bind(team.owner_id)
    .bind(team.billing_plan)
    .bind(team.posts_used_this_month)
    .bind(team.post_limit_per_month)
    .bind(team.billing_period_start)
    .bind(team.created_at)
    .bind(team.updated_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(super::map_constraint_err)?;
    Ok(created)
}

pub async fn create_membership_tx(
    tx: &mut Transaction<'_, Postgres>,
    membership: &Membership,
) -> Result<Membership, RepositoryError> {
    let created = sqlx::query_as::<_, Membership>(
        r#"
        INSERT INTO memberships (id, team_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, team_id, user_id, role, joined_at
        "#,
    )
    .bind(membership.id)
    .bind(membership.team_id)
    .bind(membership.user_id)
    .bind(membership.role)
    .bind(membership.joined_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(super::map_constraint_err)?;
    Ok(created)
}

/// Accept an invitation: create the membership and flip the row to
/// accepted in one transaction. The status update is guarded on
/// `pending` so a concurrent accept loses cleanly with `NotFound`.
pub async fn accept_invitation_tx(
    tx: &mut Transaction<'_, Postgres>,
    invitation_id: Uuid,
    membership: &Membership,
) -> Result<Membership, RepositoryError> {
    let created = create_membership_tx(tx, membership).await?;

    let result = sqlx::query(
        "UPDATE invitations SET status = 'accepted' WHERE id = $1 AND status = 'pending'",
    )
    .bind(invitation_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(created)
}

pub async fn delete_memberships_for_team_tx(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM memberships WHERE team_id = $1")
        .bind(team_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_invitations_for_team_tx(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM invitations WHERE team_id = $1")
        .bind(team_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_team_tx(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(team_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
