//! Team management API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use postdeck_auth::{AuthUser, MaybeAuthUser};
use postdeck_common::{Error, RepositoryError, Result, ValidatedJson};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::{BillingPlan, Membership, Team, TeamRole};
use crate::repository::{
    create_membership_tx, create_team_tx, delete_invitations_for_team_tx,
    delete_memberships_for_team_tx, delete_team_tx, TeamWithRole,
};

/// Request for creating a team
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Request for updating a team. Absent fields are left untouched;
/// an explicit `"description": null` clears the description.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    // Outer None = field absent, Some(None) = explicit null
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub description: Option<Option<String>>,
}

/// Keeps an explicit JSON `null` distinguishable from an absent field.
fn deserialize_explicit_null<'de, T, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response for team operations
#[derive(Debug, Serialize)]
pub struct TeamResponse {
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
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            description: team.description,
            owner_id: team.owner_id,
            billing_plan: team.billing_plan,
            posts_used_this_month: team.posts_used_this_month,
            post_limit_per_month: team.post_limit_per_month,
            billing_period_start: team.billing_period_start,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

/// Team plus the caller's role in it, for the team list
#[derive(Debug, Serialize)]
pub struct TeamWithRoleResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub role: TeamRole,
}

impl From<TeamWithRole> for TeamWithRoleResponse {
    fn from(t: TeamWithRole) -> Self {
        Self {
            team: TeamResponse {
                id: t.id,
                name: t.name,
                description: t.description,
                owner_id: t.owner_id,
                billing_plan: t.billing_plan,
                posts_used_this_month: t.posts_used_this_month,
                post_limit_per_month: t.post_limit_per_month,
                billing_period_start: t.billing_period_start,
                created_at: t.created_at,
                updated_at: t.updated_at,
            },
            role: t.role,
        }
    }
}

/// Create a team
///
/// **POST /v1/teams**
///
/// Creates the team and the caller's owner membership atomically.
pub async fn create_team(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>)> {
    let team = Team::new(request.name, request.description, user.id)?;
    let membership = Membership::new(team.id, user.id, TeamRole::Owner);

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let created = create_team_tx(&mut tx, &team).await.map_err(|e| match e {
        RepositoryError::AlreadyExists => {
            Error::Conflict("A team with this name already exists".to_string())
        }
        other => Error::from(other),
    })?;

    create_membership_tx(&mut tx, &membership)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create owner membership: {}", e)))?;

    // Explicit commit; drop without commit = rollback
    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(team_id = %created.id, owner_id = %user.id, "Team created");

    Ok((StatusCode::CREATED, Json(TeamResponse::from(created))))
}

/// List the caller's teams
///
/// **GET /v1/teams**
///
/// Returns every team the caller belongs to, with their role in each.
/// Anonymous callers and sessions without a synced account get an empty
/// list rather than an error.
pub async fn list_teams(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<TeamWithRoleResponse>>> {
    let Some(user) = user else {
        return Ok(Json(Vec::new()));
    };

    let teams = state.repos.memberships.find_teams_for_user(user.id).await?;

    Ok(Json(teams.into_iter().map(TeamWithRoleResponse::from).collect()))
}

/// Get a team
///
/// **GET /v1/teams/{team_id}**
///
/// Any member of the team can view it.
pub async fn get_team(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamResponse>> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Member)
        .await?;

    let team = state
        .repos
        .teams
        .find(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;

    Ok(Json(TeamResponse::from(team)))
}

/// Update a team's name or description
///
/// **PATCH /v1/teams/{team_id}**
///
/// Requires the admin role or above.
pub async fn update_team(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Admin)
        .await?;

    if let Some(name) = &request.name {
        Team::validate_name(name)?;
    }
    if let Some(Some(description)) = &request.description {
        Team::validate_description(description)?;
    }

    let updated = state
        .repos
        .teams
        .update(
            team_id,
            request.name.as_deref().map(str::trim),
            request.description.as_ref().map(|d| d.as_deref().map(str::trim)),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::AlreadyExists => {
                Error::Conflict("A team with this name already exists".to_string())
            }
            other => Error::from(other),
        })?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;

    Ok(Json(TeamResponse::from(updated)))
}

/// Delete a team
///
/// **DELETE /v1/teams/{team_id}**
///
/// Owner only. Removes memberships and invitations with the team in one
/// transaction.
pub async fn delete_team(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Owner)
        .await?;

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    delete_memberships_for_team_tx(&mut tx, team_id)
        .await
        .map_err(|e| Error::Internal(format!("Failed to delete memberships: {}", e)))?;

    delete_invitations_for_team_tx(&mut tx, team_id)
        .await
        .map_err(|e| Error::Internal(format!("Failed to delete invitations: {}", e)))?;

    delete_team_tx(&mut tx, team_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => Error::NotFound("Team not found".to_string()),
            other => Error::Internal(format!("Failed to delete team: {}", other)),
        })?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(team_id = %team_id, deleted_by = %user.id, "Team deleted");

    Ok(StatusCode::NO_CONTENT)
}
