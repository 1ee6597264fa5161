//! Team membership API handlers
//!
//! Member listing, removal, and role changes. The permission matrix:
//! any member can list; admins and the owner can remove members; only
//! the owner can remove admins or change roles; the owner can never be
//! removed or demoted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use postdeck_auth::AuthUser;
use postdeck_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::{InviteRole, TeamRole};
use crate::repository::MembershipWithUser;

/// Request for changing a member's role.
///
/// Uses [`InviteRole`], so granting the owner role is unrepresentable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRoleRequest {
    pub role: InviteRole,
}

/// Response for membership operations, enriched with the member's profile
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

impl From<MembershipWithUser> for MemberResponse {
    fn from(m: MembershipWithUser) -> Self {
        Self {
            id: m.id,
            team_id: m.team_id,
            user_id: m.user_id,
            role: m.role,
            joined_at: m.joined_at,
            email: m.user_email,
            first_name: m.user_first_name,
            last_name: m.user_last_name,
            image_url: m.user_image_url,
        }
    }
}

/// List team members
///
/// **GET /v1/teams/{team_id}/members**
///
/// Any member of the team can view the list. Owner first, then admins,
/// then members, each by join date.
pub async fn list_members(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Member)
        .await?;

    let members = state.repos.memberships.find_by_team(team_id).await?;

    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

/// Remove a team member
///
/// **DELETE /v1/teams/{team_id}/members/{user_id}**
///
/// Requires the admin role or above. The owner can never be removed,
/// and only the owner can remove admins.
pub async fn remove_member(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path((team_id, member_user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    let acting = state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Admin)
        .await?;

    let target = state
        .repos
        .memberships
        .get_by_team_and_user(team_id, member_user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Member not found in this team".to_string()))?;

    if target.role.is_owner() {
        return Err(Error::AccessDenied(
            "The team owner cannot be removed".to_string(),
        ));
    }

    if target.role == TeamRole::Admin && !acting.role.is_owner() {
        return Err(Error::AccessDenied(
            "Only the owner can remove admins".to_string(),
        ));
    }

    state
        .repos
        .memberships
        .delete(team_id, member_user_id)
        .await?;

    tracing::info!(
        team_id = %team_id,
        removed_user_id = %member_user_id,
        removed_by = %user.id,
        "Team member removed"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Change a member's role
///
/// **PATCH /v1/teams/{team_id}/members/{user_id}**
///
/// Owner only. The owner's own role cannot be changed, so ownership
/// never moves through this endpoint.
pub async fn update_member_role(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path((team_id, member_user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateMemberRoleRequest>,
) -> Result<Json<MemberResponse>> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Owner)
        .await?;

    let target = state
        .repos
        .memberships
        .get_by_team_and_user(team_id, member_user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Member not found in this team".to_string()))?;

    if target.role.is_owner() {
        return Err(Error::AccessDenied(
            "The owner's role cannot be changed".to_string(),
        ));
    }

    state
        .repos
        .memberships
        .update_role(team_id, member_user_id, request.role.to_team_role())
        .await?;

    let member = state
        .repos
        .memberships
        .find_by_team(team_id)
        .await?
        .into_iter()
        .find(|m| m.user_id == member_user_id)
        .ok_or_else(|| Error::Internal("Member missing after role update".to_string()))?;

    tracing::info!(
        team_id = %team_id,
        member_user_id = %member_user_id,
        new_role = %request.role,
        "Member role updated"
    );

    Ok(Json(MemberResponse::from(member)))
}
