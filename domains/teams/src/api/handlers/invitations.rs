//! Invitation workflow API handlers
//!
//! The full lifecycle: admins create, cancel, and resend invitations by
//! id; invitees look up, accept, and decline them by token. The token is
//! the only handle an invitee ever sees.
//!
//! Expiry is lazy. The deadline is checked when the invitation is read
//! on the accept and public-lookup paths, and the row is flipped to
//! expired at that moment. Nothing sweeps the table in the background.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use postdeck_auth::AuthUser;
use postdeck_common::{Error, Pagination, RepositoryError, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::{
    Invitation, InvitationStatus, InviteRole, Membership, Team, TeamRole, User,
};
use crate::repository::{accept_invitation_tx, InvitationWithInviter};

/// Request for inviting a new team member
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    /// Email address of the user to invite
    #[validate(email)]
    pub email: String,

    /// Role to grant on acceptance; the owner role is unrepresentable
    pub role: InviteRole,
}

/// Query parameters for listing invitations
#[derive(Debug, Deserialize, Default)]
pub struct InvitationListQuery {
    /// Filter by stored status (pending, accepted, declined, expired)
    pub status: Option<InvitationStatus>,
}

/// Response for invitation create/resend, including the invite link.
///
/// The token and link are only shown to the admins who manage the
/// invitation; the list endpoint deliberately omits them.
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub role: InviteRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    pub token: String,
    pub invite_link: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InvitationResponse {
    fn new(invitation: Invitation, invite_link: String) -> Self {
        Self {
            id: invitation.id,
            team_id: invitation.team_id,
            email: invitation.email,
            role: invitation.role,
            status: invitation.status,
            invited_by: invitation.invited_by,
            token: invitation.token,
            invite_link,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
        }
    }
}

/// Invitation list item, with the inviter's name instead of the token
#[derive(Debug, Serialize)]
pub struct InvitationListItem {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub role: InviteRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    pub inviter_name: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<InvitationWithInviter> for InvitationListItem {
    fn from(i: InvitationWithInviter) -> Self {
        let inviter_name = match (&i.inviter_first_name, &i.inviter_last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => i.inviter_email.clone(),
        };
        Self {
            id: i.id,
            team_id: i.team_id,
            email: i.email,
            role: i.role,
            status: i.status,
            invited_by: i.invited_by,
            inviter_name,
            expires_at: i.expires_at,
            created_at: i.created_at,
        }
    }
}

/// Public view of a pending invitation, shown on the invite landing page
#[derive(Debug, Serialize)]
pub struct PublicInvitationResponse {
    pub team_name: String,
    pub inviter_name: String,
    pub email: String,
    pub role: InviteRole,
    pub expires_at: DateTime<Utc>,
}

/// Response for accepting an invitation
#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    pub team_id: Uuid,
}

/// Send an invitation to join a team
///
/// **POST /v1/teams/{team_id}/invitations**
///
/// Requires the admin role or above. Rejects with a conflict when the
/// invitee is already a member or already has a pending invitation.
pub async fn create_invitation(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<InviteMemberRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>)> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Admin)
        .await?;

    let team = state
        .repos
        .teams
        .find(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;

    // The invitee may already hold an account; if so, they must not
    // already be on the team.
    if let Some(existing_user) = state.repos.users.find_by_email(&request.email).await? {
        let already_member = state
            .repos
            .memberships
            .get_by_team_and_user(team_id, existing_user.id)
            .await?
            .is_some();
        if already_member {
            return Err(Error::Conflict(
                "User is already a member of this team".to_string(),
            ));
        }
    }

    let pending = state
        .repos
        .invitations
        .find_pending_by_team_and_email(team_id, &request.email)
        .await?;
    if pending.is_some() {
        return Err(Error::Conflict(
            "An invitation for this email is already pending".to_string(),
        ));
    }

    let invitation = Invitation::new(team_id, user.id, request.email, request.role)?;

    let created = state
        .repos
        .invitations
        .create(&invitation)
        .await
        .map_err(|e| match e {
            // Concurrent create lost the race against the partial unique index
            RepositoryError::AlreadyExists => Error::Conflict(
                "An invitation for this email is already pending".to_string(),
            ),
            other => Error::from(other),
        })?;

    let invite_link = state.config.invite_link(&created.token);
    deliver_invitation_email(&state, &team, &created, &user.display_name(), &invite_link).await;

    tracing::info!(
        invitation_id = %created.id,
        team_id = %team_id,
        invited_by = %user.id,
        "Invitation created"
    );

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse::new(created, invite_link)),
    ))
}

/// List a team's invitations
///
/// **GET /v1/teams/{team_id}/invitations**
///
/// Any member of the team can view the list; only creating, cancelling,
/// and resending are gated on the admin role. Newest first; filterable
/// by stored status and paginated. Tokens are not included.
pub async fn list_invitations(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Query(query): Query<InvitationListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<InvitationListItem>>> {
    state
        .repos
        .memberships
        .require_role(team_id, user.id, TeamRole::Member)
        .await?;

    let invitations = state
        .repos
        .invitations
        .find_by_team(team_id, query.status, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(
        invitations.into_iter().map(InvitationListItem::from).collect(),
    ))
}

/// Public invitation lookup by token
///
/// **GET /v1/invite/{token}**
///
/// No authentication. Returns the invitation preview for a live pending
/// invitation, and JSON `null` otherwise. Missing, non-pending, and
/// expired tokens are indistinguishable to the caller, so the endpoint
/// leaks nothing about which tokens exist.
pub async fn get_invitation_by_token(
    State(state): State<TeamsState>,
    Path(token): Path<String>,
) -> Result<Json<Option<PublicInvitationResponse>>> {
    let Some(invitation) = state.repos.invitations.find_by_token(&token).await? else {
        return Ok(Json(None));
    };

    if invitation.status != InvitationStatus::Pending {
        return Ok(Json(None));
    }

    if invitation.is_expired() {
        record_lazy_expiry(&state, &invitation).await;
        return Ok(Json(None));
    }

    let team = state
        .repos
        .teams
        .find(invitation.team_id)
        .await?
        .ok_or_else(|| Error::Internal("Team missing for invitation".to_string()))?;

    let inviter_name = state
        .repos
        .users
        .find(invitation.invited_by)
        .await?
        .as_ref()
        .map(User::display_name)
        .unwrap_or_else(|| "A team admin".to_string());

    Ok(Json(Some(PublicInvitationResponse {
        team_name: team.name,
        inviter_name,
        email: invitation.email,
        role: invitation.role,
        expires_at: invitation.expires_at,
    })))
}

/// Accept an invitation
///
/// **POST /v1/invite/{token}/accept**
///
/// The caller must be signed in with the invited email. Creates the
/// membership and marks the invitation accepted in one transaction.
pub async fn accept_invitation(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(token): Path<String>,
) -> Result<Json<AcceptInvitationResponse>> {
    let invitation = state
        .repos
        .invitations
        .find_by_token(&token)
        .await?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    match invitation.status {
        InvitationStatus::Pending => {}
        InvitationStatus::Accepted => {
            return Err(Error::InvalidState(
                "Invitation has already been accepted".to_string(),
            ))
        }
        InvitationStatus::Declined => {
            return Err(Error::InvalidState(
                "Invitation has been declined".to_string(),
            ))
        }
        InvitationStatus::Expired => {
            return Err(Error::Expired("Invitation has expired".to_string()))
        }
    }

    if invitation.is_expired() {
        record_lazy_expiry(&state, &invitation).await;
        return Err(Error::Expired("Invitation has expired".to_string()));
    }

    if !invitation.is_addressed_to(&user.email) {
        return Err(Error::AccessDenied(
            "This invitation was sent to a different email address".to_string(),
        ));
    }

    let existing = state
        .repos
        .memberships
        .get_by_team_and_user(invitation.team_id, user.id)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(
            "You are already a member of this team".to_string(),
        ));
    }

    let membership = Membership::new(invitation.team_id, user.id, invitation.role.to_team_role());

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    accept_invitation_tx(&mut tx, invitation.id, &membership)
        .await
        .map_err(|e| match e {
            // A concurrent accept or cancel got there first
            RepositoryError::NotFound | RepositoryError::AlreadyExists => {
                Error::InvalidState("Invitation is no longer pending".to_string())
            }
            other => Error::from(other),
        })?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        invitation_id = %invitation.id,
        team_id = %invitation.team_id,
        user_id = %user.id,
        "Invitation accepted"
    );

    Ok(Json(AcceptInvitationResponse {
        team_id: invitation.team_id,
    }))
}

/// Decline an invitation
///
/// **POST /v1/invite/{token}/decline**
///
/// No authentication: the recipient may not hold an account and never
/// will. The deadline is not checked; a stale pending invitation can
/// still be declined.
pub async fn decline_invitation(
    State(state): State<TeamsState>,
    Path(token): Path<String>,
) -> Result<StatusCode> {
    let invitation = state
        .repos
        .invitations
        .find_by_token(&token)
        .await?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    if invitation.status != InvitationStatus::Pending {
        return Err(Error::InvalidState(
            "Invitation is no longer pending".to_string(),
        ));
    }

    state
        .repos
        .invitations
        .mark_declined(invitation.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                Error::InvalidState("Invitation is no longer pending".to_string())
            }
            other => Error::from(other),
        })?;

    tracing::info!(invitation_id = %invitation.id, "Invitation declined");

    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an invitation
///
/// **DELETE /v1/invitations/{invitation_id}**
///
/// Requires the admin role or above on the invitation's team. Only
/// pending invitations can be canceled; cancellation deletes the row,
/// immediately invalidating the emailed link.
pub async fn cancel_invitation(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<StatusCode> {
    let invitation = state
        .repos
        .invitations
        .find(invitation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    state
        .repos
        .memberships
        .require_role(invitation.team_id, user.id, TeamRole::Admin)
        .await?;

    if invitation.status != InvitationStatus::Pending {
        return Err(Error::InvalidState(
            "Only pending invitations can be canceled".to_string(),
        ));
    }

    state.repos.invitations.delete(invitation_id).await?;

    tracing::info!(
        invitation_id = %invitation_id,
        canceled_by = %user.id,
        "Invitation canceled"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Resend an invitation
///
/// **POST /v1/invitations/{invitation_id}/resend**
///
/// Requires the admin role or above. Valid for pending and expired
/// invitations; rotates the token, restarts the 7-day clock, revives an
/// expired invitation to pending, and sends a fresh email. The old link
/// stops working the moment the token rotates.
pub async fn resend_invitation(
    AuthUser(user): AuthUser,
    State(state): State<TeamsState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>> {
    let mut invitation = state
        .repos
        .invitations
        .find(invitation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    state
        .repos
        .memberships
        .require_role(invitation.team_id, user.id, TeamRole::Admin)
        .await?;

    // Terminal statuses are rejected by the state machine
    invitation.resend()?;

    let updated = state.repos.invitations.update_for_resend(&invitation).await?;

    let team = state
        .repos
        .teams
        .find(updated.team_id)
        .await?
        .ok_or_else(|| Error::Internal("Team missing for invitation".to_string()))?;

    let invite_link = state.config.invite_link(&updated.token);
    deliver_invitation_email(&state, &team, &updated, &user.display_name(), &invite_link).await;

    tracing::info!(
        invitation_id = %updated.id,
        resent_by = %user.id,
        "Invitation resent"
    );

    Ok(Json(InvitationResponse::new(updated, invite_link)))
}

/// Persist a lazily observed expiry. Best effort: a concurrent observer
/// may have flipped the row already, which is fine.
async fn record_lazy_expiry(state: &TeamsState, invitation: &Invitation) {
    match state.repos.invitations.mark_expired(invitation.id).await {
        Ok(()) | Err(RepositoryError::NotFound) => {}
        Err(e) => {
            tracing::warn!(
                invitation_id = %invitation.id,
                error = %e,
                "Failed to record invitation expiry"
            );
        }
    }
}

/// Send the invitation email. Delivery failure is logged, not surfaced:
/// the invitation row is already committed and the link is returned in
/// the API response, so the admin can still share it.
async fn deliver_invitation_email(
    state: &TeamsState,
    team: &Team,
    invitation: &Invitation,
    inviter_name: &str,
    invite_link: &str,
) {
    let result = state
        .email
        .send_team_invitation(
            &team.name,
            invitation.id,
            &invitation.email,
            inviter_name,
            &invitation.role.to_string(),
            invite_link,
        )
        .await;

    if let Err(e) = result {
        tracing::error!(
            invitation_id = %invitation.id,
            error = %e,
            "Failed to send invitation email"
        );
    }
}
