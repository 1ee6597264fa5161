//! Core entities for the teams domain
//!
//! Users, teams, memberships, and invitations, with the role types and
//! validation rules that the API and repository layers share. All enums
//! map to Postgres enum types by name and serialize lowercase on the wire.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use postdeck_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::domain::state::{
    InvitationEvent, InvitationGuardContext, InvitationStateMachine, InvitationStatus,
};

/// Maximum length of a team name
pub const TEAM_NAME_MAX_LENGTH: usize = 100;

/// Maximum length of a team description
pub const TEAM_DESCRIPTION_MAX_LENGTH: usize = 500;

/// How long an invitation stays acceptable after creation (or resend)
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Posts per month granted to a newly created team
pub const DEFAULT_POST_LIMIT_PER_MONTH: i32 = 10;

/// Raw entropy behind an invitation token, before base64 encoding
const INVITATION_TOKEN_BYTES: usize = 32;

/// Role of a user within a team.
///
/// Exactly one member holds `Owner`; it is assigned at team creation and
/// never granted through invitations or role updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    Admin,
    Member,
}

impl TeamRole {
    /// Numeric privilege rank, higher is more privileged
    pub fn rank(&self) -> u8 {
        match self {
            TeamRole::Member => 0,
            TeamRole::Admin => 1,
            TeamRole::Owner => 2,
        }
    }

    /// Whether this role can manage members and invitations
    pub fn can_admin(&self) -> bool {
        self.rank() >= TeamRole::Admin.rank()
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, TeamRole::Owner)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRole::Owner => write!(f, "owner"),
            TeamRole::Admin => write!(f, "admin"),
            TeamRole::Member => write!(f, "member"),
        }
    }
}

/// Role that can be granted through an invitation or a role update.
///
/// A separate type rather than a validation rule: the owner role is
/// unrepresentable in invitation and role-change payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invite_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteRole {
    Admin,
    Member,
}

impl InviteRole {
    pub fn to_team_role(self) -> TeamRole {
        match self {
            InviteRole::Admin => TeamRole::Admin,
            InviteRole::Member => TeamRole::Member,
        }
    }
}

impl TryFrom<TeamRole> for InviteRole {
    type Error = Error;

    fn try_from(role: TeamRole) -> Result<Self> {
        match role {
            TeamRole::Admin => Ok(InviteRole::Admin),
            TeamRole::Member => Ok(InviteRole::Member),
            TeamRole::Owner => Err(Error::Validation(
                "The owner role cannot be granted".to_string(),
            )),
        }
    }
}

impl fmt::Display for InviteRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteRole::Admin => write!(f, "admin"),
            InviteRole::Member => write!(f, "member"),
        }
    }
}

/// Billing plan of a team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingPlan {
    #[default]
    Free,
    Basic,
    Pro,
    Unlimited,
}

impl fmt::Display for BillingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingPlan::Free => write!(f, "free"),
            BillingPlan::Basic => write!(f, "basic"),
            BillingPlan::Pro => write!(f, "pro"),
            BillingPlan::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// A user account, synced from the identity provider.
///
/// Rows are only created through the account-sync endpoint; nothing else
/// writes to the users table on a read path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Subject claim of the identity provider session
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Human-readable name for emails and the public invitation view
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// A team workspace
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The user holding the owner membership
    pub owner_id: Uuid,
    pub billing_plan: BillingPlan,
    pub posts_used_this_month: i32,
    pub post_limit_per_month: i32,
    pub billing_period_start: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team on the free plan with default post quota.
    ///
    /// Name is trimmed and must be non-empty after trimming.
    pub fn new(name: String, description: Option<String>, owner_id: Uuid) -> Result<Self> {
        let name = name.trim().to_string();
        Self::validate_name(&name)?;
        if let Some(desc) = &description {
            Self::validate_description(desc)?;
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            owner_id,
            billing_plan: BillingPlan::default(),
            posts_used_this_month: 0,
            post_limit_per_month: DEFAULT_POST_LIMIT_PER_MONTH,
            billing_period_start: now,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation("Team name cannot be empty".to_string()));
        }
        if name.len() > TEAM_NAME_MAX_LENGTH {
            return Err(Error::Validation(format!(
                "Team name cannot exceed {} characters",
                TEAM_NAME_MAX_LENGTH
            )));
        }
        Ok(())
    }

    pub fn validate_description(description: &str) -> Result<()> {
        if description.len() > TEAM_DESCRIPTION_MAX_LENGTH {
            return Err(Error::Validation(format!(
                "Team description cannot exceed {} characters",
                TEAM_DESCRIPTION_MAX_LENGTH
            )));
        }
        Ok(())
    }
}

/// A user's membership in a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(team_id: Uuid, user_id: Uuid, role: TeamRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// An invitation to join a team, addressed to an email.
///
/// The token is the only public handle: accept, decline, and the public
/// lookup all go through it. Invitation ids appear only on the
/// admin-facing cancel and resend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub team_id: Uuid,
    /// Member who sent the invitation
    pub invited_by: Uuid,
    /// Invitee email, stored lowercase
    pub email: String,
    pub role: InviteRole,
    pub status: InvitationStatus,
    /// URL-safe token carried in the invite link
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Create a pending invitation with a fresh token and 7-day deadline.
    pub fn new(team_id: Uuid, invited_by: Uuid, email: String, role: InviteRole) -> Result<Self> {
        if !email.validate_email() {
            return Err(Error::Validation(format!(
                "Invalid email address: {}",
                email
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            invited_by,
            email: email.to_lowercase(),
            role,
            status: InvitationStatus::Pending,
            token: Self::generate_token()?,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            created_at: now,
        })
    }

    /// Generate a cryptographically random, URL-safe token.
    fn generate_token() -> Result<String> {
        let mut bytes = [0u8; INVITATION_TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| Error::Internal(format!("Failed to generate invitation token: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Whether the deadline has passed. The stored status may still say
    /// pending; expiry is applied lazily by the read paths.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Whether the invitation is addressed to the given email address
    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.email == email.to_lowercase()
    }

    pub fn accept(&mut self) -> Result<()> {
        self.apply(InvitationEvent::Accept)
    }

    pub fn decline(&mut self) -> Result<()> {
        self.apply(InvitationEvent::Decline)
    }

    pub fn expire(&mut self) -> Result<()> {
        self.apply(InvitationEvent::Expire)
    }

    /// Revive or refresh the invitation: rotates the token and restarts
    /// the 7-day clock. Valid from pending and expired.
    pub fn resend(&mut self) -> Result<()> {
        self.apply(InvitationEvent::Resend)?;
        self.token = Self::generate_token()?;
        self.expires_at = Utc::now() + Duration::days(INVITATION_TTL_DAYS);
        Ok(())
    }

    fn apply(&mut self, event: InvitationEvent) -> Result<()> {
        let guard = InvitationGuardContext {
            is_expired: self.is_expired(),
        };
        let next =
            InvitationStateMachine::transition(self.status, event, &guard).map_err(|e| match e {
                postdeck_common::StateError::GuardFailed(_) => {
                    Error::Expired("Invitation has expired".to_string())
                }
                other => Error::InvalidState(other.to_string()),
            })?;
        self.status = next;
        Ok(())
    }
}
