//! Account API handlers
//!
//! The sync endpoint is the single write path that creates user rows:
//! it takes verified session claims and upserts the matching account.
//! Every other endpoint requires the row to exist already.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use postdeck_auth::{AuthUser, VerifiedClaims};
use postdeck_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::User;

/// Profile fields accepted on sync. All optional; the identity provider
/// claims supply the subject and email.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SyncAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Request for updating the account profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Response for account operations
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for AccountResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Sync the account from the session
///
/// **POST /v1/account/sync**
///
/// Validates the session token but deliberately skips identity
/// resolution: this is the endpoint that creates the user row, so it
/// must accept sessions whose subject is not in the database yet.
pub async fn sync_account(
    VerifiedClaims(claims): VerifiedClaims,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<SyncAccountRequest>,
) -> Result<Json<AccountResponse>> {
    let email = claims.email.ok_or_else(|| {
        Error::Validation("Session token does not carry an email claim".to_string())
    })?;

    let user = state
        .repos
        .users
        .upsert(
            &claims.sub,
            &email,
            request.first_name.as_deref(),
            request.last_name.as_deref(),
            request.image_url.as_deref(),
        )
        .await
        .map_err(|e| Error::Internal(format!("Failed to sync account: {}", e)))?;

    tracing::info!(user_id = %user.id, "Account synced");

    Ok(Json(AccountResponse::from(user)))
}

/// Get the current account
///
/// **GET /v1/account**
pub async fn get_account(
    AuthUser(identity): AuthUser,
    State(state): State<TeamsState>,
) -> Result<Json<AccountResponse>> {
    let user = state
        .repos
        .users
        .find(identity.id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    Ok(Json(AccountResponse::from(user)))
}

/// Update the account profile
///
/// **PATCH /v1/account**
///
/// Absent fields are left untouched.
pub async fn update_account(
    AuthUser(identity): AuthUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>> {
    let user = state
        .repos
        .users
        .update_profile(
            identity.id,
            request.first_name.as_deref(),
            request.last_name.as_deref(),
            request.image_url.as_deref(),
        )
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    Ok(Json(AccountResponse::from(user)))
}
