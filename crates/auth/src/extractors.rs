//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::AuthBackend;
use crate::claims::IdentityClaims;
use crate::error::AuthError;
use crate::jwt::extract_bearer_token;
use crate::types::AuthIdentity;

/// Authenticated user extractor.
///
/// Requires a valid session token whose subject resolves to a synced
/// user row. Rejects with `USER_NOT_FOUND` when the subject is unknown.
#[derive(Debug)]
pub struct AuthUser(pub AuthIdentity);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = extract_bearer_token(auth_header)?;
        let identity = backend.authenticate_jwt(&token).await?;

        Ok(AuthUser(identity))
    }
}

/// Optional-auth extractor for endpoints that degrade gracefully.
///
/// Resolves to `None` when no Authorization header is present or the
/// token's subject has no user row; a present-but-invalid token still
/// rejects. The team-list endpoint uses this to return an empty list
/// to anonymous callers instead of an error.
#[derive(Debug)]
pub struct MaybeAuthUser(pub Option<AuthIdentity>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(MaybeAuthUser(None));
        };

        let token = extract_bearer_token(auth_header)?;
        match backend.authenticate_jwt(&token).await {
            Ok(identity) => Ok(MaybeAuthUser(Some(identity))),
            Err(AuthError::UserNotFound) => Ok(MaybeAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Verified-claims extractor: validates the token, skips identity resolution.
///
/// The account-sync endpoint uses this — it must accept sessions whose
/// subject has no user row yet, since sync is what creates the row.
#[derive(Debug)]
pub struct VerifiedClaims(pub IdentityClaims);

impl<S> FromRequestParts<S> for VerifiedClaims
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = extract_bearer_token(auth_header)?;
        let claims = backend.verify_token(&token)?;

        Ok(VerifiedClaims(claims))
    }
}
