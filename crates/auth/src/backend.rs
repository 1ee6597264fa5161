//! Concrete authentication backend
//!
//! Wraps `PgPool` + `AuthConfig` and owns auth-specific SQL queries.
//! Uses runtime `sqlx::query_as` (not macros) consistent with the
//! cross-domain read pattern.

use sqlx::PgPool;

use crate::claims::IdentityClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::types::AuthIdentity;

/// Concrete authentication backend.
///
/// Wraps a database pool and auth configuration. Validates identity-provider
/// tokens and resolves their subject to a `users` row.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    pool: PgPool,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Find a user identity by identity-provider subject.
    ///
    /// Read-only: resolution never creates rows. Account sync is the only
    /// write path for `users`.
    pub(crate) async fn find_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<AuthIdentity>, AuthError> {
        let user: Option<AuthIdentity> = sqlx::query_as(
            r#"
            SELECT id, external_id, email, first_name, last_name
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, external_id = %external_id, "Failed to load user");
            AuthError::UserLoadError
        })?;

        Ok(user)
    }

    /// Validate a token without touching the database.
    ///
    /// Used by the account-sync path, which must accept sessions whose
    /// subject has no user row yet.
    pub(crate) fn verify_token(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        crate::jwt::validate_jwt_token(token, &self.config)
    }

    /// Shared authentication logic used by `AuthUser` and `MaybeAuthUser`.
    pub(crate) async fn authenticate_jwt(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let claims = self.verify_token(token)?;

        self.find_user_by_external_id(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
