//! Auth read-model types
//!
//! Lightweight view of the `users` row owned by the teams domain.
//! Carries only the fields needed for authentication and display.

use uuid::Uuid;

/// Resolved identity for authenticated users.
///
/// Handlers needing the full `User` row should load it from the
/// teams domain repository.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    /// Identity-provider subject this row was synced from
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AuthIdentity {
    /// Human-readable name for email templates and member lists.
    /// Falls back to the email address when no name has been synced.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}
