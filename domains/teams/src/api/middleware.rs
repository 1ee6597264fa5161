//! Shared API state for the teams domain

use std::sync::Arc;

use axum::extract::FromRef;
use postdeck_auth::AuthBackend;
use postdeck_common::Config;
use postdeck_email::EmailService;

use crate::repository::TeamsRepositories;

/// State shared by all teams-domain handlers.
///
/// `AuthBackend: FromRef<TeamsState>` lets the auth extractors work
/// against this state without the domain knowing about JWT internals.
#[derive(Clone)]
pub struct TeamsState {
    pub repos: TeamsRepositories,
    pub auth: AuthBackend,
    pub email: Arc<dyn EmailService>,
    pub config: Config,
}

impl FromRef<TeamsState> for AuthBackend {
    fn from_ref(state: &TeamsState) -> AuthBackend {
        state.auth.clone()
    }
}
