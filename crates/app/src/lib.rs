//! Postdeck application composition root
//!
//! Wires the teams domain router to its backing services: the Postgres
//! pool, the JWT auth backend, and the email service.

use std::sync::Arc;

use axum::Router;
use postdeck_auth::{AuthBackend, AuthConfig};
use postdeck_common::Config;
use postdeck_email::{EmailConfig, EmailServiceFactory};
use postdeck_teams::{TeamsRepositories, TeamsState};
use sqlx::PgPool;

/// Create the main application router with all routes and middleware
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let repos = TeamsRepositories::new(pool.clone());

    let auth_config = AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    };
    let auth = AuthBackend::new(pool, auth_config);

    let email_config = EmailConfig::from_env()?;
    let email = Arc::from(EmailServiceFactory::create(email_config));

    let teams_state = TeamsState {
        repos,
        auth,
        email,
        config,
    };

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/", axum::routing::get(|| async { "Postdeck API" }))
        .merge(postdeck_teams::routes().with_state(teams_state));

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
