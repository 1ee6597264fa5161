//! Teams domain for Postdeck
//!
//! Multi-tenant team management: users, teams, role-based memberships,
//! and the token-based invitation lifecycle. Structured in three layers:
//!
//! - [`domain`]: entities, roles, and the invitation state machine
//! - [`repository`]: Postgres persistence over `sqlx`
//! - [`api`]: axum handlers, routes, and shared state

pub mod api;
pub mod domain;
pub mod repository;

pub use api::{routes, TeamsState};
pub use domain::*;
pub use repository::{
    InvitationRepository, InvitationWithInviter, MembershipRepository, MembershipWithUser,
    TeamRepository, TeamWithRole, TeamsRepositories, UserRepository,
};
