//! Authentication middleware for the Postdeck API
//!
//! Provides JWT validation, identity resolution, and axum extractors
//! that work with any domain state implementing `FromRef<S>` for `AuthBackend`.
//!
//! Identity tokens come from the external identity provider; the token
//! subject is resolved against the `users` table. Resolution never creates
//! rows: a valid session whose subject has no user row fails with
//! `USER_NOT_FOUND` until the account sync endpoint has run.

mod backend;
mod claims;
mod config;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::AuthBackend;
pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AuthUser, MaybeAuthUser, VerifiedClaims};
pub use types::AuthIdentity;
