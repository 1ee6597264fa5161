//! Repository layer for the teams domain
//!
//! Per-entity repositories over a shared `PgPool`, plus free functions in
//! [`transactions`] for multi-statement mutations. Queries are built at
//! runtime so the crate compiles without a live database.

use postdeck_common::RepositoryError;
use sqlx::{PgPool, Postgres, Transaction};

mod invitations;
mod memberships;
mod teams;
mod transactions;
mod users;

pub use invitations::{InvitationRepository, InvitationWithInviter};
pub use memberships::{MembershipRepository, MembershipWithUser, TeamWithRole};
pub use teams::TeamRepository;
pub use transactions::{
    accept_invitation_tx, create_membership_tx, create_team_tx, delete_invitations_for_team_tx,
    delete_memberships_for_team_tx, delete_team_tx,
};
pub use users::UserRepository;

/// Map an insert/update error, surfacing unique violations as conflicts.
pub(crate) fn map_constraint_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepositoryError::AlreadyExists;
        }
    }
    RepositoryError::Connection(e)
}

/// Aggregate of all teams-domain repositories sharing one pool.
#[derive(Clone)]
pub struct TeamsRepositories {
    pool: PgPool,
    pub users: UserRepository,
    pub teams: TeamRepository,
    pub memberships: MembershipRepository,
    pub invitations: InvitationRepository,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            teams: TeamRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            invitations: InvitationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a transaction for multi-statement mutations.
    ///
    /// Dropping the returned transaction without committing rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, RepositoryError> {
        Ok(self.pool.begin().await?)
    }
}
