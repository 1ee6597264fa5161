//! Route definitions for the teams domain
//!
//! Everything lives under `/v1`. Token-addressed invitation endpoints sit
//! under `/v1/invite/{token}`; id-addressed admin operations sit under
//! `/v1/invitations/{invitation_id}`.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::handlers::{account, invitations, memberships, teams};
use crate::api::middleware::TeamsState;

/// All teams-domain routes
pub fn routes() -> Router<TeamsState> {
    Router::new()
        .merge(team_routes())
        .merge(membership_routes())
        .merge(invitation_routes())
        .merge(account_routes())
}

fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams", post(teams::create_team).get(teams::list_teams))
        .route(
            "/v1/teams/{team_id}",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
}

fn membership_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams/{team_id}/members", get(memberships::list_members))
        .route(
            "/v1/teams/{team_id}/members/{user_id}",
            delete(memberships::remove_member).patch(memberships::update_member_role),
        )
}

fn invitation_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/teams/{team_id}/invitations",
            post(invitations::create_invitation).get(invitations::list_invitations),
        )
        // Token-addressed, for invitees; lookup and decline are public
        .route("/v1/invite/{token}", get(invitations::get_invitation_by_token))
        .route(
            "/v1/invite/{token}/accept",
            post(invitations::accept_invitation),
        )
        .route(
            "/v1/invite/{token}/decline",
            post(invitations::decline_invitation),
        )
        // Id-addressed, for team admins
        .route(
            "/v1/invitations/{invitation_id}",
            delete(invitations::cancel_invitation),
        )
        .route(
            "/v1/invitations/{invitation_id}/resend",
            post(invitations::resend_invitation),
        )
}

fn account_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/account/sync", post(account::sync_account))
        .route(
            "/v1/account",
            get(account::get_account).patch(account::update_account),
        )
}
