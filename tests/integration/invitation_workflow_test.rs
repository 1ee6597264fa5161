//! Invitation workflow integration tests
//!
//! Exercises the full lifecycle over the HTTP surface: create, public
//! lookup, accept, decline, cancel, resend, and lazy expiry. Requires a
//! scratch Postgres database; run with `cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use common::{error_code, TestApp};
use serde_json::json;

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn invitation_accept_happy_path() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Launch Crew").await;

    let (invitee_token, invitee_id, invitee_email) = app.sync_fresh_user("invitee").await;
    let (_, invite_token) = app.invite(&owner_token, team_id, &invitee_email, "admin").await;

    // The invitation email was captured with the invite link
    let captured = app
        .email
        .get_latest_invitation_email(&invitee_email)
        .expect("invitation email not captured");
    let link = captured.invite_link().expect("no invite link in email");
    assert!(link.ends_with(&invite_token));

    // Public lookup shows the preview without authentication
    let (status, body) = app
        .request(Method::GET, &format!("/v1/invite/{}", invite_token), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], invitee_email);
    assert_eq!(body["role"], "admin");
    assert!(body["team_name"].is_string());

    // Accept with the invitee's session
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
    assert_eq!(body["team_id"].as_str().unwrap(), team_id.to_string());

    // The invitee now appears in the member list with the granted role
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}/members", team_id),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let member = body
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["user_id"].as_str().unwrap() == invitee_id.to_string())
        .expect("invitee not in member list");
    assert_eq!(member["role"], "admin");

    // A second accept hits the terminal state
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");

    // And the public lookup no longer reveals anything
    let (status, body) = app
        .request(Method::GET, &format!("/v1/invite/{}", invite_token), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn accept_requires_matching_email() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Mismatch Team").await;

    let (_, invite_token) = app
        .invite(&owner_token, team_id, "someone@postdeck.test", "member")
        .await;

    // A different signed-in user cannot take the invitation
    let (stranger_token, _, _) = app.sync_fresh_user("stranger").await;
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&stranger_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn decline_needs_no_session_and_ignores_deadline() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Decliners").await;

    let (invitation_id, invite_token) = app
        .invite(&owner_token, team_id, "nobody@postdeck.test", "member")
        .await;

    // Backdate the deadline; declining is still allowed
    app.force_expiry(invitation_id).await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/decline", invite_token),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.stored_status(invitation_id).await, "declined");

    // Declined is terminal
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/decline", invite_token),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn expired_invitation_gets_gone_then_revived_by_resend() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Late Arrivals").await;

    let (invitee_token, _, invitee_email) = app.sync_fresh_user("invitee").await;
    let (invitation_id, invite_token) = app
        .invite(&owner_token, team_id, &invitee_email, "member")
        .await;

    app.force_expiry(invitation_id).await;

    // Accept observes the deadline: 410, and the row flips to expired
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(error_code(&body), "EXPIRED");
    assert_eq!(app.stored_status(invitation_id).await, "expired");

    // Resend revives it with a fresh token and deadline
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invitations/{}/resend", invitation_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "resend failed: {}", body);
    assert_eq!(body["status"], "pending");
    let new_token = body["token"].as_str().unwrap().to_string();
    assert_ne!(new_token, invite_token);

    // The old token is dead, the new one accepts
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", new_token),
            Some(&invitee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "accept after resend failed: {}", body);
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn cancel_deletes_pending_invitation() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Cancellers").await;

    let (invitation_id, invite_token) = app
        .invite(&owner_token, team_id, "cancelme@postdeck.test", "member")
        .await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/invitations/{}", invitation_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The emailed link is dead immediately
    let (status, body) = app
        .request(Method::GET, &format!("/v1/invite/{}", invite_token), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    // And a new invitation for the same email is allowed again
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&owner_token),
            Some(json!({ "email": "cancelme@postdeck.test", "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn invitation_conflicts_and_permissions() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, owner_email) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Gatekeepers").await;

    // Inviting an existing member conflicts
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&owner_token),
            Some(json!({ "email": owner_email, "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    // A second pending invitation for the same email conflicts
    let email = "pending@postdeck.test";
    app.invite(&owner_token, team_id, email, "member").await;
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&owner_token),
            Some(json!({ "email": email, "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    // Plain members cannot invite
    let (member_token, _, member_email) = app.sync_fresh_user("member").await;
    let (_, invite_token) = app
        .invite(&owner_token, team_id, &member_email, "member")
        .await;
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/v1/invite/{}/accept", invite_token),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&member_token),
            Some(json!({ "email": "friend@postdeck.test", "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    // But any member can view the invitation list, minus the tokens
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let pending = body
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["email"] == email)
        .expect("pending invitation not listed for member");
    assert!(pending.get("token").is_none());

    // Outsiders still cannot
    let (outsider_token, _, _) = app.sync_fresh_user("outsider").await;
    let (status, _) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}/invitations", team_id),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
