//! Team and membership API integration tests
//!
//! Requires a scratch Postgres database; run with `cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use common::{error_code, TestApp};
use serde_json::json;

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn team_listing_degrades_for_anonymous_callers() {
    let app = TestApp::spawn().await.unwrap();

    // No Authorization header: empty list, not an error
    let (status, body) = app.request(Method::GET, "/v1/teams", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Valid session whose subject was never synced: also empty
    let token = app.token_for("ext_never_synced", "ghost@postdeck.test");
    let (status, body) = app.request(Method::GET, "/v1/teams", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    // But that same unsynced session cannot create a team
    let (status, body) = app
        .request(
            Method::POST,
            "/v1/teams",
            Some(&token),
            Some(json!({ "name": "Ghost Team" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn team_creation_grants_owner_membership() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, owner_id, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Founders").await;

    let (status, body) = app
        .request(Method::GET, "/v1/teams", Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let teams = body.as_array().unwrap();
    let team = teams
        .iter()
        .find(|t| t["id"].as_str().unwrap() == team_id.to_string())
        .expect("created team not listed");
    assert_eq!(team["role"], "owner");
    assert_eq!(team["owner_id"].as_str().unwrap(), owner_id.to_string());
    assert_eq!(team["billing_plan"], "free");
    assert_eq!(team["post_limit_per_month"], 10);

    // Outsiders cannot read the team
    let (outsider_token, _, _) = app.sync_fresh_user("outsider").await;
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}", team_id),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn role_changes_are_owner_only_and_never_touch_the_owner() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, owner_id, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Hierarchy").await;

    // Bring in an admin and a member through invitations
    let (admin_token, admin_id, admin_email) = app.sync_fresh_user("admin").await;
    let (_, t) = app.invite(&owner_token, team_id, &admin_email, "admin").await;
    let (status, _) = app
        .request(Method::POST, &format!("/v1/invite/{}/accept", t), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (member_token, member_id, member_email) = app.sync_fresh_user("member").await;
    let (_, t) = app.invite(&owner_token, team_id, &member_email, "member").await;
    let (status, _) = app
        .request(Method::POST, &format!("/v1/invite/{}/accept", t), Some(&member_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Admins cannot change roles
    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}/members/{}", team_id, member_id),
            Some(&admin_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can promote a member
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}/members/{}", team_id, member_id),
            Some(&owner_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "promotion failed: {}", body);
    assert_eq!(body["role"], "admin");

    // But nobody changes the owner's role, not even the owner
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}/members/{}", team_id, owner_id),
            Some(&owner_token),
            Some(json!({ "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    // Admins cannot remove fellow admins; the owner can
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/teams/{}/members/{}", team_id, admin_id),
            Some(&member_token), // now an admin after promotion
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/teams/{}/members/{}", team_id, admin_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The owner can never be removed
    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/v1/teams/{}/members/{}", team_id, owner_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn team_deletion_is_owner_only_and_cascades() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let team_id = app.create_team(&owner_token, "Doomed").await;

    let (admin_token, _, admin_email) = app.sync_fresh_user("admin").await;
    let (_, t) = app.invite(&owner_token, team_id, &admin_email, "admin").await;
    let (status, _) = app
        .request(Method::POST, &format!("/v1/invite/{}/accept", t), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Leave one pending invitation behind to verify the cascade
    app.invite(&owner_token, team_id, "straggler@postdeck.test", "member")
        .await;

    // Admins cannot delete the team
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/teams/{}", team_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/v1/teams/{}", team_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Memberships and invitations went with the team
    let remaining: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM memberships WHERE team_id = $1",
    )
    .bind(team_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(remaining, 0);

    let remaining: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM invitations WHERE team_id = $1",
    )
    .bind(team_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(remaining, 0);

    // The former admin's team list is empty again
    let (status, body) = app
        .request(Method::GET, "/v1/teams", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["id"].as_str().unwrap() != team_id.to_string()));
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn duplicate_team_names_conflict() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    app.create_team(&owner_token, "Atlas").await;

    // Creating a second team with the same name conflicts, even for
    // another user: names are unique store-wide
    let (other_token, _, _) = app.sync_fresh_user("other").await;
    let (status, body) = app
        .request(
            Method::POST,
            "/v1/teams",
            Some(&other_token),
            Some(json!({ "name": "Atlas" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    // Renaming onto an existing name conflicts the same way
    let second_id = app.create_team(&owner_token, "Atlas Two").await;
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}", second_id),
            Some(&owner_token),
            Some(json!({ "name": "Atlas" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    // And the failed rename left the team untouched
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}", second_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Atlas Two");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn team_description_cleared_only_by_explicit_null() {
    let app = TestApp::spawn().await.unwrap();

    let (owner_token, _, _) = app.sync_fresh_user("owner").await;
    let (status, body) = app
        .request(
            Method::POST,
            "/v1/teams",
            Some(&owner_token),
            Some(json!({ "name": "Describers", "description": "Keep me around" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let team_id = body["id"].as_str().unwrap().to_string();

    // An update that omits the description leaves it alone
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}", team_id),
            Some(&owner_token),
            Some(json!({ "name": "Describers Inc" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Keep me around");

    // An explicit null clears it
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/v1/teams/{}", team_id),
            Some(&owner_token),
            Some(json!({ "description": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "clear failed: {}", body);
    assert!(body["description"].is_null());

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/v1/teams/{}", team_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
    assert_eq!(body["name"], "Describers Inc");
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn account_sync_is_idempotent_and_updates_email() {
    let app = TestApp::spawn().await.unwrap();

    let (token, user_id, email) = app.sync_fresh_user("sync").await;

    // Re-syncing the same subject returns the same row
    let (status, body) = app
        .request(Method::POST, "/v1/account/sync", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(body["email"], email);

    // Profile updates stick
    let (status, body) = app
        .request(
            Method::PATCH,
            "/v1/account",
            Some(&token),
            Some(json!({ "first_name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Renamed");

    let (status, body) = app.request(Method::GET, "/v1/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Renamed");
}
