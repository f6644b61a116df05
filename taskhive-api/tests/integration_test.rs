/// Integration tests for the Taskhive API
///
/// These run the full router against a real Postgres database and verify:
/// - identity token enforcement
/// - profile sync and invite-placeholder linking
/// - workspace creation rules (one per type, trial stamp, owner-only delete)
/// - membership mutation rules (owner immutability, admin-on-admin)
/// - task lifecycle, the `"personal"` alias, due-date clearing, tags
///
/// Tests skip when TEST_DATABASE_URL / DATABASE_URL is not set.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use common::TestContext;
use serde_json::json;
use taskhive_shared::store::task::personal_workspace_id;
use uuid::Uuid;

/// Syncs a profile for a token, returning the user JSON
async fn signup(ctx: &TestContext, token: &str) -> serde_json::Value {
    ctx.send_expect(
        Method::GET,
        "/v1/users/profile",
        Some(token),
        None,
        StatusCode::OK,
    )
    .await
}

/// Creates a professional workspace, returning its JSON
async fn create_professional(ctx: &TestContext, token: &str) -> serde_json::Value {
    ctx.send_expect(
        Method::POST,
        "/v1/workspaces",
        Some(token),
        Some(json!({"name": "Acme", "type": "PROFESSIONAL"})),
        StatusCode::CREATED,
    )
    .await
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = require_db!();

    let response = ctx.send(Method::GET, "/v1/workspaces", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .send(Method::GET, "/v1/workspaces", Some("not-a-token"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = require_db!();

    let body = ctx
        .send_expect(Method::GET, "/health", None, None, StatusCode::OK)
        .await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_profile_sync_is_idempotent() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let first = signup(&ctx, &token).await;
    let second = signup(&ctx, &token).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["email"], email);
    assert_eq!(first["externalId"], sub);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_second_workspace_of_same_type_is_rejected() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    create_professional(&ctx, &token).await;

    let response = ctx
        .send(
            Method::POST,
            "/v1/workspaces",
            Some(&token),
            Some(json!({"name": "Acme Two", "type": "PROFESSIONAL"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A different type is still fine
    ctx.send_expect(
        Method::POST,
        "/v1/workspaces",
        Some(&token),
        Some(json!({"name": "Mine", "type": "PERSONAL"})),
        StatusCode::CREATED,
    )
    .await;

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_professional_workspace_gets_trial_stamp() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let workspace = create_professional(&ctx, &token).await;

    let ends_at: DateTime<Utc> = workspace["subscriptionEndsAt"]
        .as_str()
        .expect("missing subscriptionEndsAt")
        .parse()
        .expect("invalid timestamp");

    let now = Utc::now();
    assert!(ends_at > now + Duration::days(13));
    assert!(ends_at < now + Duration::days(15));

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_workspace_hidden_from_non_members() {
    let ctx = require_db!();
    let (owner_sub, owner_email) = ctx.fresh_actor();
    let (other_sub, other_email) = ctx.fresh_actor();
    let owner_token = ctx.token_for(&owner_sub, &owner_email);
    let other_token = ctx.token_for(&other_sub, &other_email);

    let workspace = create_professional(&ctx, &owner_token).await;
    let workspace_id = workspace["id"].as_str().unwrap().to_string();
    signup(&ctx, &other_token).await;

    let response = ctx
        .send(
            Method::GET,
            &format!("/v1/workspaces/{}", workspace_id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup(&[&owner_email, &other_email]).await;
}

#[tokio::test]
async fn test_member_listing_is_forbidden_for_non_members() {
    let ctx = require_db!();
    let (owner_sub, owner_email) = ctx.fresh_actor();
    let (other_sub, other_email) = ctx.fresh_actor();
    let owner_token = ctx.token_for(&owner_sub, &owner_email);
    let other_token = ctx.token_for(&other_sub, &other_email);

    let workspace = create_professional(&ctx, &owner_token).await;
    let workspace_id = workspace["id"].as_str().unwrap().to_string();
    signup(&ctx, &other_token).await;

    // Unlike workspace GET (404), the member list answers 403: the caller
    // named a workspace they cannot administer or read members of
    let response = ctx
        .send(
            Method::GET,
            &format!("/v1/workspaces/{}/members", workspace_id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A plain MEMBER may list
    ctx.send_expect(
        Method::POST,
        &format!("/v1/workspaces/{}/members", workspace_id),
        Some(&owner_token),
        Some(json!({"email": other_email, "role": "MEMBER"})),
        StatusCode::CREATED,
    )
    .await;

    let members = ctx
        .send_expect(
            Method::GET,
            &format!("/v1/workspaces/{}/members", workspace_id),
            Some(&other_token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(members.as_array().map(|m| m.len()), Some(2));

    ctx.cleanup(&[&owner_email, &other_email]).await;
}

#[tokio::test]
async fn test_invite_flow_and_placeholder_linking() {
    let ctx = require_db!();
    let (owner_sub, owner_email) = ctx.fresh_actor();
    let (invitee_sub, invitee_email) = ctx.fresh_actor();
    let owner_token = ctx.token_for(&owner_sub, &owner_email);

    let workspace = create_professional(&ctx, &owner_token).await;
    let workspace_id = workspace["id"].as_str().unwrap().to_string();
    let members_uri = format!("/v1/workspaces/{}/members", workspace_id);

    // Invite someone who has never signed in; defaults to MEMBER
    let membership = ctx
        .send_expect(
            Method::POST,
            &members_uri,
            Some(&owner_token),
            Some(json!({"email": invitee_email})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(membership["role"], "MEMBER");

    // Inviting again is a client mistake
    let response = ctx
        .send(
            Method::POST,
            &members_uri,
            Some(&owner_token),
            Some(json!({"email": invitee_email})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // First sign-in links the placeholder row instead of creating a new one
    let invitee_token = ctx.token_for(&invitee_sub, &invitee_email);
    let profile = signup(&ctx, &invitee_token).await;
    assert_eq!(profile["id"], membership["userId"]);
    assert_eq!(profile["externalId"], invitee_sub);

    // The invitee can now see the workspace
    ctx.send_expect(
        Method::GET,
        &format!("/v1/workspaces/{}", workspace_id),
        Some(&invitee_token),
        None,
        StatusCode::OK,
    )
    .await;

    ctx.cleanup(&[&owner_email, &invitee_email]).await;
}

#[tokio::test]
async fn test_invites_rejected_on_personal_workspaces() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let workspace = ctx
        .send_expect(
            Method::POST,
            "/v1/workspaces",
            Some(&token),
            Some(json!({"name": "Mine", "type": "PERSONAL"})),
            StatusCode::CREATED,
        )
        .await;

    let response = ctx
        .send(
            Method::POST,
            &format!("/v1/workspaces/{}/members", workspace["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({"email": "someone@example.com"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_membership_mutation_rules() {
    let ctx = require_db!();
    let (owner_sub, owner_email) = ctx.fresh_actor();
    let (admin_a_sub, admin_a_email) = ctx.fresh_actor();
    let (_, admin_b_email) = ctx.fresh_actor();
    let (member_sub, member_email) = ctx.fresh_actor();
    let owner_token = ctx.token_for(&owner_sub, &owner_email);

    let workspace = create_professional(&ctx, &owner_token).await;
    let workspace_id = workspace["id"].as_str().unwrap().to_string();
    let members_uri = format!("/v1/workspaces/{}/members", workspace_id);

    for (email, role) in [
        (&admin_a_email, "ADMIN"),
        (&admin_b_email, "ADMIN"),
        (&member_email, "MEMBER"),
    ] {
        ctx.send_expect(
            Method::POST,
            &members_uri,
            Some(&owner_token),
            Some(json!({"email": email, "role": role})),
            StatusCode::CREATED,
        )
        .await;
    }

    // Listing orders OWNER first, then ADMIN, MEMBER, GUEST
    let members = ctx
        .send_expect(Method::GET, &members_uri, Some(&owner_token), None, StatusCode::OK)
        .await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 4);
    assert_eq!(members[0]["role"], "OWNER");

    let membership_id_for = |email: &str| {
        members
            .iter()
            .find(|m| m["email"] == *email)
            .and_then(|m| m["id"].as_str())
            .map(str::to_string)
            .expect("member not listed")
    };
    let owner_membership = membership_id_for(&owner_email);
    let admin_b_membership = membership_id_for(&admin_b_email);
    let member_membership = membership_id_for(&member_email);

    let admin_a_token = ctx.token_for(&admin_a_sub, &admin_a_email);
    signup(&ctx, &admin_a_token).await;
    let member_token = ctx.token_for(&member_sub, &member_email);
    signup(&ctx, &member_token).await;

    // Admin on admin: insufficient rank
    let response = ctx
        .send(
            Method::PUT,
            &format!("{}/{}", members_uri, admin_b_membership),
            Some(&admin_a_token),
            Some(json!({"role": "MEMBER"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner is immutable, even for admins
    let response = ctx
        .send(
            Method::PUT,
            &format!("{}/{}", members_uri, owner_membership),
            Some(&admin_a_token),
            Some(json!({"role": "MEMBER"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // ...and for the owner themselves
    let response = ctx
        .send(
            Method::DELETE,
            &format!("{}/{}", members_uri, owner_membership),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Plain members cannot mutate anyone
    let response = ctx
        .send(
            Method::DELETE,
            &format!("{}/{}", members_uri, admin_b_membership),
            Some(&member_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins can mutate members and guests
    let updated = ctx
        .send_expect(
            Method::PUT,
            &format!("{}/{}", members_uri, member_membership),
            Some(&admin_a_token),
            Some(json!({"role": "GUEST"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["role"], "GUEST");

    // Owners can remove admins
    let response = ctx
        .send(
            Method::DELETE,
            &format!("{}/{}", members_uri, admin_b_membership),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    ctx.cleanup(&[&owner_email, &admin_a_email, &admin_b_email, &member_email])
        .await;
}

#[tokio::test]
async fn test_only_the_owner_can_delete_a_workspace() {
    let ctx = require_db!();
    let (owner_sub, owner_email) = ctx.fresh_actor();
    let (admin_sub, admin_email) = ctx.fresh_actor();
    let owner_token = ctx.token_for(&owner_sub, &owner_email);

    let workspace = create_professional(&ctx, &owner_token).await;
    let workspace_id = workspace["id"].as_str().unwrap().to_string();
    let workspace_uri = format!("/v1/workspaces/{}", workspace_id);

    ctx.send_expect(
        Method::POST,
        &format!("{}/members", workspace_uri),
        Some(&owner_token),
        Some(json!({"email": admin_email, "role": "ADMIN"})),
        StatusCode::CREATED,
    )
    .await;

    let admin_token = ctx.token_for(&admin_sub, &admin_email);
    signup(&ctx, &admin_token).await;

    // Admins can update metadata but not delete
    ctx.send_expect(
        Method::PUT,
        &workspace_uri,
        Some(&admin_token),
        Some(json!({"description": "renamed by admin"})),
        StatusCode::OK,
    )
    .await;

    let response = ctx
        .send(Method::DELETE, &workspace_uri, Some(&admin_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .send(Method::DELETE, &workspace_uri, Some(&owner_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    ctx.cleanup(&[&owner_email, &admin_email]).await;
}

#[tokio::test]
async fn test_personal_alias_provisions_deterministic_workspace() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let profile = signup(&ctx, &token).await;
    let user_id: Uuid = profile["id"].as_str().unwrap().parse().unwrap();

    // Listing with the alias before provisioning finds nothing and creates
    // nothing
    let tasks = ctx
        .send_expect(
            Method::GET,
            "/v1/tasks?workspaceId=personal",
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);

    // First task creation provisions the personal workspace
    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "first"})),
            StatusCode::CREATED,
        )
        .await;

    let expected = personal_workspace_id(user_id).to_string();
    assert_eq!(task["workspaceId"], expected);

    // A second task reuses it
    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "second", "workspaceId": "personal"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(task["workspaceId"], expected);

    // And it shows up in the workspace list as PERSONAL
    let workspaces = ctx
        .send_expect(Method::GET, "/v1/workspaces", Some(&token), None, StatusCode::OK)
        .await;
    let workspaces = workspaces.as_array().unwrap();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0]["type"], "PERSONAL");
    assert_eq!(workspaces[0]["id"], expected);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_tasks_are_invisible_across_users() {
    let ctx = require_db!();
    let (a_sub, a_email) = ctx.fresh_actor();
    let (b_sub, b_email) = ctx.fresh_actor();
    let a_token = ctx.token_for(&a_sub, &a_email);
    let b_token = ctx.token_for(&b_sub, &b_email);
    signup(&ctx, &b_token).await;

    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&a_token),
            Some(json!({"title": "private"})),
            StatusCode::CREATED,
        )
        .await;
    let task_uri = format!("/v1/tasks/{}", task["id"].as_str().unwrap());

    for method in [Method::GET, Method::DELETE] {
        let response = ctx.send(method, &task_uri, Some(&b_token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // Still there for the owner
    ctx.send_expect(Method::GET, &task_uri, Some(&a_token), None, StatusCode::OK)
        .await;

    ctx.cleanup(&[&a_email, &b_email]).await;
}

#[tokio::test]
async fn test_toggle_status_flips_back_and_forth() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "toggle me"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(task["completed"], false);

    let status_uri = format!("/v1/tasks/{}/status", task["id"].as_str().unwrap());

    let toggled = ctx
        .send_expect(Method::PATCH, &status_uri, Some(&token), None, StatusCode::OK)
        .await;
    assert_eq!(toggled["completed"], true);

    let toggled = ctx
        .send_expect(Method::PATCH, &status_uri, Some(&token), None, StatusCode::OK)
        .await;
    assert_eq!(toggled["completed"], false);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_due_date_cleared_only_by_explicit_null() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "due", "dueDate": "2026-09-01T00:00:00Z"})),
            StatusCode::CREATED,
        )
        .await;
    let task_uri = format!("/v1/tasks/{}", task["id"].as_str().unwrap());

    // An update that doesn't mention dueDate leaves it alone
    let updated = ctx
        .send_expect(
            Method::PUT,
            &task_uri,
            Some(&token),
            Some(json!({"title": "renamed"})),
            StatusCode::OK,
        )
        .await;
    assert!(updated["dueDate"].is_string());

    // Explicit null clears it
    let updated = ctx
        .send_expect(
            Method::PUT,
            &task_uri,
            Some(&token),
            Some(json!({"dueDate": null})),
            StatusCode::OK,
        )
        .await;
    assert!(updated["dueDate"].is_null());

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_unknown_tag_ids_are_dropped() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);

    let tag_name = format!("tag-{}", Uuid::new_v4().simple());
    let tag = ctx
        .send_expect(
            Method::POST,
            "/v1/tags",
            Some(&token),
            Some(json!({"name": tag_name})),
            StatusCode::CREATED,
        )
        .await;
    let tag_id = tag["id"].as_str().unwrap();

    let task = ctx
        .send_expect(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({
                "title": "tagged",
                "tags": [tag_id, Uuid::new_v4()]
            })),
            StatusCode::CREATED,
        )
        .await;

    let tags = task["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["id"], *tag_id);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_task_validation_failures() {
    let ctx = require_db!();
    let (sub, email) = ctx.fresh_actor();
    let token = ctx.token_for(&sub, &email);
    signup(&ctx, &token).await;

    // Empty title
    let response = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": ""})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Garbage workspace reference
    let response = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "x", "workspaceId": "not-a-workspace"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Explicit id that references nothing
    let response = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({"title": "x", "workspaceId": Uuid::new_v4()})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup(&[&email]).await;
}

#[tokio::test]
async fn test_profile_updates_are_self_only() {
    let ctx = require_db!();
    let (a_sub, a_email) = ctx.fresh_actor();
    let (b_sub, b_email) = ctx.fresh_actor();
    let a_token = ctx.token_for(&a_sub, &a_email);
    let b_token = ctx.token_for(&b_sub, &b_email);

    let a_profile = signup(&ctx, &a_token).await;
    signup(&ctx, &b_token).await;
    let a_id = a_profile["id"].as_str().unwrap();

    let updated = ctx
        .send_expect(
            Method::PUT,
            &format!("/v1/users/{}", a_id),
            Some(&a_token),
            Some(json!({"jobTitle": "Beekeeper"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["jobTitle"], "Beekeeper");

    let response = ctx
        .send(
            Method::PUT,
            &format!("/v1/users/{}", a_id),
            Some(&b_token),
            Some(json!({"jobTitle": "Impostor"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup(&[&a_email, &b_email]).await;
}
