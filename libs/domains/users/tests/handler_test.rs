//! Handler tests for the users domain
//!
//! Drive the router with `oneshot` against the in-memory repository:
//! - status codes and JSON bodies
//! - bearer authentication and role gates
//! - outbox side effects of registration and role grants

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::{JwtAuth, JwtConfig};
use domain_users::outbox::OutboxEvent;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

const PASSWORD: &str = "Kickoff#2024";

struct TestApp {
    app: Router,
    repo: InMemoryUserRepository,
    jwt: JwtAuth,
}

impl TestApp {
    fn new() -> Self {
        let jwt = JwtAuth::new(&JwtConfig::new("handler-test-secret-that-is-long-enough"));
        let repo = InMemoryUserRepository::new();
        let service = UserService::new(repo.clone(), Arc::new(jwt.clone()));

        Self {
            app: handlers::router(service, jwt.clone()),
            repo,
            jwt,
        }
    }

    /// Insert a confirmed user and return it with a bearer token.
    async fn seed(&self, username: &str, role: Role, team_id: Option<Uuid>) -> (User, String) {
        let mut user = User::new(
            username.to_string(),
            format!("{username}@league.test"),
            format!("{username} Person"),
            "5550102030".to_string(),
            team_id,
        );
        user.role = role;
        user.email_confirmed = true;

        let user = self.repo.create(user, vec![]).await.unwrap();
        let token = self.jwt.issue(&user).unwrap();
        (user, token)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "password": PASSWORD,
        "full_name": "Kim Keeper",
        "phone_number": "555-010-2030",
        "email": format!("{username}@league.test"),
        "role_name": "Player",
    })
}

#[tokio::test]
async fn test_register_confirm_and_login() {
    let t = TestApp::new();

    let (status, body) = t
        .send("POST", "/account/create", None, Some(registration("kim")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_auth_successful"], true);
    assert_eq!(body["user"]["username"], "kim");

    let login = json!({ "username": "kim", "password": PASSWORD });
    let (status, body) = t.send("POST", "/account/login", None, Some(login.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let messages = t.repo.outbox().messages().await;
    let OutboxEvent::SendEmail(email) = &messages[0].event else {
        panic!("registration should queue an email");
    };
    let link = email
        .content
        .lines()
        .find(|line| line.starts_with("http"))
        .unwrap();
    let query = link.split_once('?').unwrap().1;

    let (status, _) = t
        .send("GET", &format!("/account/emailconfirmation?{query}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.send("POST", "/account/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "kim");

    let claims = t.jwt.verify_token(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, body["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let t = TestApp::new();
    t.send("POST", "/account/create", None, Some(registration("kim")))
        .await;

    let (status, _) = t
        .send(
            "POST",
            "/account/login",
            None,
            Some(json!({ "username": "kim", "password": "Wrong#2024" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let t = TestApp::new();
    t.send("POST", "/account/create", None, Some(registration("kim")))
        .await;

    let mut again = registration("kim");
    again["email"] = json!("another@league.test");
    let (status, body) = t.send("POST", "/account/create", None, Some(again)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1007);
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let t = TestApp::new();
    let mut input = registration("kim");
    input["email"] = json!("not-an-email");

    let (status, body) = t.send("POST", "/account/create", None, Some(input)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn test_user_routes_require_token() {
    let t = TestApp::new();

    let (status, _) = t.send("GET", "/user/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.send("GET", "/user/roles", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_user_found_and_missing() {
    let t = TestApp::new();
    let (player, token) = t.seed("player", Role::Player, None).await;

    let (status, body) = t
        .send("GET", &format!("/user/{}", player.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_name"], "Player");
    assert!(body.get("password_hash").is_none());

    let (status, _) = t
        .send("GET", &format!("/user/{}", Uuid::now_v7()), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t.send("GET", "/user/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_UUID");
}

#[tokio::test]
async fn test_get_user_by_username() {
    let t = TestApp::new();
    let (_, token) = t.seed("coach", Role::HeadCoach, None).await;

    let (status, body) = t.send("GET", "/user/username/COACH", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "coach");

    let (status, _) = t.send("GET", "/user/username/nobody", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unconfirmed_role_cannot_read_users() {
    let t = TestApp::new();
    let (newbie, token) = t.seed("newbie", Role::UnconfirmedUser, None).await;

    let (status, _) = t
        .send("GET", &format!("/user/{}", newbie.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_users_role_gate() {
    let t = TestApp::new();
    let (_, assistant) = t.seed("assistant", Role::AssistantCoach, None).await;
    let (_, player) = t.seed("player", Role::Player, None).await;

    let (status, body) = t.send("GET", "/user?limit=10", Some(&assistant), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, _) = t.send("GET", "/user", Some(&player), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_user_role_requires_manager() {
    let t = TestApp::new();
    let (_, coach) = t.seed("coach", Role::HeadCoach, None).await;
    let (parent, parent_token) = t.seed("parent", Role::Parent, Some(Uuid::now_v7())).await;

    let (status, body) = t
        .send("GET", &format!("/user/role/{}", parent.id), Some(&coach), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "Parent");

    let (status, _) = t
        .send("GET", &format!("/user/role/{}", parent.id), Some(&parent_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_head_coach_edits_player() {
    let t = TestApp::new();
    let (_, coach) = t.seed("coach", Role::HeadCoach, None).await;
    let (player, _) = t.seed("player", Role::Player, None).await;

    let (status, body) = t
        .send(
            "PUT",
            &format!("/user/{}", player.id),
            Some(&coach),
            Some(json!({ "full_name": "Renamed", "email": "", "phone_number": null })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Renamed");
    assert_eq!(body["email"], "player@league.test");
}

#[tokio::test]
async fn test_assistant_coach_cannot_edit_head_coach() {
    let t = TestApp::new();
    let (coach, _) = t.seed("coach", Role::HeadCoach, None).await;
    let (_, assistant) = t.seed("assistant", Role::AssistantCoach, None).await;

    let (status, body) = t
        .send(
            "PUT",
            &format!("/user/{}", coach.id),
            Some(&assistant),
            Some(json!({ "full_name": "Hacked" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_players_and_unconfirmed_cannot_alter_own_account() {
    let t = TestApp::new();
    let (player, player_token) = t.seed("player", Role::Player, None).await;
    let (newbie, newbie_token) = t.seed("newbie", Role::UnconfirmedUser, None).await;

    let (status, _) = t
        .send(
            "PUT",
            &format!("/user/{}", player.id),
            Some(&player_token),
            Some(json!({ "team_id": Uuid::now_v7() })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send(
            "PUT",
            &format!("/user/{}", newbie.id),
            Some(&newbie_token),
            Some(json!({ "email": "elsewhere@league.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send("DELETE", &format!("/user/{}", player.id), Some(&player_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unchanged = t.repo.get_by_id(player.id).await.unwrap().unwrap();
    assert_eq!(unchanged.team_id, None);
}

#[tokio::test]
async fn test_parent_edits_own_account() {
    let t = TestApp::new();
    let (parent, token) = t.seed("parent", Role::Parent, Some(Uuid::now_v7())).await;

    let (status, body) = t
        .send(
            "PUT",
            &format!("/user/{}", parent.id),
            Some(&token),
            Some(json!({ "phone_number": "555-999-0000" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone_number"], "555-999-0000");
}

#[tokio::test]
async fn test_league_manager_cannot_delete_admin() {
    let t = TestApp::new();
    let (admin, admin_token) = t.seed("admin", Role::Admin, None).await;
    let (manager, manager_token) = t.seed("manager", Role::LeagueManager, None).await;

    let (status, _) = t
        .send("DELETE", &format!("/user/{}", admin.id), Some(&manager_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send("DELETE", &format!("/user/{}", manager.id), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    let (status, _) = t
        .send("DELETE", &format!("/user/{}", manager.id), Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_parent_grant_queues_carpool_registration() {
    let t = TestApp::new();
    let (_, coach) = t.seed("coach", Role::HeadCoach, None).await;
    let team_id = Uuid::now_v7();
    let (newbie, _) = t.seed("newbie", Role::UnconfirmedUser, Some(team_id)).await;

    let (status, body) = t
        .send(
            "PUT",
            &format!("/user/role/{}", newbie.id),
            Some(&coach),
            Some(json!({ "role_name": "Parent" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_name"], "Parent");

    let messages = t.repo.outbox().messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].event,
        OutboxEvent::RegisterCarpoolRecipient {
            user_id: newbie.id,
            team_id,
            bearer_token: coach,
        }
    );
}

#[tokio::test]
async fn test_empty_grant_approves_requested_role() {
    let t = TestApp::new();
    let (_, manager) = t.seed("manager", Role::LeagueManager, None).await;
    let (mut pending, _) = t.seed("pending", Role::UnconfirmedUser, None).await;
    pending.requested_role = Some(Role::AssistantCoach);
    t.repo.update(pending.clone(), vec![]).await.unwrap();

    let (status, body) = t
        .send(
            "PUT",
            &format!("/user/role/{}", pending.id),
            Some(&manager),
            Some(json!({})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_name"], "AssistantCoach");
    assert_eq!(body["requested_role"], Value::Null);
}

#[tokio::test]
async fn test_assistant_coach_cannot_grant_roles() {
    let t = TestApp::new();
    let (_, assistant) = t.seed("assistant", Role::AssistantCoach, None).await;
    let (player, _) = t.seed("player", Role::Player, None).await;

    let (status, _) = t
        .send(
            "PUT",
            &format!("/user/role/{}", player.id),
            Some(&assistant),
            Some(json!({ "role_name": "Parent" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_catalog() {
    let t = TestApp::new();
    let (_, token) = t.seed("player", Role::Player, None).await;

    let (status, body) = t.send("GET", "/user/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);

    let (status, body) = t.send("GET", "/user/roles/HeadCoach", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Head Coach");

    let (status, _) = t.send("GET", "/user/roles/Referee", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
