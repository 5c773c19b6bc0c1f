use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::Duration;
use santa_core::{
  draw::{AssignmentEngine, DrawPolicy, RngSource},
  exchange::Exchange,
};
use santa_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{
  AppState,
  auth::{AdminAuth, SessionRegistry, hash_admin_code},
  router,
};

const CODE: &str = "secret";

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let engine = AssignmentEngine::new(DrawPolicy::default(), RngSource::from_seed(2024));
  AppState {
    exchange: Arc::new(Exchange::new(Arc::new(store), engine)),
    auth:     Arc::new(AdminAuth::new(hash_admin_code(CODE).unwrap())),
    sessions: Arc::new(SessionRegistry::new(Duration::minutes(30))),
  }
}

async fn call(
  state:  &AppState<SqliteStore>,
  method: &str,
  uri:    &str,
  token:  Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn login(state: &AppState<SqliteStore>) -> String {
  let (status, body) =
    call(state, "POST", "/api/admin/login", None, Some(json!({ "code": CODE }))).await;
  assert_eq!(status, StatusCode::OK);
  body["token"].as_str().unwrap().to_string()
}

async fn register(state: &AppState<SqliteStore>, name: &str) -> Value {
  let email = format!("{}@example.com", name.to_lowercase());
  let (status, body) = call(
    state,
    "POST",
    "/api/participants",
    None,
    Some(json!({ "name": name, "email": email, "wishlist": "socks" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ── Public ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_game_is_open_for_registration() {
  let state = make_state().await;
  let (status, body) = call(&state, "GET", "/api/game", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "registration");
  assert!(body["drawn_at"].is_null());
  assert!(body["price_limit"].is_null());
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
  let state = make_state().await;

  let alice = register(&state, "Alice").await;
  assert_eq!(alice["name"], "Alice");
  assert_eq!(alice["email"], "alice@example.com");
  assert!(alice["recipient_id"].is_null());

  let (status, body) = call(
    &state,
    "POST",
    "/api/participants",
    None,
    Some(json!({ "name": "  ", "email": "x@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, _) = call(
    &state,
    "POST",
    "/api/participants",
    None,
    Some(json!({ "name": "Other Alice", "email": "alice@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn check_reports_whether_email_is_registered() {
  let state = make_state().await;
  register(&state, "Bob").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/participants/check",
    None,
    Some(json!({ "email": "bob@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["exists"], true);

  let (_, body) = call(
    &state,
    "POST",
    "/api/participants/check",
    None,
    Some(json!({ "email": "nobody@example.com" })),
  )
  .await;
  assert_eq!(body["exists"], false);

  let (status, _) =
    call(&state, "POST", "/api/participants/check", None, Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_hides_recipient_until_drawn() {
  let state = make_state().await;
  register(&state, "Alice").await;
  register(&state, "Bob").await;

  let (status, _) = call(&state, "GET", "/api/participants/zed@example.com", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) =
    call(&state, "GET", "/api/participants/alice@example.com", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["participant"]["name"], "Alice");
  assert!(body["recipient"].is_null());
  assert_eq!(body["game"]["status"], "registration");

  let token = login(&state).await;
  let (status, _) = call(&state, "POST", "/api/admin/draw", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = call(&state, "GET", "/api/participants/alice@example.com", None, None).await;
  assert_eq!(body["recipient"]["name"], "Bob");
  assert_eq!(body["recipient"]["wishlist"], "socks");
  assert_eq!(body["game"]["status"], "completed");
}

// ── Sessions ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_a_session() {
  let state = make_state().await;

  for (method, uri) in [
    ("GET", "/api/admin/participants"),
    ("GET", "/api/admin/pairs"),
    ("POST", "/api/admin/draw"),
    ("POST", "/api/admin/reset"),
  ] {
    let (status, body) = call(&state, method, uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = call(&state, method, uri, Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
  }
}

#[tokio::test]
async fn wrong_admin_code_is_rejected() {
  let state = make_state().await;
  let (status, body) =
    call(&state, "POST", "/api/admin/login", None, Some(json!({ "code": "guess" }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body.get("token").is_none());
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let state = make_state().await;
  let token = login(&state).await;

  let (status, _) = call(&state, "GET", "/api/admin/game-state", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = call(&state, "POST", "/api/admin/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(&state, "GET", "/api/admin/game-state", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Draw lifecycle ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn draw_reset_cycle() {
  let state = make_state().await;
  for name in ["Alice", "Bob", "Carol", "Dave"] {
    register(&state, name).await;
  }
  let token = login(&state).await;

  let (status, pairs) = call(&state, "GET", "/api/admin/pairs", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(pairs, json!([]));

  let (status, outcome) = call(&state, "POST", "/api/admin/draw", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["state"]["status"], "completed");
  let pairings = outcome["pairings"].as_array().unwrap();
  assert_eq!(pairings.len(), 4);
  for p in pairings {
    assert_ne!(p["giver"], p["recipient"]);
  }

  let (_, pairs) = call(&state, "GET", "/api/admin/pairs", Some(&token), None).await;
  let pairs = pairs.as_array().unwrap();
  assert_eq!(pairs.len(), 4);
  for pair in pairs {
    assert_ne!(pair["giver"]["email"], pair["recipient"]["email"]);
  }

  let (status, _) = call(&state, "POST", "/api/admin/draw", Some(&token), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &state,
    "POST",
    "/api/participants",
    None,
    Some(json!({ "name": "Eve", "email": "eve@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = call(&state, "POST", "/api/admin/reset", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "registration");
  assert!(body["drawn_at"].is_null());

  let (_, participants) =
    call(&state, "GET", "/api/admin/participants", Some(&token), None).await;
  assert_eq!(participants, json!([]));

  let (_, history) = call(&state, "GET", "/api/admin/history", Some(&token), None).await;
  let statuses: Vec<&str> = history
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["status"].as_str().unwrap())
    .collect();
  assert_eq!(statuses, ["registration", "completed", "reset", "registration"]);

  register(&state, "Eve").await;
}

#[tokio::test]
async fn draw_with_one_participant_is_a_bad_request() {
  let state = make_state().await;
  register(&state, "Alice").await;
  let token = login(&state).await;

  let (status, body) = call(&state, "POST", "/api/admin/draw", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("at least 2"));

  let (_, game) = call(&state, "GET", "/api/game", None, None).await;
  assert_eq!(game["status"], "registration");
}

// ── Price limit ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn price_limit_accepts_numbers_and_strings() {
  let state = make_state().await;
  let token = login(&state).await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/admin/price-limit",
    Some(&token),
    Some(json!({ "price_limit": 25 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["price_limit"], 25.0);

  let (status, body) = call(
    &state,
    "POST",
    "/api/admin/price-limit",
    Some(&token),
    Some(json!({ "price_limit": "12.5" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["price_limit"], 12.5);

  for bad in [json!({ "price_limit": -1 }), json!({ "price_limit": "lots" }), json!({})] {
    let (status, _) =
      call(&state, "POST", "/api/admin/price-limit", Some(&token), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  let (_, game) = call(&state, "GET", "/api/game", None, None).await;
  assert_eq!(game["price_limit"], 12.5);
}

// ── Participant edits ──────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_edits_participants() {
  let state = make_state().await;
  let alice = register(&state, "Alice").await;
  register(&state, "Bob").await;
  let token = login(&state).await;
  let uri = format!("/api/admin/participants/{}", alice["participant_id"]);

  let (status, body) = call(&state, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"], "alice@example.com");

  let (status, body) = call(
    &state,
    "PUT",
    &uri,
    Some(&token),
    Some(json!({ "name": "Alice Smith", "email": "asmith@example.com", "wishlist": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Alice Smith");
  assert!(body["wishlist"].is_null());

  let (status, _) = call(
    &state,
    "PUT",
    &uri,
    Some(&token),
    Some(json!({ "name": "Alice", "email": "bob@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) =
    call(&state, "GET", "/api/admin/participants/999", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
