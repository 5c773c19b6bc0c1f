//! Admin login and logout.

use axum::{Json, extract::State, http::StatusCode};
use santa_core::{session::AdminSession, store::ExchangeStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AppState, auth::Admin, error::Error};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token:   String,
  pub session: AdminSession,
}

/// `POST /api/admin/login`, body `{"code":"..."}`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, Error>
where
  S: ExchangeStore,
{
  if let Err(e) = state.auth.verify(&body.code) {
    warn!("admin login rejected");
    return Err(e);
  }
  let (token, session) = state.sessions.issue();
  info!(session = %session.session_id, "admin logged in");
  Ok(Json(LoginResponse { token, session }))
}

/// `POST /api/admin/logout`
pub async fn logout<S>(State(state): State<AppState<S>>, admin: Admin) -> StatusCode
where
  S: ExchangeStore,
{
  state.sessions.revoke(&admin.token);
  info!(session = %admin.session.session_id, "admin logged out");
  StatusCode::NO_CONTENT
}
