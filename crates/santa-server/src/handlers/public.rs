//! Handlers that need no admin session.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/game` | Current game state |
//! | `POST` | `/api/participants` | Body: `{"name","email","wishlist"?}`; 201 |
//! | `GET`  | `/api/participants/{email}` | Recipient shown once drawn |
//! | `POST` | `/api/participants/check` | Body: `{"email"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use santa_core::{
  exchange::ParticipantView, game::GameState, participant::NewParticipant,
  store::ExchangeStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::Error};

/// `GET /api/game`
pub async fn game<S>(State(state): State<AppState<S>>) -> Result<Json<GameState>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.game_state().await?))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub wishlist: Option<String>,
}

/// `POST /api/participants`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: ExchangeStore,
{
  let input = NewParticipant::new(&body.name, &body.email, body.wishlist.as_deref())?;
  let participant = state.exchange.register(input).await?;
  Ok((StatusCode::CREATED, Json(participant)))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

/// `GET /api/participants/{email}`
pub async fn lookup<S>(
  State(state): State<AppState<S>>,
  Path(email): Path<String>,
) -> Result<Json<ParticipantView>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.lookup(&email).await?))
}

#[derive(Debug, Deserialize)]
pub struct CheckBody {
  #[serde(default)]
  pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
  pub exists: bool,
}

/// `POST /api/participants/check`
pub async fn check<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CheckBody>,
) -> Result<Json<CheckResponse>, Error>
where
  S: ExchangeStore,
{
  if body.email.trim().is_empty() {
    return Err(Error::BadRequest("email is required".into()));
  }
  let exists = state.exchange.email_registered(&body.email).await?;
  Ok(Json(CheckResponse { exists }))
}
