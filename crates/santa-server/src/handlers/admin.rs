//! Handlers under `/api/admin`. Every one requires an [`Admin`] session.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/participants` | Ascending id |
//! | `GET`  | `/participants/{id}` | 404 if not found |
//! | `PUT`  | `/participants/{id}` | Body: `{"name","email","wishlist"?}` |
//! | `GET`  | `/game-state` | |
//! | `GET`  | `/history` | Oldest first |
//! | `GET`  | `/pairs` | Empty until drawn |
//! | `POST` | `/draw` | 409 if already drawn |
//! | `POST` | `/reset` | Deletes participants, reopens registration |
//! | `POST` | `/price-limit` | Body: `{"price_limit": 25}` or `"25"` |

use axum::{
  Json,
  extract::{Path, State},
};
use santa_core::{
  exchange::{DrawOutcome, PairView},
  game::{GameState, StateTransition},
  participant::{Participant, ParticipantId, ParticipantUpdate},
  store::ExchangeStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppState, auth::Admin, error::Error};

// ─── Participants ─────────────────────────────────────────────────────────────

/// `GET /api/admin/participants`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
) -> Result<Json<Vec<Participant>>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.participants(&admin.session).await?))
}

/// `GET /api/admin/participants/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
  Path(id): Path<i64>,
) -> Result<Json<Participant>, Error>
where
  S: ExchangeStore,
{
  let participant = state
    .exchange
    .participant(&admin.session, ParticipantId(id))
    .await?;
  Ok(Json(participant))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub wishlist: Option<String>,
}

/// `PUT /api/admin/participants/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Participant>, Error>
where
  S: ExchangeStore,
{
  let update = ParticipantUpdate::new(&body.name, &body.email, body.wishlist.as_deref())?;
  let participant = state
    .exchange
    .update_participant(&admin.session, ParticipantId(id), update)
    .await?;
  Ok(Json(participant))
}

// ─── Game ─────────────────────────────────────────────────────────────────────

/// `GET /api/admin/game-state`
pub async fn game_state<S>(
  State(state): State<AppState<S>>,
  _admin: Admin,
) -> Result<Json<GameState>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.game_state().await?))
}

/// `GET /api/admin/history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
) -> Result<Json<Vec<StateTransition>>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.history(&admin.session).await?))
}

/// `GET /api/admin/pairs`
pub async fn pairs<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
) -> Result<Json<Vec<PairView>>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.pairs(&admin.session).await?))
}

/// `POST /api/admin/draw`
pub async fn draw<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
) -> Result<Json<DrawOutcome>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.run_draw(&admin.session).await?))
}

/// `POST /api/admin/reset`
pub async fn reset<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
) -> Result<Json<GameState>, Error>
where
  S: ExchangeStore,
{
  Ok(Json(state.exchange.reset(&admin.session).await?))
}

// ─── Price limit ──────────────────────────────────────────────────────────────

/// Accept a JSON number or a string holding one.
pub fn parse_price_limit(value: &Value) -> Result<f64, Error> {
  let parsed = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  parsed.ok_or_else(|| Error::BadRequest("price limit must be a number".into()))
}

/// `POST /api/admin/price-limit`
pub async fn price_limit<S>(
  State(state): State<AppState<S>>,
  admin: Admin,
  Json(body): Json<Value>,
) -> Result<Json<GameState>, Error>
where
  S: ExchangeStore,
{
  let price_limit = parse_price_limit(&body["price_limit"])?;
  Ok(Json(state.exchange.set_price_limit(&admin.session, price_limit).await?))
}
