//! JSON HTTP API for the Secret Santa exchange.
//!
//! Exposes an axum [`Router`] backed by any [`ExchangeStore`]. Public routes
//! cover registration and lookup; `/api/admin/*` routes require a bearer token
//! issued by `POST /api/admin/login`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod settings;

pub use error::Error;
pub use settings::ServerConfig;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use santa_core::{exchange::Exchange, store::ExchangeStore};
use tower_http::trace::TraceLayer;

use auth::{AdminAuth, SessionRegistry};
use handlers::{admin, public, session};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ExchangeStore> {
  pub exchange: Arc<Exchange<S>>,
  pub auth:     Arc<AdminAuth>,
  pub sessions: Arc<SessionRegistry>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ExchangeStore + Clone + 'static,
{
  Router::new()
    // Public
    .route("/api/game", get(public::game::<S>))
    .route("/api/participants", post(public::register::<S>))
    .route("/api/participants/check", post(public::check::<S>))
    .route("/api/participants/{email}", get(public::lookup::<S>))
    // Session
    .route("/api/admin/login", post(session::login::<S>))
    .route("/api/admin/logout", post(session::logout::<S>))
    // Admin
    .route("/api/admin/participants", get(admin::list::<S>))
    .route(
      "/api/admin/participants/{id}",
      get(admin::get_one::<S>).put(admin::update::<S>),
    )
    .route("/api/admin/game-state", get(admin::game_state::<S>))
    .route("/api/admin/history", get(admin::history::<S>))
    .route("/api/admin/pairs", get(admin::pairs::<S>))
    .route("/api/admin/draw", post(admin::draw::<S>))
    .route("/api/admin/reset", post(admin::reset::<S>))
    .route("/api/admin/price-limit", post(admin::price_limit::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
