//! Game state: the single current phase of the exchange.
//!
//! Exactly one [`GameState`] is current. Every transition bumps its
//! `version`, which lets a draw detect that the state moved underneath it,
//! and is appended to a history log as a [`StateTransition`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
  Registration,
  Completed,
  Reset,
}

impl GameStatus {
  pub fn accepts_registrations(self) -> bool { !matches!(self, Self::Completed) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
  pub version:     u64,
  pub status:      GameStatus,
  /// Present exactly when `status` is [`GameStatus::Completed`].
  pub drawn_at:    Option<DateTime<Utc>>,
  pub price_limit: Option<f64>,
  pub updated_at:  DateTime<Utc>,
}

impl GameState {
  pub fn is_completed(&self) -> bool { self.status == GameStatus::Completed }
}

/// One entry of the append-only game state log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
  pub version:     u64,
  pub status:      GameStatus,
  pub drawn_at:    Option<DateTime<Utc>>,
  pub price_limit: Option<f64>,
  pub recorded_at: DateTime<Utc>,
}

/// Accept a gift price limit if it is a finite, non-negative amount.
pub fn validate_price_limit(value: f64) -> Result<f64> {
  if !value.is_finite() {
    return Err(Error::Validation("price limit must be a number".into()));
  }
  if value < 0.0 {
    return Err(Error::Validation("price limit cannot be negative".into()));
  }
  Ok(value)
}
