//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, statuses as their lowercase
//! names, identifiers as integers.

use chrono::{DateTime, Utc};
use santa_core::{
  game::{GameState, GameStatus, StateTransition},
  participant::{Participant, ParticipantId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── GameStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(status: GameStatus) -> &'static str {
  match status {
    GameStatus::Registration => "registration",
    GameStatus::Completed => "completed",
    GameStatus::Reset => "reset",
  }
}

pub fn decode_status(s: &str) -> Result<GameStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown game status: {s:?}")))
}

fn decode_version(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Decode(format!("negative version: {v}")))
}

// ─── Row structs ─────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawParticipant`].
pub const PARTICIPANT_COLUMNS: &str =
  "participant_id, name, email, wishlist, recipient_id, registered_at";

pub struct RawParticipant {
  pub participant_id: i64,
  pub name:           String,
  pub email:          String,
  pub wishlist:       Option<String>,
  pub recipient_id:   Option<i64>,
  pub registered_at:  String,
}

impl RawParticipant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id: row.get(0)?,
      name:           row.get(1)?,
      email:          row.get(2)?,
      wishlist:       row.get(3)?,
      recipient_id:   row.get(4)?,
      registered_at:  row.get(5)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id: ParticipantId(self.participant_id),
      name:           self.name,
      email:          self.email,
      wishlist:       self.wishlist,
      recipient_id:   self.recipient_id.map(ParticipantId),
      registered_at:  decode_dt(&self.registered_at)?,
    })
  }
}

pub struct RawGameState {
  pub version:     i64,
  pub status:      String,
  pub drawn_at:    Option<String>,
  pub price_limit: Option<f64>,
  pub updated_at:  String,
}

impl RawGameState {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version:     row.get(0)?,
      status:      row.get(1)?,
      drawn_at:    row.get(2)?,
      price_limit: row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }

  pub fn into_state(self) -> Result<GameState> {
    Ok(GameState {
      version:     decode_version(self.version)?,
      status:      decode_status(&self.status)?,
      drawn_at:    decode_opt_dt(self.drawn_at)?,
      price_limit: self.price_limit,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawTransition {
  pub version:     i64,
  pub status:      String,
  pub drawn_at:    Option<String>,
  pub price_limit: Option<f64>,
  pub recorded_at: String,
}

impl RawTransition {
  pub fn into_transition(self) -> Result<StateTransition> {
    Ok(StateTransition {
      version:     decode_version(self.version)?,
      status:      decode_status(&self.status)?,
      drawn_at:    decode_opt_dt(self.drawn_at)?,
      price_limit: self.price_limit,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn status_encoding_matches_strum_names() {
    for status in [GameStatus::Registration, GameStatus::Completed, GameStatus::Reset] {
      assert_eq!(encode_status(status), status.as_ref());
      assert_eq!(decode_status(encode_status(status)).unwrap(), status);
    }
    assert!(matches!(decode_status("drawn"), Err(Error::Decode(_))));
  }

  #[test]
  fn timestamps_round_trip() {
    let dt = Utc.with_ymd_and_hms(2025, 12, 24, 18, 30, 0).unwrap();
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn negative_version_is_rejected() {
    let raw = RawGameState {
      version:     -1,
      status:      "registration".into(),
      drawn_at:    None,
      price_limit: None,
      updated_at:  encode_dt(Utc::now()),
    };
    assert!(matches!(raw.into_state(), Err(Error::Decode(_))));
  }
}
