//! Error type for `santa-store-sqlite`.

use santa_core::{game::GameStatus, participant::ParticipantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected column value: {0}")]
  Decode(String),

  #[error("participant not found: {0}")]
  ParticipantNotFound(ParticipantId),

  #[error("a participant with email {0:?} is already registered")]
  DuplicateEmail(String),

  #[error("registration is closed (game status: {0})")]
  RegistrationClosed(GameStatus),

  #[error("the draw has already been completed")]
  DrawAlreadyCompleted,

  #[error("game state is at version {found}, expected {expected}")]
  StateChanged { expected: u64, found: u64 },

  #[error("participants changed since the draw was computed")]
  ParticipantSetChanged,

  #[error("invalid pairing: {0}")]
  InvalidPairing(String),

  /// The singleton game state row is missing.
  #[error("game state has not been initialised")]
  MissingState,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for santa_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::ParticipantNotFound(id) => Self::ParticipantNotFound(id),
      Error::DuplicateEmail(email) => Self::DuplicateEmail(email),
      Error::RegistrationClosed(status) => Self::RegistrationClosed(status),
      Error::DrawAlreadyCompleted => Self::DrawAlreadyCompleted,
      err @ (Error::StateChanged { .. } | Error::ParticipantSetChanged) => {
        Self::Conflict(err.to_string())
      }
      other => Self::Store(Box::new(other)),
    }
  }
}
