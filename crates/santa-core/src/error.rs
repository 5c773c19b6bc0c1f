//! Error types for `santa-core`.

use thiserror::Error;

use crate::{draw::DrawError, game::GameStatus, participant::ParticipantId};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Draw(#[from] DrawError),

  #[error("the draw has already been completed")]
  DrawAlreadyCompleted,

  #[error("registration is closed (game status: {0})")]
  RegistrationClosed(GameStatus),

  #[error("a participant with email {0:?} is already registered")]
  DuplicateEmail(String),

  #[error("participant not found: {0}")]
  ParticipantNotFound(ParticipantId),

  #[error("no participant registered with email {0:?}")]
  UnknownEmail(String),

  #[error("invalid input: {0}")]
  Validation(String),

  /// The game state or participant set changed between reading it and
  /// committing a draw.
  #[error("concurrent modification: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
