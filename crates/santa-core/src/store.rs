//! The `ExchangeStore` trait.
//!
//! Implemented by storage backends (e.g. `santa-store-sqlite`). The
//! orchestration layer in [`crate::exchange`] depends on this abstraction,
//! not on any concrete backend. Any engine where each participant optionally
//! references exactly one other participant, never itself, is conformant.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  draw::Pairing,
  game::{GameState, StateTransition},
  participant::{NewParticipant, Participant, ParticipantId, ParticipantUpdate},
};

/// Abstraction over the participant store and the game state store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ExchangeStore: Send + Sync {
  /// Backend error; domain failures must convert into the matching
  /// [`crate::Error`] variant.
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Game state ────────────────────────────────────────────────────────

  /// The single current game state.
  fn current_state(
    &self,
  ) -> impl Future<Output = Result<GameState, Self::Error>> + Send + '_;

  /// Every recorded state transition, oldest first.
  fn state_history(
    &self,
  ) -> impl Future<Output = Result<Vec<StateTransition>, Self::Error>> + Send + '_;

  /// Set (or clear) the gift price limit.
  fn set_price_limit(
    &self,
    price_limit: Option<f64>,
  ) -> impl Future<Output = Result<GameState, Self::Error>> + Send + '_;

  /// Move the game back to `registration`, clearing `drawn_at`.
  fn open_registration(
    &self,
  ) -> impl Future<Output = Result<GameState, Self::Error>> + Send + '_;

  // ── Participants ──────────────────────────────────────────────────────

  /// Persist a new participant. Fails if registration is closed or the email
  /// is already taken.
  fn add_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  fn get_participant(
    &self,
    id: ParticipantId,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// Exact, case-sensitive email lookup.
  fn find_participant_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  /// All participants in registration order. The order is stable across
  /// calls and determines how the draw indexes givers.
  fn list_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Replace a participant's name, email and wishlist.
  fn update_participant(
    &self,
    id: ParticipantId,
    update: ParticipantUpdate,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  // ── Assignment ────────────────────────────────────────────────────────

  /// The participant `giver` was assigned to, if a draw has run.
  fn recipient_of(
    &self,
    giver: ParticipantId,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// All persisted `(giver, recipient)` edges in registration order.
  fn pairings(
    &self,
  ) -> impl Future<Output = Result<Vec<Pairing<ParticipantId>>, Self::Error>> + Send + '_;

  /// Atomically persist a draw and mark the game completed.
  ///
  /// Fails without writing anything if the state is no longer at
  /// `expected_version`, the game is already completed, or `pairings` does
  /// not cover exactly the current participants.
  fn commit_draw<'a>(
    &'a self,
    expected_version: u64,
    pairings: &'a [Pairing<ParticipantId>],
    drawn_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<GameState, Self::Error>> + Send + 'a;

  /// Clear every assignment, delete every participant and set the status to
  /// `reset`, in one transaction.
  fn reset(&self) -> impl Future<Output = Result<GameState, Self::Error>> + Send + '_;
}
