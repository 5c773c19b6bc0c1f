//! [`Exchange`]: orchestration over an [`ExchangeStore`].
//!
//! Public operations (registration, lookup) need no session. Admin
//! operations take an [`AdminSession`] explicitly. A draw reads the current
//! state and participants, runs the [`AssignmentEngine`], and commits the
//! pairing together with the status change in one store call that is checked
//! against the state version that was read.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result,
  draw::{AssignmentEngine, DrawMethod, Pairing, PermutationSource, RngSource},
  game::{GameState, StateTransition, validate_price_limit},
  participant::{
    NewParticipant, Participant, ParticipantId, ParticipantUpdate, RecipientInfo,
  },
  session::AdminSession,
  store::ExchangeStore,
};

/// What a participant sees on their own page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantView {
  pub participant: Participant,
  /// Only present once the draw is completed.
  pub recipient:   Option<RecipientInfo>,
  pub game:        GameState,
}

/// A giver together with the person they were assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairView {
  pub giver:     Participant,
  pub recipient: RecipientInfo,
}

/// Result of a committed draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawOutcome {
  pub state:    GameState,
  pub pairings: Vec<Pairing<ParticipantId>>,
  pub method:   DrawMethod,
  pub shuffles: usize,
}

pub struct Exchange<S, P = RngSource<ChaCha8Rng>> {
  store:  Arc<S>,
  engine: Mutex<AssignmentEngine<P>>,
}

impl<S, P> Exchange<S, P>
where
  S: ExchangeStore,
  P: PermutationSource + Send,
{
  pub fn new(store: Arc<S>, engine: AssignmentEngine<P>) -> Self {
    Self { store, engine: Mutex::new(engine) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Public ────────────────────────────────────────────────────────────────

  pub async fn game_state(&self) -> Result<GameState> {
    self.store.current_state().await.map_err(Into::into)
  }

  pub async fn register(&self, input: NewParticipant) -> Result<Participant> {
    let input = input.validated()?;
    let participant = self.store.add_participant(input).await.map_err(Into::into)?;
    info!(participant_id = %participant.participant_id, "participant registered");
    Ok(participant)
  }

  pub async fn email_registered(&self, email: &str) -> Result<bool> {
    let found = self
      .store
      .find_participant_by_email(email.trim())
      .await
      .map_err(Into::into)?;
    Ok(found.is_some())
  }

  /// The participant registered under `email`, plus their recipient once the
  /// draw has been completed.
  pub async fn lookup(&self, email: &str) -> Result<ParticipantView> {
    let email = email.trim();
    let participant = self
      .store
      .find_participant_by_email(email)
      .await
      .map_err(Into::into)?
      .ok_or_else(|| Error::UnknownEmail(email.to_owned()))?;

    let game = self.game_state().await?;
    let recipient = if game.is_completed() {
      self
        .store
        .recipient_of(participant.participant_id)
        .await
        .map_err(Into::into)?
        .map(RecipientInfo::from)
    } else {
      None
    };

    Ok(ParticipantView { participant, recipient, game })
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  #[tracing::instrument(skip_all, fields(session = %session.session_id))]
  pub async fn run_draw(&self, session: &AdminSession) -> Result<DrawOutcome> {
    let state = self.game_state().await?;
    if state.is_completed() {
      return Err(Error::DrawAlreadyCompleted);
    }

    let ids: Vec<ParticipantId> = self
      .store
      .list_participants()
      .await
      .map_err(Into::into)?
      .iter()
      .map(|p| p.participant_id)
      .collect();

    let draw = {
      let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
      engine.assign(&ids)?
    };
    if draw.method == DrawMethod::Rotation {
      warn!(
        shuffles = draw.shuffles,
        "no shuffle without self-assignment found; using rotation"
      );
    }

    let state = self
      .store
      .commit_draw(state.version, &draw.pairings, Utc::now())
      .await
      .map_err(Into::into)?;

    info!(
      participants = ids.len(),
      method = ?draw.method,
      shuffles = draw.shuffles,
      "draw committed"
    );

    Ok(DrawOutcome {
      state,
      pairings: draw.pairings,
      method: draw.method,
      shuffles: draw.shuffles,
    })
  }

  /// Delete every participant and re-open registration.
  #[tracing::instrument(skip_all, fields(session = %session.session_id))]
  pub async fn reset(&self, session: &AdminSession) -> Result<GameState> {
    self.store.reset().await.map_err(Into::into)?;
    let state = self.store.open_registration().await.map_err(Into::into)?;
    info!(version = state.version, "game reset");
    Ok(state)
  }

  #[tracing::instrument(skip_all, fields(session = %session.session_id))]
  pub async fn set_price_limit(
    &self,
    session: &AdminSession,
    price_limit: f64,
  ) -> Result<GameState> {
    let price_limit = validate_price_limit(price_limit)?;
    let state = self
      .store
      .set_price_limit(Some(price_limit))
      .await
      .map_err(Into::into)?;
    info!(price_limit, "price limit updated");
    Ok(state)
  }

  pub async fn participants(&self, _session: &AdminSession) -> Result<Vec<Participant>> {
    self.store.list_participants().await.map_err(Into::into)
  }

  pub async fn participant(
    &self,
    _session: &AdminSession,
    id: ParticipantId,
  ) -> Result<Participant> {
    self
      .store
      .get_participant(id)
      .await
      .map_err(Into::into)?
      .ok_or(Error::ParticipantNotFound(id))
  }

  #[tracing::instrument(skip(self, session, update), fields(session = %session.session_id))]
  pub async fn update_participant(
    &self,
    session: &AdminSession,
    id: ParticipantId,
    update: ParticipantUpdate,
  ) -> Result<Participant> {
    let update = update.validated()?;
    let participant = self
      .store
      .update_participant(id, update)
      .await
      .map_err(Into::into)?;
    info!("participant updated");
    Ok(participant)
  }

  /// Every giver with their recipient; empty until the draw is completed.
  pub async fn pairs(&self, _session: &AdminSession) -> Result<Vec<PairView>> {
    if !self.game_state().await?.is_completed() {
      return Ok(Vec::new());
    }

    let participants = self.store.list_participants().await.map_err(Into::into)?;
    let by_id: HashMap<ParticipantId, &Participant> =
      participants.iter().map(|p| (p.participant_id, p)).collect();

    Ok(
      participants
        .iter()
        .filter_map(|giver| {
          let recipient = by_id.get(&giver.recipient_id?)?;
          Some(PairView {
            giver:     giver.clone(),
            recipient: RecipientInfo::from((*recipient).clone()),
          })
        })
        .collect(),
    )
  }

  pub async fn history(&self, _session: &AdminSession) -> Result<Vec<StateTransition>> {
    self.store.state_history().await.map_err(Into::into)
  }
}
