//! [`SqliteStore`]: the SQLite implementation of [`ExchangeStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use santa_core::{
  draw::Pairing,
  game::{GameState, GameStatus, StateTransition},
  participant::{NewParticipant, Participant, ParticipantId, ParticipantUpdate},
  store::ExchangeStore,
};

use crate::{
  Error, Result,
  encode::{
    PARTICIPANT_COLUMNS, RawGameState, RawParticipant, RawTransition, encode_dt,
    encode_status,
  },
  schema::{SCHEMA, SEED_STATE},
};

const SELECT_STATE: &str = "SELECT version, status, drawn_at, price_limit, updated_at
   FROM game_state WHERE state_id = 1";

/// Copies the current singleton row into the log.
const LOG_CURRENT_STATE: &str = "INSERT INTO game_state_log
     (version, status, drawn_at, price_limit, recorded_at)
   SELECT version, status, drawn_at, price_limit, updated_at
   FROM game_state WHERE state_id = 1";

// ─── Store ───────────────────────────────────────────────────────────────────

/// An exchange store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run schema initialisation and seed
  /// the game state on first use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let now = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;
        if tx.execute(SEED_STATE, [now])? == 1 {
          tx.execute(LOG_CURRENT_STATE, [])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, flattening its domain result.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

fn read_state(conn: &Connection) -> Result<RawGameState> {
  conn
    .query_row(SELECT_STATE, [], RawGameState::from_row)
    .optional()?
    .ok_or(Error::MissingState)
}

/// Overwrite the current state with `next`, bump the version and log it.
fn write_state(conn: &Connection, next: &RawGameState) -> Result<RawGameState> {
  conn.execute(
    "UPDATE game_state
     SET version = version + 1, status = ?1, drawn_at = ?2, price_limit = ?3, updated_at = ?4
     WHERE state_id = 1",
    rusqlite::params![next.status, next.drawn_at, next.price_limit, next.updated_at],
  )?;
  conn.execute(LOG_CURRENT_STATE, [])?;
  read_state(conn)
}

/// Apply `change` to the current state inside one transaction.
fn transition(
  conn: &mut Connection,
  now: String,
  change: impl FnOnce(&mut RawGameState),
) -> Result<GameState> {
  let tx = conn.transaction()?;
  let mut next = read_state(&tx)?;
  change(&mut next);
  next.updated_at = now;
  let raw = write_state(&tx, &next)?;
  tx.commit()?;
  raw.into_state()
}

fn select_participant(conn: &Connection, id: i64) -> Result<Option<RawParticipant>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE participant_id = ?1"),
        rusqlite::params![id],
        RawParticipant::from_row,
      )
      .optional()?,
  )
}

/// Whether `email` belongs to a participant other than `except`.
fn email_taken(conn: &Connection, email: &str, except: Option<i64>) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM participants WHERE email = ?1 AND participant_id IS NOT ?2",
        rusqlite::params![email, except],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn insert_participant(
  conn: &mut Connection,
  input: NewParticipant,
  registered_at: String,
) -> Result<Participant> {
  let tx = conn.transaction()?;

  let status = read_state(&tx)?.into_state()?.status;
  if !status.accepts_registrations() {
    return Err(Error::RegistrationClosed(status));
  }
  if email_taken(&tx, &input.email, None)? {
    return Err(Error::DuplicateEmail(input.email));
  }

  tx.execute(
    "INSERT INTO participants (name, email, wishlist, registered_at) VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![input.name, input.email, input.wishlist, registered_at],
  )?;
  let raw = select_participant(&tx, tx.last_insert_rowid())?.ok_or(Error::Decode(
    "inserted participant could not be read back".into(),
  ))?;
  tx.commit()?;
  raw.into_participant()
}

fn apply_update(
  conn: &mut Connection,
  id: ParticipantId,
  update: ParticipantUpdate,
) -> Result<Participant> {
  let tx = conn.transaction()?;

  if select_participant(&tx, id.0)?.is_none() {
    return Err(Error::ParticipantNotFound(id));
  }
  if email_taken(&tx, &update.email, Some(id.0))? {
    return Err(Error::DuplicateEmail(update.email));
  }

  tx.execute(
    "UPDATE participants SET name = ?1, email = ?2, wishlist = ?3 WHERE participant_id = ?4",
    rusqlite::params![update.name, update.email, update.wishlist, id.0],
  )?;
  let raw = select_participant(&tx, id.0)?.ok_or(Error::ParticipantNotFound(id))?;
  tx.commit()?;
  raw.into_participant()
}

fn apply_draw(
  conn: &mut Connection,
  expected_version: u64,
  pairs: Vec<(i64, i64)>,
  drawn_at: String,
) -> Result<GameState> {
  let tx = conn.transaction()?;

  let current = read_state(&tx)?.into_state()?;
  if current.is_completed() {
    return Err(Error::DrawAlreadyCompleted);
  }
  if current.version != expected_version {
    return Err(Error::StateChanged { expected: expected_version, found: current.version });
  }
  if let Some((giver, _)) = pairs.iter().find(|(giver, recipient)| giver == recipient) {
    return Err(Error::InvalidPairing(format!("participant {giver} assigned to themselves")));
  }

  let mut ids: Vec<i64> = tx
    .prepare("SELECT participant_id FROM participants")?
    .query_map([], |row| row.get(0))?
    .collect::<rusqlite::Result<_>>()?;
  ids.sort_unstable();

  let mut givers: Vec<i64> = pairs.iter().map(|(giver, _)| *giver).collect();
  let mut recipients: Vec<i64> = pairs.iter().map(|(_, recipient)| *recipient).collect();
  givers.sort_unstable();
  recipients.sort_unstable();
  if givers != ids || recipients != ids {
    return Err(Error::ParticipantSetChanged);
  }

  {
    let mut stmt =
      tx.prepare("UPDATE participants SET recipient_id = ?2 WHERE participant_id = ?1")?;
    for (giver, recipient) in &pairs {
      stmt.execute(rusqlite::params![giver, recipient])?;
    }
  }

  let next = RawGameState {
    version:     0,
    status:      encode_status(GameStatus::Completed).to_owned(),
    drawn_at:    Some(drawn_at.clone()),
    price_limit: current.price_limit,
    updated_at:  drawn_at,
  };
  let raw = write_state(&tx, &next)?;
  tx.commit()?;
  raw.into_state()
}

fn clear_participants(conn: &mut Connection, now: String) -> Result<GameState> {
  let tx = conn.transaction()?;
  tx.execute("UPDATE participants SET recipient_id = NULL", [])?;
  tx.execute("DELETE FROM participants", [])?;

  let mut next = read_state(&tx)?;
  next.status = encode_status(GameStatus::Reset).to_owned();
  next.drawn_at = None;
  next.updated_at = now;
  let raw = write_state(&tx, &next)?;
  tx.commit()?;
  raw.into_state()
}

// ─── ExchangeStore impl ──────────────────────────────────────────────────────

impl ExchangeStore for SqliteStore {
  type Error = Error;

  // ── Game state ────────────────────────────────────────────────────────────

  async fn current_state(&self) -> Result<GameState> {
    self.with_conn(|conn| read_state(conn)?.into_state()).await
  }

  async fn state_history(&self) -> Result<Vec<StateTransition>> {
    let raws: Vec<RawTransition> = self
      .with_conn(|conn| {
        let mut stmt = conn.prepare(
          "SELECT version, status, drawn_at, price_limit, recorded_at
           FROM game_state_log ORDER BY log_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTransition {
              version:     row.get(0)?,
              status:      row.get(1)?,
              drawn_at:    row.get(2)?,
              price_limit: row.get(3)?,
              recorded_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransition::into_transition).collect()
  }

  async fn set_price_limit(&self, price_limit: Option<f64>) -> Result<GameState> {
    let now = encode_dt(Utc::now());
    self
      .with_conn(move |conn| transition(conn, now, |next| next.price_limit = price_limit))
      .await
  }

  async fn open_registration(&self) -> Result<GameState> {
    let now = encode_dt(Utc::now());
    self
      .with_conn(move |conn| {
        transition(conn, now, |next| {
          next.status = encode_status(GameStatus::Registration).to_owned();
          next.drawn_at = None;
        })
      })
      .await
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn add_participant(&self, input: NewParticipant) -> Result<Participant> {
    let now = encode_dt(Utc::now());
    self
      .with_conn(move |conn| insert_participant(conn, input, now))
      .await
  }

  async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
    self
      .with_conn(move |conn| select_participant(conn, id.0))
      .await?
      .map(RawParticipant::into_participant)
      .transpose()
  }

  async fn find_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
    let email = email.to_owned();
    let raw = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE email = ?1"),
              rusqlite::params![email],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY participant_id"
        ))?;
        let rows = stmt
          .query_map([], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn update_participant(
    &self,
    id: ParticipantId,
    update: ParticipantUpdate,
  ) -> Result<Participant> {
    self
      .with_conn(move |conn| apply_update(conn, id, update))
      .await
  }

  // ── Assignment ────────────────────────────────────────────────────────────

  async fn recipient_of(&self, giver: ParticipantId) -> Result<Option<Participant>> {
    let raw = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT r.participant_id, r.name, r.email, r.wishlist, r.recipient_id, r.registered_at
               FROM participants g
               JOIN participants r ON r.participant_id = g.recipient_id
               WHERE g.participant_id = ?1",
              rusqlite::params![giver.0],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn pairings(&self) -> Result<Vec<Pairing<ParticipantId>>> {
    self
      .with_conn(|conn| {
        let mut stmt = conn.prepare(
          "SELECT participant_id, recipient_id FROM participants
           WHERE recipient_id IS NOT NULL
           ORDER BY participant_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Pairing {
              giver:     ParticipantId(row.get(0)?),
              recipient: ParticipantId(row.get(1)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn commit_draw(
    &self,
    expected_version: u64,
    pairings: &[Pairing<ParticipantId>],
    drawn_at: DateTime<Utc>,
  ) -> Result<GameState> {
    let pairs: Vec<(i64, i64)> =
      pairings.iter().map(|p| (p.giver.0, p.recipient.0)).collect();
    let drawn_at = encode_dt(drawn_at);

    self
      .with_conn(move |conn| apply_draw(conn, expected_version, pairs, drawn_at))
      .await
  }

  async fn reset(&self) -> Result<GameState> {
    let now = encode_dt(Utc::now());
    self.with_conn(move |conn| clear_participants(conn, now)).await
  }
}
