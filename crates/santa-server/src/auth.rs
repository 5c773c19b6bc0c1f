//! Admin code verification, bearer-token sessions and the [`Admin`]
//! extractor.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use santa_core::{session::AdminSession, store::ExchangeStore};
use sha2::{Digest, Sha256};

use crate::{AppState, error::Error};

const TOKEN_BYTES: usize = 32;
const SESSION_ID_LEN: usize = 12;

/// The configured admin code, held only as an argon2 PHC string.
#[derive(Clone)]
pub struct AdminAuth {
  /// e.g. `$argon2id$v=19$…`
  pub code_hash: String,
}

impl AdminAuth {
  pub fn new(code_hash: impl Into<String>) -> Self { Self { code_hash: code_hash.into() } }

  pub fn verify(&self, code: &str) -> Result<(), Error> {
    let parsed = PasswordHash::new(&self.code_hash).map_err(|_| Error::Unauthorized)?;
    Argon2::default()
      .verify_password(code.as_bytes(), &parsed)
      .map_err(|_| Error::Unauthorized)
  }
}

/// Produce the PHC string to put in `admin_code_hash`.
pub fn hash_admin_code(code: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(code.as_bytes(), &salt)?.to_string())
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

/// Live admin sessions keyed by the SHA-256 digest of their bearer token.
pub struct SessionRegistry {
  ttl:      Duration,
  sessions: Mutex<HashMap<String, AdminSession>>,
}

fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl SessionRegistry {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, sessions: Mutex::new(HashMap::new()) }
  }

  /// Start a session. The returned token is not kept anywhere.
  pub fn issue(&self) -> (String, AdminSession) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let key = digest(&token);

    let now = Utc::now();
    let session = AdminSession {
      session_id: key[..SESSION_ID_LEN].to_string(),
      started_at: now,
      expires_at: now + self.ttl,
    };

    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, s| !s.is_expired_at(now));
    sessions.insert(key, session.clone());
    (token, session)
  }

  pub fn resolve(&self, token: &str) -> Option<AdminSession> {
    let key = digest(token);
    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    match sessions.get(&key) {
      Some(s) if s.is_expired_at(Utc::now()) => {
        sessions.remove(&key);
        None
      }
      other => other.cloned(),
    }
  }

  /// Returns whether a session was removed.
  pub fn revoke(&self, token: &str) -> bool {
    self
      .sessions
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&digest(token))
      .is_some()
  }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a live admin token.
pub struct Admin {
  pub session: AdminSession,
  pub token:   String,
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: ExchangeStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
    let session = state.sessions.resolve(token).ok_or(Error::Unauthorized)?;
    Ok(Admin { session, token: token.to_string() })
  }
}
