//! The authenticated admin session handed to privileged operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proof that the caller logged in with the admin code.
///
/// Built by the authentication layer and passed explicitly into every admin
/// operation of [`Exchange`](crate::exchange::Exchange).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
  /// Short, non-secret identifier used in logs.
  pub session_id: String,
  pub started_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl AdminSession {
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}
