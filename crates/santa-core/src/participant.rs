//! Participants and the input types used to create and edit them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Store-assigned participant identifier. Immutable once issued.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A registered member of the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id: ParticipantId,
  pub name:           String,
  /// Unique across participants; compared exactly as stored.
  pub email:          String,
  pub wishlist:       Option<String>,
  /// Set only by a committed draw, never to `participant_id`.
  pub recipient_id:   Option<ParticipantId>,
  pub registered_at:  DateTime<Utc>,
}

/// What a participant learns about the person they give to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientInfo {
  pub name:     String,
  pub email:    String,
  pub wishlist: Option<String>,
}

impl From<Participant> for RecipientInfo {
  fn from(p: Participant) -> Self {
    Self { name: p.name, email: p.email, wishlist: p.wishlist }
  }
}

/// Registration input. Use [`NewParticipant::new`] to get trimmed, validated
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParticipant {
  pub name:     String,
  pub email:    String,
  pub wishlist: Option<String>,
}

impl NewParticipant {
  pub fn new(
    name: impl AsRef<str>,
    email: impl AsRef<str>,
    wishlist: Option<&str>,
  ) -> Result<Self> {
    let (name, email, wishlist) = clean_fields(name.as_ref(), email.as_ref(), wishlist)?;
    Ok(Self { name, email, wishlist })
  }

  /// Re-run validation on a value built field by field (e.g. deserialised).
  pub fn validated(self) -> Result<Self> {
    Self::new(&self.name, &self.email, self.wishlist.as_deref())
  }
}

/// Admin edit of a participant's personal fields. The recipient link is never
/// edited this way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantUpdate {
  pub name:     String,
  pub email:    String,
  pub wishlist: Option<String>,
}

impl ParticipantUpdate {
  pub fn new(
    name: impl AsRef<str>,
    email: impl AsRef<str>,
    wishlist: Option<&str>,
  ) -> Result<Self> {
    let (name, email, wishlist) = clean_fields(name.as_ref(), email.as_ref(), wishlist)?;
    Ok(Self { name, email, wishlist })
  }

  pub fn validated(self) -> Result<Self> {
    Self::new(&self.name, &self.email, self.wishlist.as_deref())
  }
}

fn clean_fields(
  name: &str,
  email: &str,
  wishlist: Option<&str>,
) -> Result<(String, String, Option<String>)> {
  let name = name.trim();
  let email = email.trim();
  if name.is_empty() || email.is_empty() {
    return Err(Error::Validation("name and email are required".into()));
  }
  let wishlist = wishlist
    .map(str::trim)
    .filter(|w| !w.is_empty())
    .map(str::to_owned);
  Ok((name.to_owned(), email.to_owned(), wishlist))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields_are_trimmed() {
    let p = NewParticipant::new("  Ded Moroz ", " ded@example.com\n", Some("  socks "))
      .unwrap();
    assert_eq!(p.name, "Ded Moroz");
    assert_eq!(p.email, "ded@example.com");
    assert_eq!(p.wishlist.as_deref(), Some("socks"));
  }

  #[test]
  fn blank_wishlist_becomes_none() {
    let p = NewParticipant::new("Snegurochka", "sn@example.com", Some("   ")).unwrap();
    assert_eq!(p.wishlist, None);
  }

  #[test]
  fn missing_name_or_email_is_rejected() {
    assert!(matches!(
      NewParticipant::new(" ", "a@example.com", None),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      ParticipantUpdate::new("Alice", "", None),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn validated_cleans_deserialised_input() {
    let raw: NewParticipant = serde_json::from_str(
      r#"{"name":" Bob ","email":"bob@example.com","wishlist":""}"#,
    )
    .unwrap();
    let p = raw.validated().unwrap();
    assert_eq!(p.name, "Bob");
    assert_eq!(p.wishlist, None);
  }

  #[test]
  fn id_serialises_as_plain_integer() {
    let json = serde_json::to_string(&ParticipantId(17)).unwrap();
    assert_eq!(json, "17");
  }
}
