//! The assignment engine. Turns a list of participants into a
//! self-assignment-free pairing.
//!
//! A candidate recipient list is produced by uniformly shuffling the input and
//! is accepted as soon as it has no fixed point. Shuffling is retried a
//! bounded number of times ([`DrawPolicy::max_reshuffles`]); once the bound is
//! exhausted the engine falls back to [`rotation`], which maps every
//! participant to the next one in input order and always terminates.
//!
//! The engine has no side effects. Randomness comes from an injected
//! [`PermutationSource`] so draws are reproducible under test.

use std::{collections::HashSet, hash::Hash};

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest participants for which a pairing exists.
pub const MIN_PARTICIPANTS: usize = 2;

/// Re-shuffles attempted after the first candidate before falling back.
pub const DEFAULT_MAX_RESHUFFLES: usize = 100;

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPolicy {
  /// Number of re-shuffles allowed after the initial shuffle. `0` means the
  /// first candidate is either accepted or replaced by the rotation.
  pub max_reshuffles: usize,
}

impl Default for DrawPolicy {
  fn default() -> Self { Self { max_reshuffles: DEFAULT_MAX_RESHUFFLES } }
}

// ─── Randomness ──────────────────────────────────────────────────────────────

/// Something that can reorder a slice in place.
pub trait PermutationSource {
  fn permute<T>(&mut self, items: &mut [T]);
}

/// A [`PermutationSource`] backed by a random number generator; every call
/// is a uniform Fisher–Yates shuffle.
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
  pub fn new(rng: R) -> Self { Self(rng) }
}

impl RngSource<ChaCha8Rng> {
  /// Deterministic source: the same seed always yields the same draws.
  pub fn from_seed(seed: u64) -> Self { Self(ChaCha8Rng::seed_from_u64(seed)) }

  pub fn from_entropy() -> Self { Self(ChaCha8Rng::from_entropy()) }
}

impl<R: Rng> PermutationSource for RngSource<R> {
  fn permute<T>(&mut self, items: &mut [T]) { items.shuffle(&mut self.0); }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One edge of the assignment: `giver` buys a present for `recipient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing<T> {
  pub giver:     T,
  pub recipient: T,
}

/// How a [`Draw`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMethod {
  /// A random shuffle without fixed points was found.
  Shuffle,
  /// The shuffle budget ran out; the deterministic rotation was used.
  Rotation,
}

/// A successful assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw<T> {
  /// One pairing per input identifier, in input order.
  pub pairings: Vec<Pairing<T>>,
  pub method:   DrawMethod,
  /// Candidates generated, including the initial shuffle.
  pub shuffles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
  #[error(
    "not enough participants for a draw: {found} registered, at least 2 required"
  )]
  InsufficientParticipants { found: usize },
}

// ─── Engine ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AssignmentEngine<P> {
  policy: DrawPolicy,
  source: P,
}

impl<P: PermutationSource> AssignmentEngine<P> {
  pub fn new(policy: DrawPolicy, source: P) -> Self { Self { policy, source } }

  pub fn policy(&self) -> DrawPolicy { self.policy }

  /// Pair every identifier in `ids` with a recipient other than itself.
  ///
  /// `ids` must not contain duplicates. Fails only when fewer than
  /// [`MIN_PARTICIPANTS`] identifiers are given.
  pub fn assign<T: Copy + Eq>(&mut self, ids: &[T]) -> Result<Draw<T>, DrawError> {
    if ids.len() < MIN_PARTICIPANTS {
      return Err(DrawError::InsufficientParticipants { found: ids.len() });
    }
    debug_assert!(
      ids.iter().enumerate().all(|(i, a)| ids[i + 1..].iter().all(|b| a != b)),
      "participant identifiers must be distinct"
    );

    let mut recipients = ids.to_vec();
    self.source.permute(&mut recipients);
    let mut shuffles = 1;

    while has_fixed_point(ids, &recipients) {
      if shuffles > self.policy.max_reshuffles {
        return Ok(Draw {
          pairings: rotation(ids)?,
          method: DrawMethod::Rotation,
          shuffles,
        });
      }
      self.source.permute(&mut recipients);
      shuffles += 1;
    }

    let pairings = ids
      .iter()
      .zip(recipients)
      .map(|(&giver, recipient)| Pairing { giver, recipient })
      .collect();

    Ok(Draw { pairings, method: DrawMethod::Shuffle, shuffles })
  }
}

fn has_fixed_point<T: Eq>(ids: &[T], recipients: &[T]) -> bool {
  ids.iter().zip(recipients).any(|(a, b)| a == b)
}

/// The fallback assignment: `ids[i]` gives to `ids[(i + 1) % n]`.
///
/// Produces a single n-cycle; for two identifiers it is the only possible
/// swap.
pub fn rotation<T: Copy>(ids: &[T]) -> Result<Vec<Pairing<T>>, DrawError> {
  if ids.len() < MIN_PARTICIPANTS {
    return Err(DrawError::InsufficientParticipants { found: ids.len() });
  }
  Ok(
    ids
      .iter()
      .zip(ids.iter().cycle().skip(1))
      .map(|(&giver, &recipient)| Pairing { giver, recipient })
      .collect(),
  )
}

/// True when `pairings` is a bijection on `ids` with no self-pairing.
pub fn is_derangement<T: Copy + Eq + Hash>(ids: &[T], pairings: &[Pairing<T>]) -> bool {
  if pairings.len() != ids.len() {
    return false;
  }
  let domain: HashSet<T> = ids.iter().copied().collect();
  let givers: HashSet<T> = pairings.iter().map(|p| p.giver).collect();
  let recipients: HashSet<T> = pairings.iter().map(|p| p.recipient).collect();

  domain.len() == ids.len()
    && givers == domain
    && recipients == domain
    && pairings.iter().all(|p| p.giver != p.recipient)
}
