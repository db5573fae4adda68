//! Challenge issuance, caching, and single-use verification
//!
//! Challenge lifecycle: Issued → Consumed | Expired. The cache sits behind
//! the [`ChallengeStore`] trait so a shared external cache can replace the
//! in-memory map without touching callers; the trait's `consume_solution` is
//! the atomic compare-and-consume that makes each challenge single-use even
//! under racing submissions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use rand::RngCore;
use sealbin_core::config::PowConfig;

use crate::error::PowError;
use crate::{meets_difficulty, pow_digest};

/// An issued challenge as handed to clients.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub challenge: String,
    pub difficulty: u8,
    pub expires_at: SystemTime,
}

/// Outcome of an atomic consume attempt. Everything but `Consumed` collapses
/// to [`PowError::Invalid`] at the gate; the split exists for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed,
    Unknown,
    Expired,
    BelowDifficulty,
}

/// Pluggable challenge cache with atomic single-use consumption.
pub trait ChallengeStore: Send + Sync {
    /// Record a freshly issued challenge.
    fn put(&self, challenge: String, difficulty: u8, expires_at: SystemTime);

    /// Atomically verify `nonce` against the stored entry and consume it.
    /// A challenge is removed on success, so a second racing submission sees
    /// `Unknown`. A failed digest leaves the entry in place for a retry.
    fn consume_solution(&self, challenge: &str, nonce: u64, now: SystemTime) -> ConsumeOutcome;

    /// Drop entries past their expiry.
    fn purge_expired(&self, now: SystemTime);
}

#[derive(Debug, Clone)]
struct Entry {
    difficulty: u8,
    expires_at: SystemTime,
}

/// In-memory challenge cache: one mutex over the map, so check-and-remove is
/// a single critical section.
#[derive(Default)]
pub struct MemoryChallengeStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl ChallengeStore for MemoryChallengeStore {
    fn put(&self, challenge: String, difficulty: u8, expires_at: SystemTime) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            challenge,
            Entry {
                difficulty,
                expires_at,
            },
        );
    }

    fn consume_solution(&self, challenge: &str, nonce: u64, now: SystemTime) -> ConsumeOutcome {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let Some(entry) = entries.get(challenge) else {
            return ConsumeOutcome::Unknown;
        };
        if entry.expires_at <= now {
            entries.remove(challenge);
            return ConsumeOutcome::Expired;
        }
        if !meets_difficulty(&pow_digest(challenge, nonce), entry.difficulty) {
            return ConsumeOutcome::BelowDifficulty;
        }

        entries.remove(challenge);
        ConsumeOutcome::Consumed
    }

    fn purge_expired(&self, now: SystemTime) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.expires_at > now);
    }
}

/// Issuer + verifier pair in front of a [`ChallengeStore`].
pub struct PowGate<S: ChallengeStore> {
    store: S,
    config: PowConfig,
}

impl<S: ChallengeStore> PowGate<S> {
    pub fn new(config: PowConfig, store: S) -> Self {
        Self { store, config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Issue a fresh random challenge, or `None` when PoW is administratively
    /// disabled ("no challenge required" is a signal, not an error).
    pub fn issue(&self) -> Option<Challenge> {
        if !self.config.enabled {
            return None;
        }

        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        let challenge = sealbin_core::encoding::encode(&raw);
        let expires_at = SystemTime::now() + Duration::from_secs(self.config.ttl_secs);

        self.store
            .put(challenge.clone(), self.config.difficulty, expires_at);
        tracing::debug!(difficulty = self.config.difficulty, "pow challenge issued");

        Some(Challenge {
            challenge,
            difficulty: self.config.difficulty,
            expires_at,
        })
    }

    /// Verify a submission against the gate. `solution` is the optional
    /// `(challenge, nonce)` pair from the request.
    pub fn verify(&self, solution: Option<(&str, u64)>) -> Result<(), PowError> {
        if !self.config.enabled {
            return Ok(());
        }
        let Some((challenge, nonce)) = solution else {
            return Err(PowError::Required);
        };

        match self
            .store
            .consume_solution(challenge, nonce, SystemTime::now())
        {
            ConsumeOutcome::Consumed => Ok(()),
            outcome => {
                tracing::debug!(?outcome, "pow solution rejected");
                Err(PowError::Invalid)
            }
        }
    }

    /// Storage reclamation; correctness never depends on it because
    /// `consume_solution` checks expiry itself.
    pub fn purge_expired(&self) {
        self.store.purge_expired(SystemTime::now());
    }
}
