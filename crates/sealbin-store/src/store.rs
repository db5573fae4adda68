//! `PasteStore` trait + in-memory backend
//!
//! The trait is the swap point for a future external datastore; its contract
//! is that `take_view` and `remove_if_token_matches` are atomic compare-and-
//! update operations, never read-then-write. The in-memory backend gets that
//! for free from a single mutex over the map: every lifecycle mutation is one
//! critical section.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::record::PasteRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("paste id collision")]
    DuplicateId,

    /// Transient backend failure; callers retry a bounded number of times.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result of one successful atomic view.
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub mime: String,
    pub expire_at: SystemTime,
    pub views_allowed: Option<u32>,
    /// Remaining views *before* this view's decrement was applied
    pub views_left: Option<u32>,
}

/// Result of an authorized-delete attempt. Absence and token mismatch are one
/// variant so the store cannot be used as an existence oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No such live paste, or the token hash did not match
    Rejected,
}

pub trait PasteStore: Send + Sync {
    fn insert(&self, record: PasteRecord) -> Result<(), StoreError>;

    /// Atomic read path: treat expired/exhausted records as absent, report
    /// the pre-increment `views_left`, increment `views_used`, and delete the
    /// record in the same step when the budget is used up. Two racing calls
    /// on a paste with one view left must produce exactly one `Some`.
    fn take_view(&self, id: &str, now: SystemTime) -> Result<Option<ViewOutcome>, StoreError>;

    /// Atomic authorized delete: constant-time hash comparison, removal and
    /// comparison in one step.
    fn remove_if_token_matches(
        &self,
        id: &str,
        token_hash: &[u8; 32],
        now: SystemTime,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Physically drop expired records. Reclamation only; the read and delete
    /// paths already treat expired records as absent.
    fn purge_expired(&self, now: SystemTime) -> Result<usize, StoreError>;
}

/// Mutex-over-map backend for a single server instance.
#[derive(Default)]
pub struct MemoryStore {
    pastes: Mutex<HashMap<String, PasteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pastes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PasteStore for MemoryStore {
    fn insert(&self, record: PasteRecord) -> Result<(), StoreError> {
        let mut pastes = self.pastes.lock().unwrap_or_else(|e| e.into_inner());
        if pastes.contains_key(&record.id) {
            return Err(StoreError::DuplicateId);
        }
        pastes.insert(record.id.clone(), record);
        Ok(())
    }

    fn take_view(&self, id: &str, now: SystemTime) -> Result<Option<ViewOutcome>, StoreError> {
        let mut pastes = self.pastes.lock().unwrap_or_else(|e| e.into_inner());

        let Some(record) = pastes.get_mut(id) else {
            return Ok(None);
        };
        if record.is_expired(now) || record.is_exhausted() {
            pastes.remove(id);
            return Ok(None);
        }

        let outcome = ViewOutcome {
            ciphertext: record.ciphertext.clone(),
            iv: record.iv.clone(),
            mime: record.mime.clone(),
            expire_at: record.expire_at,
            views_allowed: record.views_allowed,
            views_left: record.views_left(),
        };

        record.views_used += 1;
        if record.is_exhausted() {
            pastes.remove(id);
        }

        Ok(Some(outcome))
    }

    fn remove_if_token_matches(
        &self,
        id: &str,
        token_hash: &[u8; 32],
        now: SystemTime,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut pastes = self.pastes.lock().unwrap_or_else(|e| e.into_inner());

        let Some(record) = pastes.get(id) else {
            return Ok(DeleteOutcome::Rejected);
        };
        if record.is_expired(now) {
            pastes.remove(id);
            return Ok(DeleteOutcome::Rejected);
        }
        if record.delete_token_hash.ct_eq(token_hash).into() {
            pastes.remove(id);
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Rejected)
        }
    }

    fn purge_expired(&self, now: SystemTime) -> Result<usize, StoreError> {
        let mut pastes = self.pastes.lock().unwrap_or_else(|e| e.into_inner());
        let before = pastes.len();
        pastes.retain(|_, record| !record.is_expired(now));
        Ok(before - pastes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(id: &str, views_allowed: Option<u32>, ttl: Duration) -> PasteRecord {
        let now = SystemTime::now();
        PasteRecord {
            id: id.into(),
            ciphertext: vec![1, 2, 3],
            iv: vec![0u8; 12],
            mime: "text/plain".into(),
            expire_at: now + ttl,
            views_allowed,
            views_used: 0,
            delete_token_hash: [7u8; 32],
            created_at: now,
        }
    }

    fn minute() -> Duration {
        Duration::from_secs(60)
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();

        assert!(matches!(
            store.insert(record("a", None, minute())),
            Err(StoreError::DuplicateId)
        ));
    }

    #[test]
    fn test_take_view_missing() {
        let store = MemoryStore::new();
        assert!(store.take_view("nope", SystemTime::now()).unwrap().is_none());
    }

    #[test]
    fn test_single_view_returns_exactly_once() {
        let store = MemoryStore::new();
        store.insert(record("a", Some(1), minute())).unwrap();

        let now = SystemTime::now();
        let first = store.take_view("a", now).unwrap().unwrap();
        assert_eq!(first.views_left, Some(1));
        assert_eq!(first.ciphertext, vec![1, 2, 3]);

        assert!(store.take_view("a", now).unwrap().is_none());
        assert!(store.is_empty(), "exhausted record is physically removed");
    }

    #[test]
    fn test_two_view_countdown() {
        let store = MemoryStore::new();
        store.insert(record("a", Some(2), minute())).unwrap();
        let now = SystemTime::now();

        assert_eq!(store.take_view("a", now).unwrap().unwrap().views_left, Some(2));
        assert_eq!(store.take_view("a", now).unwrap().unwrap().views_left, Some(1));
        assert!(store.take_view("a", now).unwrap().is_none());
    }

    #[test]
    fn test_unlimited_views() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();
        let now = SystemTime::now();

        for _ in 0..100 {
            let view = store.take_view("a", now).unwrap().unwrap();
            assert_eq!(view.views_left, None);
        }
    }

    #[test]
    fn test_expired_record_is_absent_and_swept_on_read() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();

        let later = SystemTime::now() + minute() + Duration::from_secs(1);
        assert!(store.take_view("a", later).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_with_matching_token() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();
        let now = SystemTime::now();

        assert_eq!(
            store.remove_if_token_matches("a", &[7u8; 32], now).unwrap(),
            DeleteOutcome::Deleted
        );
        // Second attempt with the now-stale token: paste is gone
        assert_eq!(
            store.remove_if_token_matches("a", &[7u8; 32], now).unwrap(),
            DeleteOutcome::Rejected
        );
    }

    #[test]
    fn test_delete_mismatch_and_absence_look_identical() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();
        let now = SystemTime::now();

        let wrong = store.remove_if_token_matches("a", &[8u8; 32], now).unwrap();
        let absent = store.remove_if_token_matches("b", &[7u8; 32], now).unwrap();
        assert_eq!(wrong, absent);
        assert_eq!(wrong, DeleteOutcome::Rejected);

        // Failed delete must not remove the paste
        assert!(store.take_view("a", now).unwrap().is_some());
    }

    #[test]
    fn test_delete_of_expired_record_rejected() {
        let store = MemoryStore::new();
        store.insert(record("a", None, minute())).unwrap();

        let later = SystemTime::now() + minute() + Duration::from_secs(1);
        assert_eq!(
            store.remove_if_token_matches("a", &[7u8; 32], later).unwrap(),
            DeleteOutcome::Rejected
        );
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryStore::new();
        store.insert(record("live", None, minute())).unwrap();
        store
            .insert(record("dead", None, Duration::from_secs(0)))
            .unwrap();

        let swept = store.purge_expired(SystemTime::now()).unwrap();
        assert_eq!(swept, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_last_view_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        store.insert(record("a", Some(1), minute())).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.take_view("a", SystemTime::now()).unwrap().is_some()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1, "one last view, exactly one winner");
    }
}
