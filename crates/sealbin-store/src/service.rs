//! Lifecycle policy on top of the store: validation, id/token generation,
//! token hashing, bounded retry

use std::time::{Duration, SystemTime};

use rand::RngCore;
use sealbin_core::config::LimitsConfig;
use sealbin_core::{encoding, SealbinError, SealbinResult};
use sha2::{Digest, Sha256};

use crate::record::PasteRecord;
use crate::store::{DeleteOutcome, PasteStore, StoreError, ViewOutcome};

/// AES-GCM iv length the wire contract fixes.
const IV_LEN: usize = 12;
/// A GCM ciphertext is never shorter than its tag.
const MIN_CIPHERTEXT_LEN: usize = 16;
/// Raw paste id entropy; encodes to an 11-character base64url id.
const ID_LEN: usize = 8;
/// Raw delete-token length when the server generates one itself.
const TOKEN_LEN: usize = 32;
/// Attempts per storage operation before surfacing a backend error.
const MAX_RETRIES: u32 = 3;

/// Validated input to [`PasteService::create`]. Binary fields are already
/// decoded from base64url at the API boundary.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub mime: String,
    pub expire_at: SystemTime,
    pub views_allowed: Option<u32>,
    /// Client-derived deletion authorization; the server generates a random
    /// token when absent.
    pub delete_auth: Option<Vec<u8>>,
}

/// What creation hands back — the only time the raw delete token exists
/// outside the client.
#[derive(Debug, Clone)]
pub struct CreatedPaste {
    pub id: String,
    pub delete_token: String,
}

/// Paste lifecycle front-end: every public operation validates, then drives
/// the store through its atomic primitives.
pub struct PasteService<S: PasteStore> {
    store: S,
    limits: LimitsConfig,
}

impl<S: PasteStore> PasteService<S> {
    pub fn new(limits: LimitsConfig, store: S) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and persist a new paste. Returns the raw id and raw delete
    /// token; only the token's SHA-256 hash is stored.
    pub fn create(&self, req: CreateRequest) -> SealbinResult<CreatedPaste> {
        let now = SystemTime::now();
        self.validate(&req, now)?;

        let raw_token = match req.delete_auth {
            Some(auth) => auth,
            None => {
                let mut token = vec![0u8; TOKEN_LEN];
                rand::thread_rng().fill_bytes(&mut token);
                token
            }
        };
        let delete_token_hash = hash_token(&raw_token);

        // Id collisions are astronomically unlikely at 64 bits but cheap to
        // absorb: re-roll under the same retry budget as transient errors.
        let mut attempts = 0;
        let id = loop {
            let id = random_id();
            let record = PasteRecord {
                id: id.clone(),
                ciphertext: req.ciphertext.clone(),
                iv: req.iv.clone(),
                mime: req.mime.clone(),
                expire_at: req.expire_at,
                views_allowed: req.views_allowed,
                views_used: 0,
                delete_token_hash,
                created_at: now,
            };
            match self.store.insert(record) {
                Ok(()) => break id,
                Err(StoreError::DuplicateId) if attempts < MAX_RETRIES => {
                    attempts += 1;
                }
                Err(e) if retryable(&e) && attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempts, "paste insert retry: {e}");
                }
                Err(e) => return Err(backend(e)),
            }
        };

        tracing::info!(id = %id, "paste created");
        Ok(CreatedPaste {
            id,
            delete_token: encoding::encode(&raw_token),
        })
    }

    /// One atomic view. `NotFound` covers absent, expired, and exhausted.
    pub fn retrieve(&self, id: &str) -> SealbinResult<ViewOutcome> {
        let outcome = self
            .with_retries(|| self.store.take_view(id, SystemTime::now()))
            .map_err(backend)?;
        outcome.ok_or(SealbinError::NotFound)
    }

    /// Authorized delete. `supplied_auth` is the base64url token from the
    /// client; mismatch and absence collapse to `InvalidToken`.
    pub fn delete(&self, id: &str, supplied_auth: &str) -> SealbinResult<()> {
        // An undecodable token can never match any stored hash
        let raw = encoding::decode(supplied_auth).map_err(|_| SealbinError::InvalidToken)?;
        let token_hash = hash_token(&raw);

        let outcome = self
            .with_retries(|| {
                self.store
                    .remove_if_token_matches(id, &token_hash, SystemTime::now())
            })
            .map_err(backend)?;

        match outcome {
            DeleteOutcome::Deleted => {
                tracing::info!(id = %id, "paste deleted by token");
                Ok(())
            }
            DeleteOutcome::Rejected => Err(SealbinError::InvalidToken),
        }
    }

    /// Storage reclamation sweep.
    pub fn purge_expired(&self) -> SealbinResult<usize> {
        self.with_retries(|| self.store.purge_expired(SystemTime::now()))
            .map_err(backend)
    }

    fn validate(&self, req: &CreateRequest, now: SystemTime) -> SealbinResult<()> {
        if req.iv.len() != IV_LEN {
            return Err(SealbinError::Validation(format!(
                "iv must be exactly {IV_LEN} bytes"
            )));
        }
        if req.ciphertext.len() < MIN_CIPHERTEXT_LEN {
            return Err(SealbinError::Validation(
                "ciphertext shorter than an authentication tag".into(),
            ));
        }
        if req.ciphertext.len() > self.limits.max_ciphertext_bytes {
            return Err(SealbinError::Validation(format!(
                "ciphertext exceeds {} bytes",
                self.limits.max_ciphertext_bytes
            )));
        }
        let min = now + Duration::from_secs(self.limits.min_expiry_secs);
        let max = now + Duration::from_secs(self.limits.max_expiry_secs);
        if req.expire_at < min {
            return Err(SealbinError::Validation(format!(
                "expiry must be at least {}s in the future",
                self.limits.min_expiry_secs
            )));
        }
        if req.expire_at > max {
            return Err(SealbinError::Validation(format!(
                "expiry must be within {}s",
                self.limits.max_expiry_secs
            )));
        }
        if req.views_allowed == Some(0) {
            return Err(SealbinError::Validation(
                "viewsAllowed must be at least 1".into(),
            ));
        }
        if req.mime.is_empty() || req.mime.len() > 255 {
            return Err(SealbinError::Validation("invalid mime type".into()));
        }
        Ok(())
    }

    fn with_retries<T>(
        &self,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempts = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempts, "store retry: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn retryable(e: &StoreError) -> bool {
    matches!(e, StoreError::Backend(_))
}

fn backend(e: StoreError) -> SealbinError {
    SealbinError::Backend(e.to_string())
}

fn random_id() -> String {
    let mut raw = [0u8; ID_LEN];
    rand::thread_rng().fill_bytes(&mut raw);
    encoding::encode(&raw)
}

fn hash_token(raw: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> PasteService<MemoryStore> {
        PasteService::new(LimitsConfig::default(), MemoryStore::new())
    }

    fn request() -> CreateRequest {
        CreateRequest {
            ciphertext: vec![0xaa; 64],
            iv: vec![0u8; 12],
            mime: "text/plain".into(),
            expire_at: SystemTime::now() + Duration::from_secs(3600),
            views_allowed: None,
            delete_auth: None,
        }
    }

    #[test]
    fn test_create_returns_id_and_token_once() {
        let svc = service();
        let created = svc.create(request()).unwrap();

        assert!(!created.id.is_empty());
        assert!(!created.delete_token.is_empty());
        // Raw token never stored: only its hash matches
        let view = svc.retrieve(&created.id).unwrap();
        assert_eq!(view.ciphertext, vec![0xaa; 64]);
    }

    #[test]
    fn test_create_rejects_bad_iv_length() {
        let svc = service();
        let mut req = request();
        req.iv = vec![0u8; 16];

        assert!(matches!(
            svc.create(req),
            Err(SealbinError::Validation(_))
        ));
    }

    #[test]
    fn test_create_rejects_truncated_ciphertext() {
        let svc = service();
        let mut req = request();
        req.ciphertext = vec![0u8; 8];

        assert!(matches!(svc.create(req), Err(SealbinError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_oversized_ciphertext() {
        let limits = LimitsConfig {
            max_ciphertext_bytes: 128,
            ..LimitsConfig::default()
        };
        let svc = PasteService::new(limits, MemoryStore::new());
        let mut req = request();
        req.ciphertext = vec![0u8; 129];

        assert!(matches!(svc.create(req), Err(SealbinError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_near_past_expiry() {
        let svc = service();
        let mut req = request();
        req.expire_at = SystemTime::now() + Duration::from_secs(5);

        assert!(matches!(svc.create(req), Err(SealbinError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_far_future_expiry() {
        let svc = service();
        let mut req = request();
        req.expire_at = SystemTime::now() + Duration::from_secs(365 * 24 * 3600);

        assert!(matches!(svc.create(req), Err(SealbinError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_zero_views() {
        let svc = service();
        let mut req = request();
        req.views_allowed = Some(0);

        assert!(matches!(svc.create(req), Err(SealbinError::Validation(_))));
    }

    #[test]
    fn test_retrieve_missing_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.retrieve("missing"),
            Err(SealbinError::NotFound)
        ));
    }

    #[test]
    fn test_delete_with_returned_token() {
        let svc = service();
        let created = svc.create(request()).unwrap();

        svc.delete(&created.id, &created.delete_token).unwrap();
        assert!(matches!(
            svc.retrieve(&created.id),
            Err(SealbinError::NotFound)
        ));

        // Stale token on a second attempt fails, never silently succeeds
        assert!(matches!(
            svc.delete(&created.id, &created.delete_token),
            Err(SealbinError::InvalidToken)
        ));
    }

    #[test]
    fn test_delete_with_wrong_token() {
        let svc = service();
        let created = svc.create(request()).unwrap();

        assert!(matches!(
            svc.delete(&created.id, "bW92ZSBhbG9uZw"),
            Err(SealbinError::InvalidToken)
        ));
        // Paste survives the failed attempt
        assert!(svc.retrieve(&created.id).is_ok());
    }

    #[test]
    fn test_delete_with_undecodable_token() {
        let svc = service();
        let created = svc.create(request()).unwrap();

        assert!(matches!(
            svc.delete(&created.id, "not base64!!"),
            Err(SealbinError::InvalidToken)
        ));
    }

    #[test]
    fn test_supplied_delete_auth_is_echoed_and_honored() {
        let svc = service();
        let auth = vec![0x42u8; 32];
        let mut req = request();
        req.delete_auth = Some(auth.clone());

        let created = svc.create(req).unwrap();
        assert_eq!(created.delete_token, encoding::encode(&auth));

        svc.delete(&created.id, &created.delete_token).unwrap();
    }

    #[test]
    fn test_ids_are_unique_across_creates() {
        let svc = service();
        let a = svc.create(request()).unwrap();
        let b = svc.create(request()).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.delete_token, b.delete_token);
    }
}
