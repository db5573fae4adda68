//! The server-owned paste record

use std::time::SystemTime;

/// Everything the server holds for one paste. Only ciphertext: the salt never
/// reaches the server and the delete token is stored as a one-way hash.
#[derive(Debug, Clone)]
pub struct PasteRecord {
    pub id: String,
    pub ciphertext: Vec<u8>,
    /// AES-GCM iv as submitted (validated to 12 bytes at creation)
    pub iv: Vec<u8>,
    pub mime: String,
    pub expire_at: SystemTime,
    /// `None` = unlimited views
    pub views_allowed: Option<u32>,
    pub views_used: u32,
    /// SHA-256 of the raw delete token; the raw value is never persisted
    pub delete_token_hash: [u8; 32],
    pub created_at: SystemTime,
}

impl PasteRecord {
    /// Logically absent once past expiry, even before any physical purge.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expire_at <= now
    }

    pub fn is_exhausted(&self) -> bool {
        self.views_allowed
            .is_some_and(|allowed| self.views_used >= allowed)
    }

    /// Views remaining before any further read; `None` = unlimited.
    pub fn views_left(&self) -> Option<u32> {
        self.views_allowed
            .map(|allowed| allowed.saturating_sub(self.views_used))
    }
}
