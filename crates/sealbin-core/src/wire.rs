//! JSON wire contract between client and server.
//!
//! All binary fields are unpadded base64url (see [`crate::encoding`]).
//! Timestamps are Unix seconds. The salt never appears here: it rides only in
//! the share link's URL fragment, which compliant clients never transmit.

use serde::{Deserialize, Serialize};

/// Paste metadata supplied at creation and echoed back on retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteMeta {
    /// Absolute expiry as Unix seconds
    pub expire_ts: u64,
    /// MIME type of the (encrypted) content
    pub mime: String,
    /// Remaining-view budget; `None` = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_allowed: Option<u32>,
    /// Sugar for `views_allowed = 1`; normalized at the API boundary
    #[serde(default)]
    pub single_view: bool,
}

/// A solved proof-of-work challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowSolution {
    pub challenge: String,
    pub nonce: u64,
}

/// `POST /api/paste` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasteRequest {
    /// Ciphertext, base64url
    pub ct: String,
    /// AES-GCM iv (12 bytes), base64url
    pub iv: String,
    pub meta: PasteMeta,
    /// Omitted when the server has PoW disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow: Option<PowSolution>,
    /// Deletion authorization derived client-side from the password
    pub delete_auth: String,
}

/// `POST /api/paste` response. The raw delete token is returned exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasteResponse {
    pub id: String,
    pub delete_token: String,
}

/// `GET /api/paste/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievePasteResponse {
    pub ct: String,
    pub iv: String,
    pub meta: PasteMeta,
    /// Views remaining before this read's decrement; `None` = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_left: Option<u32>,
}

/// `DELETE /api/paste/{id}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePasteRequest {
    pub delete_auth: String,
}

/// `GET /api/pow` response: a challenge, or an explicit "disabled" signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PowIssueResponse {
    #[serde(rename_all = "camelCase")]
    Challenge {
        challenge: String,
        difficulty: u8,
        expires_at: u64,
    },
    #[serde(rename_all = "camelCase")]
    Disabled { pow_required: bool },
}

impl PowIssueResponse {
    pub fn disabled() -> Self {
        Self::Disabled {
            pow_required: false,
        }
    }
}

/// Error body returned for every non-2xx API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable taxonomy label, e.g. "pow_invalid"
    pub error: String,
    /// Generic human-readable message; never internal detail
    pub message: String,
}
