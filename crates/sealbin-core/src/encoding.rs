//! base64url (no padding) codec for binary fields on the wire and in URLs
//!
//! Every binary secret or ciphertext that leaves a process goes through this
//! codec: ciphertext and iv in API bodies, the salt in the URL fragment,
//! paste ids and delete tokens. URL-safe alphabet, no `=` padding, so values
//! never need percent-encoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Malformed base64url input (non-alphabet character or impossible length).
#[derive(Debug, Error)]
#[error("invalid base64url: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_NO_PAD.decode(text)?)
}
