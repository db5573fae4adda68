//! Key derivation: password + salt → content key and delete authorization
//!
//! One slow PBKDF2-HMAC-SHA256 stretch produces the master material; two
//! cheap HKDF-SHA256 expansions with distinct domain labels split it into the
//! AES content key and the deletion-authorization token.

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::KEY_SIZE;
use crate::SALT_SIZE;

const CONTENT_KEY_DOMAIN: &[u8] = b"sealbin/content-key";
const DELETE_AUTH_DOMAIN: &[u8] = b"sealbin/delete-auth";

/// A 256-bit AES key derived from a password via PBKDF2 + HKDF.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The deletion-authorization secret derived alongside the content key.
///
/// Sent to the server at paste creation (which stores only its hash) and
/// re-derived by any viewer who knows the password, so deletion needs no
/// second password prompt. Domain separation keeps it independent of the
/// content key.
#[derive(Clone)]
pub struct DeleteAuth {
    bytes: [u8; KEY_SIZE],
}

impl DeleteAuth {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Wire form: unpadded base64url.
    pub fn encode(&self) -> String {
        sealbin_core::encoding::encode(&self.bytes)
    }
}

impl Drop for DeleteAuth {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DeleteAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteAuth")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters.
///
/// The default (100,000 iterations) is the protocol constant: it balances
/// brute-force resistance against sub-second interactive latency. Tests use
/// reduced iteration counts.
#[derive(Debug, Clone)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: 100_000 }
    }
}

/// Derive the AES-256 content key for a (password, salt) pair.
///
/// Deterministic for fixed inputs; different salt or password yields a
/// different key with overwhelming probability.
pub fn derive_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> CryptoResult<ContentKey> {
    let mut master = stretch(password, salt, params);
    let key = expand(&master, CONTENT_KEY_DOMAIN);
    master.zeroize();
    Ok(ContentKey::from_bytes(key?))
}

/// Derive the deletion-authorization token for the same (password, salt)
/// pair, domain-separated from the content key.
pub fn derive_delete_auth(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> CryptoResult<DeleteAuth> {
    let mut master = stretch(password, salt, params);
    let auth = expand(&master, DELETE_AUTH_DOMAIN);
    master.zeroize();
    Ok(DeleteAuth::from_bytes(auth?))
}

/// The slow part: PBKDF2-HMAC-SHA256 over the password.
fn stretch(password: &SecretString, salt: &[u8; SALT_SIZE], params: &KdfParams) -> [u8; KEY_SIZE] {
    let mut master = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        params.iterations,
        &mut master,
    );
    master
}

/// The cheap part: HKDF-SHA256 expansion with a domain-specific info string.
fn expand(master: &[u8; KEY_SIZE], domain: &[u8]) -> CryptoResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, master);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(domain, &mut okm)
        .map_err(|e| CryptoError::Kdf(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}
