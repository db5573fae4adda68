//! Authenticated paste encryption/decryption with AES-256-GCM
//!
//! Each encryption draws a fresh 16-byte salt and 12-byte iv, so repeated
//! calls with identical plaintext and password never produce the same
//! ciphertext, and no iv is ever reused under the same key. The salt rides
//! only in the share link's URL fragment; ciphertext and iv go to the server.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::SecretString;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, ContentKey, KdfParams};
use crate::{IV_SIZE, SALT_SIZE};

/// Ciphertext plus the public parameters needed to decrypt it.
///
/// Invariants: `iv` is fresh per encryption, `salt` is fresh per paste.
/// Neither is secret; the password is.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// Ciphertext with the 16-byte GCM tag appended
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub salt: [u8; SALT_SIZE],
}

/// Encrypt `plaintext` under a key derived from `password` and a fresh salt.
///
/// Succeeds for empty and multi-megabyte plaintexts alike.
pub fn encrypt(
    plaintext: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> CryptoResult<EncryptedPayload> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt, params)?;
    let ciphertext = seal(&key, &iv, plaintext)?;

    Ok(EncryptedPayload {
        ciphertext,
        iv,
        salt,
    })
}

/// Decrypt a payload with the key derived from `password` and its salt.
///
/// All-or-nothing: any wrong password or corrupted byte of ciphertext, iv, or
/// salt fails authentication and returns no plaintext at all.
pub fn decrypt(
    payload: &EncryptedPayload,
    password: &SecretString,
    params: &KdfParams,
) -> CryptoResult<Vec<u8>> {
    let key = derive_key(password, &payload.salt, params)?;
    open(&key, &payload.iv, &payload.ciphertext)
}

fn seal(key: &ContentKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))
}

fn open(key: &ContentKey, iv: &[u8; IV_SIZE], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
