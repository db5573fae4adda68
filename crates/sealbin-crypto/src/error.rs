use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong password or corrupted ciphertext/iv/salt. The two causes are
    /// deliberately indistinguishable so the error cannot be used as an
    /// oracle, and no partial plaintext is ever returned.
    #[error("decryption failed: wrong password or corrupted data")]
    Authentication,

    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("encryption failed: {0}")]
    Encryption(String),
}
