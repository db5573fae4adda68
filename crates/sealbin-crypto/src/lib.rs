//! sealbin-crypto: client-side encryption for the zero-knowledge paste flow
//!
//! Key hierarchy:
//! ```text
//! Master material (256-bit, PBKDF2-HMAC-SHA256, 100k iterations over password + salt)
//!   ├── Content Key     (HKDF-SHA256, domain="sealbin/content-key")  → AES-256-GCM
//!   └── Delete Auth     (HKDF-SHA256, domain="sealbin/delete-auth")  → sent to server
//! ```
//!
//! The two HKDF domains make the deletion-authorization token computationally
//! independent of the encryption key: the server learns the delete auth (and
//! stores only its hash) without ever gaining anything about the content key.
//! Plaintext and the content key never leave the client.

pub mod error;
pub mod kdf;
pub mod payload;

pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_delete_auth, derive_key, ContentKey, DeleteAuth, KdfParams};
pub use payload::{decrypt, encrypt, EncryptedPayload};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the per-paste KDF salt
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM iv (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
