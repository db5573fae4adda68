use thiserror::Error;

pub type SealbinResult<T> = Result<T, SealbinError>;

/// The error taxonomy shared across the service.
///
/// Everything here is expected and recoverable: validation failures are
/// client errors, the security gates reject with their own variants, and only
/// `Backend` (storage beyond retry budget) maps to an opaque server error.
/// None of these ever carries plaintext, passwords, or internal detail.
#[derive(Debug, Error)]
pub enum SealbinError {
    #[error("validation error: {0}")]
    Validation(String),

    /// Decryption failed: wrong password or corrupted data, deliberately
    /// indistinguishable.
    #[error("authentication failed")]
    Authentication,

    #[error("proof-of-work solution required")]
    PowRequired,

    #[error("proof-of-work solution rejected")]
    PowInvalid,

    #[error("rate limit exceeded")]
    RateLimited,

    /// Paste absent, expired, or exhausted — deliberately not distinguished.
    #[error("paste not found")]
    NotFound,

    /// Deletion authorization mismatch, or no such paste — deliberately not
    /// distinguished.
    #[error("invalid delete token")]
    InvalidToken,

    #[error("storage error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SealbinError {
    /// Stable machine-readable label used in HTTP error bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authentication => "authentication",
            Self::PowRequired => "pow_required",
            Self::PowInvalid => "pow_invalid",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::InvalidToken => "invalid_token",
            Self::Backend(_) | Self::Io(_) | Self::Other(_) => "server_error",
        }
    }
}
