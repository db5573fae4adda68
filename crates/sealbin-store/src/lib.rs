//! sealbin-store: server-side paste persistence and lifecycle policy
//!
//! A paste is `Active` until the first of: authorized delete, expiry, or
//! view-count exhaustion; all three terminal states read back as "not found"
//! so callers cannot tell them apart. The storage seam is the [`PasteStore`]
//! trait, whose `take_view` is a single atomic increment-and-conditionally-
//! delete — the read-modify-write race on the last view is closed at the
//! storage layer, not above it. The token-bucket rate limiter lives here too,
//! as the second server-side gate next to proof-of-work.

pub mod rate_limit;
pub mod record;
pub mod service;
pub mod store;

pub use rate_limit::RateLimiter;
pub use record::PasteRecord;
pub use service::{CreateRequest, CreatedPaste, PasteService};
pub use store::{DeleteOutcome, MemoryStore, PasteStore, StoreError, ViewOutcome};
