//! Client-side solver: grind nonces cooperatively
//!
//! The search is CPU-bound and unbounded in the worst case, so it yields to
//! the runtime every batch of attempts and checks a cancellation token, which
//! keeps the surrounding task responsive and lets an abandoned submission
//! tear the search down.

use tokio_util::sync::CancellationToken;

use crate::error::SolveError;
use crate::{meets_difficulty, pow_digest};

/// Attempts between cooperative yield points.
const YIELD_BATCH: u64 = 4096;

/// Find the smallest nonce whose digest clears `difficulty` leading zero
/// bits. Cancelling `cancel` aborts the search at the next batch boundary.
pub async fn solve(
    challenge: &str,
    difficulty: u8,
    cancel: &CancellationToken,
) -> Result<u64, SolveError> {
    let mut nonce: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let batch_end = nonce.saturating_add(YIELD_BATCH);
        while nonce < batch_end {
            if meets_difficulty(&pow_digest(challenge, nonce), difficulty) {
                tracing::debug!(nonce, difficulty, "pow solved");
                return Ok(nonce);
            }
            if nonce == u64::MAX {
                return Err(SolveError::Exhausted);
            }
            nonce += 1;
        }

        tokio::task::yield_now().await;
    }
}
