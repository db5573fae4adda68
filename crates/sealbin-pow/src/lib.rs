//! sealbin-pow: hashcash-style anti-abuse gate on paste creation
//!
//! The server issues a random challenge with a difficulty (required leading
//! zero bits); the client grinds nonces until
//! `SHA-256(challenge ":" nonce)` clears the bar; the server verifies cheaply
//! and consumes the challenge atomically so each one is good for exactly one
//! paste. Verification is O(1), solving is O(2^difficulty) expected.

pub mod challenge;
pub mod error;
pub mod solve;

pub use challenge::{Challenge, ChallengeStore, MemoryChallengeStore, PowGate};
pub use error::{PowError, SolveError};
pub use solve::solve;

use sha2::{Digest, Sha256};

/// The digest a solution is judged on: `SHA-256(challenge ":" nonce)` with
/// the nonce rendered in decimal.
pub fn pow_digest(challenge: &str, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(challenge.as_bytes());
    hasher.update(b":");
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// Count consecutive zero bits from the most significant bit, stopping at the
/// first set bit.
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut bits = 0;
    for &byte in digest {
        if byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// Whether `digest` clears `difficulty` leading zero bits.
pub fn meets_difficulty(digest: &[u8], difficulty: u8) -> bool {
    leading_zero_bits(digest) >= u32::from(difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zero_bits_boundaries() {
        assert_eq!(leading_zero_bits(&[0x80, 0x00]), 0);
        assert_eq!(leading_zero_bits(&[0x40, 0x00]), 1);
        assert_eq!(leading_zero_bits(&[0x01, 0xff]), 7);
        assert_eq!(leading_zero_bits(&[0x00, 0xff]), 8);
        assert_eq!(leading_zero_bits(&[0x00, 0x20]), 10);
        assert_eq!(leading_zero_bits(&[0x00, 0x00]), 16);
        assert_eq!(leading_zero_bits(&[]), 0);
    }

    #[test]
    fn test_counting_is_bitwise_not_bytewise() {
        // 0x00 0x10 = 8 + 3 zero bits, not "one zero byte"
        assert_eq!(leading_zero_bits(&[0x00, 0x10]), 11);
        assert!(meets_difficulty(&[0x00, 0x10], 11));
        assert!(!meets_difficulty(&[0x00, 0x10], 12));
    }

    #[test]
    fn test_digest_depends_on_challenge_and_nonce() {
        let d1 = pow_digest("abc", 0);
        let d2 = pow_digest("abc", 1);
        let d3 = pow_digest("abd", 0);

        assert_ne!(d1, d2);
        assert_ne!(d1, d3);
        assert_eq!(d1, pow_digest("abc", 0));
    }

    #[test]
    fn test_digest_separator_matters() {
        // "ab" + nonce 1 must not collide with "ab1" + implicit empty nonce
        // framing; the ":" separator fixes the parse.
        let with_sep = pow_digest("ab", 1);
        let mut hasher = sha2::Sha256::new();
        hasher.update(b"ab1");
        let without: [u8; 32] = hasher.finalize().into();
        assert_ne!(with_sep, without);
    }
}
