//! Per-client token-bucket rate limiter
//!
//! One bucket per client key (normally the peer IP), created lazily at full
//! capacity, refilled continuously from wall-clock deltas. A single mutex
//! over the bucket map makes refill-and-spend one critical section, so two
//! concurrent requests can never both spend the last token. Evaluated
//! independently of the proof-of-work gate; either may reject.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sealbin_core::config::RateLimitConfig;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    capacity: f64,
    refill_per_sec: f64,
    idle: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity: config.capacity,
            refill_per_sec: config.refill_per_sec,
            idle: Duration::from_secs(config.idle_secs),
        }
    }

    /// Spend one token for `key` if available.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            tracing::debug!(key = %key, "rate limit exceeded");
            false
        }
    }

    /// Drop buckets idle past the configured horizon. An evicted key simply
    /// starts over at full capacity, which a long-idle key would have reached
    /// anyway.
    pub fn purge_idle(&self) {
        self.purge_idle_at(Instant::now());
    }

    fn purge_idle_at(&self, now: Instant) {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < self.idle);
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: f64, refill_per_sec: f64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            capacity,
            refill_per_sec,
            idle_secs: 3600,
        })
    }

    #[test]
    fn test_second_request_within_interval_rejected() {
        let limiter = limiter(1.0, 1.0);
        let now = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(!limiter.allow_at("1.2.3.4", now), "no token left");
    }

    #[test]
    fn test_refill_interval_restores_one_token() {
        let limiter = limiter(1.0, 1.0);
        let now = Instant::now();

        assert!(limiter.allow_at("k", now));
        assert!(!limiter.allow_at("k", now));
        assert!(limiter.allow_at("k", now + Duration::from_secs(1)));
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let limiter = limiter(2.0, 1.0);
        let now = Instant::now();

        assert!(limiter.allow_at("k", now));
        // A long idle period must not bank more than capacity
        let later = now + Duration::from_secs(3600);
        assert!(limiter.allow_at("k", later));
        assert!(limiter.allow_at("k", later));
        assert!(!limiter.allow_at("k", later));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1.0, 0.001);
        let now = Instant::now();

        assert!(limiter.allow_at("alice", now));
        assert!(limiter.allow_at("bob", now));
        assert!(!limiter.allow_at("alice", now));
    }

    #[test]
    fn test_fractional_refill_is_not_enough() {
        let limiter = limiter(1.0, 1.0);
        let now = Instant::now();

        assert!(limiter.allow_at("k", now));
        assert!(
            !limiter.allow_at("k", now + Duration::from_millis(500)),
            "half a token is not a token"
        );
    }

    #[test]
    fn test_purge_idle_drops_only_stale_buckets() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            capacity: 1.0,
            refill_per_sec: 1.0,
            idle_secs: 60,
        });
        let now = Instant::now();

        assert!(limiter.allow_at("old", now));
        assert!(limiter.allow_at("new", now + Duration::from_secs(59)));
        assert_eq!(limiter.tracked_keys(), 2);

        limiter.purge_idle_at(now + Duration::from_secs(61));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_no_double_spend_under_concurrency() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(1.0, 0.0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || limiter.allow("shared")));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1, "exactly one request may spend the last token");
    }
}
