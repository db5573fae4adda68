use serde::{Deserialize, Serialize};

/// Top-level daemon configuration (loaded from sealbin.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SealbinConfig {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub pow: PowConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// API listen address (default: 127.0.0.1:8300)
    pub listen: String,
    /// Prometheus metrics endpoint (default: 127.0.0.1:9300)
    pub metrics_addr: Option<String>,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted ciphertext size in bytes (default: 10 MiB)
    pub max_ciphertext_bytes: usize,
    /// Minimum paste lifetime in seconds (default: 10)
    pub min_expiry_secs: u64,
    /// Maximum paste lifetime in seconds (default: 30 days)
    pub max_expiry_secs: u64,
}

/// Proof-of-work gate on paste creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Require a solved challenge before accepting a paste (default: true)
    pub enabled: bool,
    /// Required leading zero bits of SHA-256(challenge:nonce) (default: 20)
    pub difficulty: u8,
    /// Challenge time-to-live in seconds (default: 180)
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket capacity in tokens (default: 10)
    pub capacity: f64,
    /// Continuous refill rate in tokens per second (default: 0.5)
    pub refill_per_sec: f64,
    /// Drop buckets idle longer than this many seconds (default: 3600)
    pub idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8300".into(),
            metrics_addr: Some("127.0.0.1:9300".into()),
            log_level: "info".into(),
            log_format: "json".into(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ciphertext_bytes: 10 * 1024 * 1024,
            min_expiry_secs: 10,
            max_expiry_secs: 30 * 24 * 3600,
        }
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            difficulty: 20,
            ttl_secs: 180,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_per_sec: 0.5,
            idle_secs: 3600,
        }
    }
}
