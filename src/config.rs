//! Server configuration via CLI args and environment variables.

#[cfg(feature = "redis")]
use std::time::Duration;

use clap::{Parser, ValueEnum};

use rategate_service::ServiceConfig;
use rategate_service::config::{GateConfig, StoreKind};
#[cfg(feature = "redis")]
use rategate_service::store::RedisConfig;

/// Counter store selection on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreArg {
    Redis,
    Memory,
}

/// Per-user rate limiting gateway for the admin backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "rategate-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "RATEGATE_HOST")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080, env = "RATEGATE_PORT")]
    pub port: u16,

    /// Log level.
    #[arg(long, default_value = "info", env = "RATEGATE_LOG_LEVEL")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[arg(long, default_value = "text", env = "RATEGATE_LOG_FORMAT")]
    pub log_format: String,

    /// Enforce per-user rate limits.
    #[arg(long, default_value_t = false, env = "RATEGATE_RATE_LIMIT_ENABLE")]
    pub rate_limit_enable: bool,

    /// Requests allowed per user per minute.
    #[arg(long, default_value_t = 300, env = "RATEGATE_RATE_LIMIT_COUNT")]
    pub rate_limit_count: u64,

    /// Counter store backing the limiter.
    #[arg(long, value_enum, default_value = "redis", env = "RATEGATE_RATE_LIMIT_STORE")]
    pub rate_limit_store: StoreArg,

    /// Path prefixes exempt from rate limiting (comma-separated).
    #[arg(long, env = "RATEGATE_RATE_LIMIT_SKIP_PREFIXES", value_delimiter = ',')]
    pub rate_limit_skip_prefixes: Vec<String>,

    /// Prefix for counter keys in the store.
    #[arg(long, default_value = "rate:", env = "RATEGATE_RATE_LIMIT_KEY_PREFIX")]
    pub rate_limit_key_prefix: String,

    /// Redis server address (host:port).
    #[arg(long, default_value = "127.0.0.1:6379", env = "RATEGATE_REDIS_ADDR")]
    pub redis_addr: String,

    /// Redis password.
    #[arg(long, env = "RATEGATE_REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Redis database index holding the counters.
    #[arg(long, default_value_t = 10, env = "RATEGATE_REDIS_DB")]
    pub redis_db: u32,

    /// Timeout for a single Redis round trip in milliseconds.
    #[arg(long, default_value_t = 300, env = "RATEGATE_REDIS_TIMEOUT_MS")]
    pub redis_timeout_ms: u64,

    /// Trusted header carrying the authenticated user id.
    #[arg(long, default_value = "x-user-id", env = "RATEGATE_IDENTITY_HEADER")]
    pub identity_header: String,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The service-layer subset of this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            gate: GateConfig {
                enabled: self.rate_limit_enable,
                limit: self.rate_limit_count,
                key_prefix: self.rate_limit_key_prefix.clone(),
                skip_prefixes: self
                    .rate_limit_skip_prefixes
                    .iter()
                    .map(|p| p.trim().to_owned())
                    .filter(|p| !p.is_empty())
                    .collect(),
            },
            store: match self.rate_limit_store {
                StoreArg::Redis => StoreKind::Redis,
                StoreArg::Memory => StoreKind::Memory,
            },
            #[cfg(feature = "redis")]
            redis: RedisConfig {
                addr: self.redis_addr.clone(),
                password: self.redis_password.clone(),
                db: self.redis_db,
                timeout: Duration::from_millis(self.redis_timeout_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("rategate-server").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_admin_backend() {
        let config = parse(&[]);
        let service = config.service_config();
        assert!(!service.gate.enabled);
        assert_eq!(service.gate.limit, 300);
        assert_eq!(service.store, StoreKind::Redis);
        #[cfg(feature = "redis")]
        assert_eq!(service.redis.db, 10);
    }

    #[test]
    fn skip_prefixes_are_split_and_trimmed() {
        let config = parse(&[
            "--rate-limit-enable",
            "--rate-limit-store",
            "memory",
            "--rate-limit-skip-prefixes",
            "/health, /api/v1/pub/,",
        ]);
        let service = config.service_config();
        assert!(service.gate.enabled);
        assert_eq!(service.store, StoreKind::Memory);
        assert_eq!(service.gate.skip_prefixes, ["/health", "/api/v1/pub/"]);
    }
}
