//! Redis-backed counter store.
//!
//! Lets every instance behind a load balancer share one set of counters.
//! Each check is a single atomic `MULTI`/`EXEC` pipeline of `INCR` and
//! `EXPIRE`, bounded by a timeout.
//!
//! The connection is opened lazily on first use and re-established by
//! `ConnectionManager` afterwards, so a Redis outage during boot degrades to
//! fail-open instead of aborting startup.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use url::Url;

use super::CounterStore;
use crate::error::{ServiceError, StoreError};

/// Connection parameters for the Redis counter store.
#[derive(Clone)]
pub struct RedisConfig {
    /// `host:port` of the Redis server.
    pub addr: String,
    pub password: Option<String>,
    /// Logical database index, used to keep rate-limit keys apart from
    /// other data on a shared server.
    pub db: u32,
    /// Upper bound on a single store round trip.
    pub timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_owned(),
            password: None,
            db: 10,
            timeout: Duration::from_millis(300),
        }
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("addr", &self.addr)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisConfig {
    /// Builds the `redis://` connection URL, percent-encoding the password.
    pub fn connection_url(&self) -> Result<String, ServiceError> {
        let mut url = Url::parse(&format!("redis://{}/{}", self.addr, self.db))
            .map_err(|e| ServiceError::Misconfiguration(format!("redis address: {e}")))?;

        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|()| {
                ServiceError::Misconfiguration("redis address cannot carry a password".to_owned())
            })?;
        }

        Ok(url.to_string())
    }
}

/// Counter store backed by a Redis server.
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Validates the connection parameters. Does not touch the network.
    pub fn new(config: &RedisConfig) -> Result<Self, ServiceError> {
        if config.timeout.is_zero() {
            return Err(ServiceError::Misconfiguration(
                "redis timeout must be greater than zero".to_owned(),
            ));
        }

        let client = Client::open(config.connection_url()?)
            .map_err(|e| ServiceError::Misconfiguration(format!("redis: {e}")))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout: config.timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                tracing::debug!("opening redis connection");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }

    async fn incr_inner(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .incr(key, 1)
            .expire(key, ttl.as_secs() as i64)
            .ignore();

        let (count,): (u64,) = pipe.query_async(&mut conn).await?;
        Ok(count)
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        tokio::time::timeout(self.timeout, self.incr_inner(key, ttl))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_selects_database() {
        let config = RedisConfig {
            addr: "cache.internal:6380".to_owned(),
            db: 3,
            ..RedisConfig::default()
        };
        assert_eq!(
            config.connection_url().unwrap(),
            "redis://cache.internal:6380/3"
        );
    }

    #[test]
    fn url_encodes_password() {
        let config = RedisConfig {
            password: Some("p@ss word".to_owned()),
            ..RedisConfig::default()
        };
        assert_eq!(
            config.connection_url().unwrap(),
            "redis://:p%40ss%20word@127.0.0.1:6379/10"
        );
    }

    #[test]
    fn debug_hides_password() {
        let config = RedisConfig {
            password: Some("secret".to_owned()),
            ..RedisConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = RedisConfig {
            timeout: Duration::ZERO,
            ..RedisConfig::default()
        };
        assert!(matches!(
            RedisStore::new(&config),
            Err(ServiceError::Misconfiguration(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_reports_unavailable() {
        // Port 1 on loopback refuses connections.
        let store = RedisStore::new(&RedisConfig {
            addr: "127.0.0.1:1".to_owned(),
            timeout: Duration::from_millis(500),
            ..RedisConfig::default()
        })
        .unwrap();

        assert!(store.incr("rate:u1:0", Duration::from_secs(60)).await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires Redis at 127.0.0.1:6379
    async fn incr_against_live_redis() {
        let store = RedisStore::new(&RedisConfig {
            db: 15,
            ..RedisConfig::default()
        })
        .unwrap();
        let key = format!("rategate-test:{}", uuid::Uuid::new_v4());
        let ttl = Duration::from_secs(60);

        assert_eq!(store.incr(&key, ttl).await.unwrap(), 1);
        assert_eq!(store.incr(&key, ttl).await.unwrap(), 2);
    }
}
