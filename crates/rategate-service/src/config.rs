//! Gate configuration and its startup validation.

use std::num::NonZeroU64;

use crate::error::ServiceError;
use crate::gate::Policy;

/// Which counter store backs the gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// Shared Redis counters (multi-instance deployments).
    #[default]
    Redis,
    /// Process-local counters.
    Memory,
}

/// Rate gate settings, passed explicitly to the gate at construction.
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// When false the gate admits everything without touching the store.
    pub enabled: bool,
    /// Requests allowed per identity per one-minute window.
    pub limit: u64,
    /// Prefix for every counter key in the store.
    pub key_prefix: String,
    /// Request path prefixes that bypass the gate.
    pub skip_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 300,
            key_prefix: "rate:".to_owned(),
            skip_prefixes: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Shorthand for an enabled gate with the given per-minute limit.
    pub fn enforcing(limit: u64) -> Self {
        Self {
            enabled: true,
            limit,
            ..Self::default()
        }
    }

    /// Rejects settings that can only be caught at startup.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.enabled && self.limit == 0 {
            return Err(ServiceError::Misconfiguration(
                "rate limit count must be greater than zero".to_owned(),
            ));
        }
        if self.key_prefix.is_empty() {
            return Err(ServiceError::Misconfiguration(
                "rate limit key prefix must not be empty".to_owned(),
            ));
        }
        if let Some(bad) = self.skip_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ServiceError::Misconfiguration(format!(
                "skip prefix '{bad}' must start with '/'"
            )));
        }
        Ok(())
    }

    /// The admission policy these settings select.
    pub fn policy(&self) -> Result<Policy, ServiceError> {
        self.validate()?;
        if !self.enabled {
            return Ok(Policy::AlwaysAllow);
        }
        NonZeroU64::new(self.limit)
            .map(Policy::Enforcing)
            .ok_or_else(|| ServiceError::Misconfiguration("rate limit count is zero".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_gate_allows_zero_limit() {
        let config = GateConfig {
            limit: 0,
            ..GateConfig::default()
        };
        assert!(matches!(config.policy(), Ok(Policy::AlwaysAllow)));
    }

    #[test]
    fn enabled_gate_rejects_zero_limit() {
        let err = GateConfig::enforcing(0).validate().unwrap_err();
        assert!(matches!(err, ServiceError::Misconfiguration(_)));
    }

    #[test]
    fn enabled_gate_enforces_limit() {
        let policy = GateConfig::enforcing(5).policy().unwrap();
        assert_eq!(policy, Policy::Enforcing(NonZeroU64::new(5).unwrap()));
    }

    #[test]
    fn skip_prefix_must_be_absolute() {
        let config = GateConfig {
            skip_prefixes: vec!["/api/v1/pub/".to_owned(), "health".to_owned()],
            ..GateConfig::enforcing(5)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_key_prefix_is_rejected() {
        let config = GateConfig {
            key_prefix: String::new(),
            ..GateConfig::enforcing(5)
        };
        assert!(config.validate().is_err());
    }
}
