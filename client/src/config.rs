//! Configuration for a ready-to-use controller.

use std::env;
use std::time::Duration;

use pilot_core::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    /// Upper bound for each request. Operations never time out otherwise.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// `ApiConfig::from_env` plus `PILOT_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup("PILOT_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self {
            api: ApiConfig::from_lookup(&lookup),
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_optional() {
        assert_eq!(ClientConfig::from_lookup(|_| None).timeout, None);
        let config = ClientConfig::from_lookup(|k| (k == "PILOT_TIMEOUT_SECS").then(|| "10".to_string()));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        let config = ClientConfig::from_lookup(|k| (k == "PILOT_TIMEOUT_SECS").then(|| "0".to_string()));
        assert_eq!(config.timeout, None);
    }
}
