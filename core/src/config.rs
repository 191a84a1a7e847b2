//! Client configuration.
//!
//! Defaults match a device reached directly on port 80 that shares logs
//! through the public log host. Every value can be overridden from the
//! environment with `ApiConfig::from_env`.

use std::env;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1";
pub const DEFAULT_LOG_SHARE_URL: &str = "https://logs.tinypilotkvm.com";

/// How `shutdown` reinterprets failures that a going-down device causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownPolicy {
    /// A 502 from the reverse proxy means its upstream already stopped.
    pub bad_gateway_is_success: bool,
    /// A connection lost mid-request means the device went down.
    pub connection_lost_is_success: bool,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            bad_gateway_is_success: true,
            connection_lost_is_success: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub log_share_url: String,
    pub shutdown: ShutdownPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            log_share_url: DEFAULT_LOG_SHARE_URL.to_string(),
            shutdown: ShutdownPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `PILOT_BASE_URL`, `PILOT_LOG_SHARE_URL`,
    /// `PILOT_SHUTDOWN_BAD_GATEWAY_IS_SUCCESS` and
    /// `PILOT_SHUTDOWN_CONNECTION_LOST_IS_SUCCESS`. Unparsable flags keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };
        Self {
            base_url: lookup("PILOT_BASE_URL").unwrap_or(defaults.base_url),
            log_share_url: lookup("PILOT_LOG_SHARE_URL").unwrap_or(defaults.log_share_url),
            shutdown: ShutdownPolicy {
                bad_gateway_is_success: flag(
                    "PILOT_SHUTDOWN_BAD_GATEWAY_IS_SUCCESS",
                    defaults.shutdown.bad_gateway_is_success,
                ),
                connection_lost_is_success: flag(
                    "PILOT_SHUTDOWN_CONNECTION_LOST_IS_SUCCESS",
                    defaults.shutdown.connection_lost_is_success,
                ),
            },
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(ApiConfig::from_lookup(|_| None), ApiConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let vars: HashMap<&str, &str> = [
            ("PILOT_BASE_URL", "http://10.0.0.5"),
            ("PILOT_SHUTDOWN_BAD_GATEWAY_IS_SUCCESS", "false"),
            ("PILOT_SHUTDOWN_CONNECTION_LOST_IS_SUCCESS", "maybe"),
        ]
        .into_iter()
        .collect();
        let config = ApiConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://10.0.0.5");
        assert_eq!(config.log_share_url, DEFAULT_LOG_SHARE_URL);
        assert!(!config.shutdown.bad_gateway_is_success);
        assert!(config.shutdown.connection_lost_is_success);
    }
}
