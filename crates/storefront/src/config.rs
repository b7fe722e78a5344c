//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use checkout::CheckoutConfig;
use domain::{CartConfig, DEFAULT_MAX_LINE_QUANTITY};

/// Storefront configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `STOREFRONT_DATA_DIR`: directory for session files (default: unset, in-memory)
/// - `MAX_LINE_QUANTITY`: per-line quantity cap (default: `10`)
/// - `GATEWAY_TIMEOUT_MS`: payment resource load timeout (default: `10000`)
/// - `ORDER_SUBMIT_TIMEOUT_MS`: order backend timeout (default: `15000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub cart: CartConfig,
    pub checkout: CheckoutConfig,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from `lookup`, falling back to defaults.
    ///
    /// Unparseable numbers fall back to the default as well.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        Self {
            data_dir: lookup("STOREFRONT_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            cart: CartConfig {
                max_line_quantity: lookup("MAX_LINE_QUANTITY")
                    .and_then(|v| v.parse().ok())
                    .filter(|max| *max > 0)
                    .unwrap_or(defaults.cart.max_line_quantity),
            },
            checkout: CheckoutConfig {
                gateway_timeout: millis("GATEWAY_TIMEOUT_MS")
                    .unwrap_or(defaults.checkout.gateway_timeout),
                submit_timeout: millis("ORDER_SUBMIT_TIMEOUT_MS")
                    .unwrap_or(defaults.checkout.submit_timeout),
            },
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            cart: CartConfig {
                max_line_quantity: DEFAULT_MAX_LINE_QUANTITY,
            },
            checkout: CheckoutConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.data_dir, None);
        assert_eq!(config.cart.max_line_quantity, 10);
        assert_eq!(config.checkout.gateway_timeout, Duration::from_secs(10));
        assert_eq!(config.checkout.submit_timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
    }

    #[test]
    fn test_values_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("STOREFRONT_DATA_DIR", "/tmp/storefront"),
            ("MAX_LINE_QUANTITY", "5"),
            ("GATEWAY_TIMEOUT_MS", "250"),
            ("ORDER_SUBMIT_TIMEOUT_MS", "750"),
            ("RUST_LOG", "debug"),
        ]));

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/storefront")));
        assert_eq!(config.cart.max_line_quantity, 5);
        assert_eq!(config.checkout.gateway_timeout, Duration::from_millis(250));
        assert_eq!(config.checkout.submit_timeout, Duration::from_millis(750));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("MAX_LINE_QUANTITY", "0"),
            ("GATEWAY_TIMEOUT_MS", "soon"),
            ("STOREFRONT_DATA_DIR", "  "),
        ]));

        assert_eq!(config.cart.max_line_quantity, 10);
        assert_eq!(config.checkout.gateway_timeout, Duration::from_secs(10));
        assert_eq!(config.data_dir, None);
    }
}
