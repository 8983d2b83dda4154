//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the router's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `SILK_MAX_PATH_LEN`
//!
//! Longest request path, in bytes, the router will try to resolve. Longer
//! paths are answered with `NotFound` without walking the tree. Accepts:
//! - Decimal: `8192`
//! - Hexadecimal: `0x2000`
//!
//! Default: `8192`
//!
//! ### `SILK_LOG_ROUTES`
//!
//! When `1` or `true`, a summary of the routing table is logged at `info`
//! after a route table file has been loaded.
//!
//! Default: off
//!
//! ## Usage
//!
//! ```rust
//! use silkrouter::runtime_config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! println!("Max path length: {} bytes", config.max_path_len);
//! ```

use std::env;

const DEFAULT_MAX_PATH_LEN: usize = 0x2000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Longest path that will be resolved (default: 8 KiB)
    pub max_path_len: usize,
    /// Log the routing table after loading a route table file
    pub log_routes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_path_len: DEFAULT_MAX_PATH_LEN,
            log_routes: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_path_len = match lookup("SILK_MAX_PATH_LEN") {
            Some(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_MAX_PATH_LEN)
                } else {
                    val.parse().unwrap_or(DEFAULT_MAX_PATH_LEN)
                }
            }
            None => DEFAULT_MAX_PATH_LEN,
        };
        let log_routes = lookup("SILK_LOG_ROUTES")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        RouterConfig {
            max_path_len,
            log_routes,
        }
    }
}
