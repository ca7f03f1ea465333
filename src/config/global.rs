use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_TARGET_TIMEOUT_MS;
use crate::constants::SUPPORTED_FORMATS;
use crate::Error;
use crate::Result;

/// Process-wide settings shared by output rendering, transport construction
/// and the admin endpoint.
///
/// The target-related fields (`username` .. `timeout_in_ms`) act as defaults
/// for every target that leaves them unset.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlobalSettings {
    /// Output format name; empty selects json with built-in renderers enabled
    #[serde(default)]
    pub format: String,

    /// Disable the `[target] ` prefix even when several targets are configured
    #[serde(default)]
    pub no_prefix: bool,

    #[serde(default)]
    pub debug: bool,

    /// Structured logging to stderr
    #[serde(default)]
    pub log: bool,

    /// Append logs to this file instead of stderr (empty = unset)
    #[serde(default)]
    pub log_file: String,

    /// Maximum receive message size in bytes, 0 keeps the transport default
    #[serde(default)]
    pub max_msg_size: usize,

    /// Honor proxy settings from the environment
    #[serde(default)]
    pub proxy_from_env: bool,

    /// Admin HTTP listen address (empty = disabled)
    #[serde(default)]
    pub api: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Plaintext transport
    #[serde(default)]
    pub insecure: bool,

    /// Skip server certificate verification
    #[serde(default)]
    pub skip_verify: bool,

    /// Per-target connect timeout in milliseconds
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            format: String::new(),
            no_prefix: false,
            debug: false,
            log: false,
            log_file: String::new(),
            max_msg_size: 0,
            proxy_from_env: false,
            api: String::new(),
            username: None,
            password: None,
            insecure: false,
            skip_verify: false,
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_FORMATS.contains(&self.format.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "unknown output format {:?}, expected one of {:?}",
                self.format,
                &SUPPORTED_FORMATS[1..]
            )));
        }

        if !self.api.is_empty() && self.api.parse::<SocketAddr>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "api address {:?} is not a valid socket address",
                self.api
            )));
        }

        if self.timeout_in_ms == 0 {
            return Err(Error::InvalidConfig("timeout_in_ms must be greater than 0".into()));
        }

        Ok(())
    }

    /// Logging is on when explicitly enabled, implied by debug, or routed to a file.
    pub fn logging_enabled(&self) -> bool {
        self.log || self.debug || !self.log_file.is_empty()
    }
}

fn default_timeout_in_ms() -> u64 {
    DEFAULT_TARGET_TIMEOUT_MS
}
