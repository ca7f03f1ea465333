use std::collections::HashMap;
use std::fmt::Debug;

use serde::Deserialize;
use serde::Serialize;

use super::GlobalSettings;
use crate::constants::DEFAULT_TARGET_PORT;

/// Desired targets keyed by name
pub type TargetSet = HashMap<String, TargetConfig>;

/// Connection parameters for one monitored device.
///
/// Targets are identified by `name` alone; two descriptors with the same
/// name are the same target to the reconciler whatever their other fields say.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TargetConfig {
    /// Filled from the config map key when resolved
    #[serde(default)]
    pub name: String,

    /// `host:port`; defaults to the target name
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default)]
    pub skip_verify: Option<bool>,

    #[serde(default)]
    pub timeout_in_ms: Option<u64>,

    /// CA bundle used to verify the device certificate
    #[serde(default)]
    pub tls_ca: Option<String>,

    /// Names of the subscriptions this target participates in
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

impl Debug for TargetConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("username", &self.username)
            .field("insecure", &self.insecure)
            .field("skip_verify", &self.skip_verify)
            .field("timeout_in_ms", &self.timeout_in_ms)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

impl TargetConfig {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Fills unset fields from the map key and the global defaults.
    pub(crate) fn resolve(
        mut self,
        name: &str,
        global: &GlobalSettings,
    ) -> Self {
        self.name = name.to_string();
        if self.address.is_empty() {
            self.address = name.to_string();
        }
        if !has_port(&self.address) {
            let host = if self.address.contains(':') && !self.address.starts_with('[') {
                format!("[{}]", self.address)
            } else {
                self.address.clone()
            };
            self.address = format!("{host}:{DEFAULT_TARGET_PORT}");
        }
        if self.username.is_none() {
            self.username = global.username.clone();
        }
        if self.password.is_none() {
            self.password = global.password.clone();
        }
        self.insecure.get_or_insert(global.insecure);
        self.skip_verify.get_or_insert(global.skip_verify);
        self.timeout_in_ms.get_or_insert(global.timeout_in_ms);
        self
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure.unwrap_or(false)
    }
}

/// Handles `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
fn has_port(address: &str) -> bool {
    if let Some(rest) = address.strip_prefix('[') {
        return rest.split_once("]:").is_some();
    }
    match address.matches(':').count() {
        1 => true,
        // bare IPv6 literal without brackets cannot carry a port
        _ => false,
    }
}
