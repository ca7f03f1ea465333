//! Configuration management for the collector.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (TOML)
//! - Environment variable overrides
//! - Target defaults inherited from the global section
mod global;
mod loader;
mod target;
pub use global::*;
pub use loader::*;
pub use target::*;
#[cfg(test)]
mod loader_test;

use std::env;
use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::constants::ENV_PREFIX;
use crate::Error;
use crate::Result;
use crate::TargetError;

/// Main configuration container
///
/// Sources are merged with increasing priority:
/// 1. Default values from code implementation
/// 2. Configuration file
/// 3. Environment variables prefixed with `COLLECTOR__`
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct CollectorConfig {
    #[serde(default)]
    pub global: GlobalSettings,
    /// Declared targets keyed by name
    #[serde(default)]
    pub targets: TargetSet,
}

impl Debug for CollectorConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let mut names: Vec<&String> = self.targets.keys().collect();
        names.sort();
        f.debug_struct("CollectorConfig")
            .field("global", &self.global)
            .field("targets", &names)
            .finish()
    }
}

impl CollectorConfig {
    /// Loads configuration from defaults, the file named by `CONFIG_PATH`
    /// (required when set) and environment variables, without validation.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let config: Self = builder.add_source(env_source()).build()?.try_deserialize()?;
        Ok(config)
    }

    /// Loads defaults + the given file + environment variables.
    ///
    /// Used on every reload so that values removed from the file fall back to
    /// their defaults instead of sticking around from a previous load.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::default().with_override_config(path)
    }

    /// Applies additional overrides from file without validation.
    pub fn with_override_config(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Resolves the startup configuration and the file to watch.
    ///
    /// A file named through `CONFIG_PATH` was explicitly requested, so any
    /// failure to read or parse it is returned. Otherwise `collector.toml` in
    /// the working directory is used when present.
    pub fn load() -> Result<LoadedConfig> {
        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            let config = Self::from_file(&config_path)?.validate()?;
            return Ok(LoadedConfig {
                config,
                path: Some(PathBuf::from(config_path)),
                fallback_error: None,
            });
        }

        Self::load_with_fallback(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads `fallback` when it exists, falling back to defaults.
    ///
    /// A fallback file that cannot be loaded still becomes the watch path so
    /// that a corrected write is picked up later. The failure is handed back
    /// in [`LoadedConfig::fallback_error`] for the caller to log once logging
    /// is set up.
    pub(crate) fn load_with_fallback(fallback: PathBuf) -> Result<LoadedConfig> {
        if !fallback.exists() {
            return Ok(LoadedConfig {
                config: Self::new()?.validate()?,
                path: None,
                fallback_error: None,
            });
        }

        match Self::from_file(&fallback).and_then(Self::validate) {
            Ok(config) => Ok(LoadedConfig {
                config,
                path: Some(fallback),
                fallback_error: None,
            }),
            Err(e) => Ok(LoadedConfig {
                config: Self::new()?.validate()?,
                path: Some(fallback),
                fallback_error: Some(e),
            }),
        }
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.global.validate()?;

        for (name, target) in &self.targets {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig("target name cannot be empty".into()));
            }
            if target.timeout_in_ms == Some(0) {
                return Err(Error::InvalidConfig(format!(
                    "target {name:?} timeout_in_ms must be greater than 0"
                )));
            }
        }

        Ok(self)
    }

    /// Declared targets with global defaults applied.
    ///
    /// # Errors
    /// [`TargetError::NoTargetsFound`] when the configuration declares none.
    pub fn resolved_targets(&self) -> Result<TargetSet> {
        if self.targets.is_empty() {
            return Err(TargetError::NoTargetsFound.into());
        }

        Ok(self
            .targets
            .iter()
            .map(|(name, target)| (name.clone(), target.clone().resolve(name, &self.global)))
            .collect())
    }
}

/// Outcome of [`CollectorConfig::load`]
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: CollectorConfig,
    /// File to watch for changes
    pub path: Option<PathBuf>,
    /// Why the implicit config file could not be used
    pub fallback_error: Option<Error>,
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
