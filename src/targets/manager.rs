use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;
use tonic::transport::Certificate;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::DialSettings;
use super::TargetRegistry;
use crate::constants::DEFAULT_TARGET_TIMEOUT_MS;
use crate::metrics;
use crate::Result;
use crate::TargetConfig;
use crate::TargetError;

/// Connection lifecycle of a registered target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    /// Registered, initialization not started
    Pending,
    Connecting,
    Connected,
    Failed(String),
    Cancelled,
}

/// Registry entry for one device
pub struct Target {
    pub config: TargetConfig,
    pub state: TargetState,
    pub(crate) channel: Option<Channel>,
    /// Fired when the target is deleted so an in-flight init stops early
    cancel: CancellationToken,
    /// Distinguishes a re-added target from the entry an init started on
    generation: u64,
}

impl Target {
    fn new(
        config: TargetConfig,
        generation: u64,
    ) -> Self {
        Self {
            config,
            state: TargetState::Pending,
            channel: None,
            cancel: CancellationToken::new(),
            generation,
        }
    }
}

/// Connected channel plus the limits clients built on it must apply
#[derive(Debug, Clone)]
pub struct TargetChannel {
    pub channel: Channel,
    /// Largest message a client on this channel may decode, `None` for the
    /// client default. Apply with the generated client's
    /// `max_decoding_message_size`.
    pub max_decoding_message_size: Option<usize>,
}

/// `DashMap`-backed [`TargetRegistry`] connecting targets over gRPC channels.
pub struct TargetManager {
    targets: DashMap<String, Target>,
    dial: DialSettings,
    next_generation: AtomicU64,
}

impl TargetManager {
    pub fn new(dial: DialSettings) -> Self {
        if dial.proxy_from_env {
            warn!("proxy_from_env requested: gRPC channels always connect directly");
        }
        Self {
            targets: DashMap::new(),
            dial,
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn state(
        &self,
        name: &str,
    ) -> Option<TargetState> {
        self.targets.get(name).map(|t| t.state.clone())
    }

    /// Transport channel of a connected target
    pub fn channel(
        &self,
        name: &str,
    ) -> Option<TargetChannel> {
        let channel = self.targets.get(name).and_then(|t| t.channel.clone())?;
        Some(TargetChannel {
            channel,
            max_decoding_message_size: self.dial.max_recv_msg_size,
        })
    }

    /// Updates the entry only while it is still the one registered as
    /// `generation`.
    fn update(
        &self,
        name: &str,
        generation: u64,
        f: impl FnOnce(&mut Target),
    ) -> bool {
        match self.targets.get_mut(name) {
            Some(mut target) if target.generation == generation => {
                f(&mut target);
                true
            }
            _ => false,
        }
    }

    async fn connect(
        &self,
        config: &TargetConfig,
    ) -> Result<Channel> {
        let mut endpoint = endpoint(config)?.connect_timeout(Duration::from_millis(
            config.timeout_in_ms.unwrap_or(DEFAULT_TARGET_TIMEOUT_MS),
        ));

        if !config.is_insecure() {
            endpoint = endpoint
                .tls_config(tls_config(config).await?)
                .map_err(|e| connect_error(config, e))?;
        }

        if !self.dial.block {
            return Ok(endpoint.connect_lazy());
        }

        endpoint.connect().await.map_err(|e| connect_error(config, e))
    }
}

#[async_trait]
impl TargetRegistry for TargetManager {
    fn add_target(
        &self,
        config: TargetConfig,
    ) -> Result<()> {
        endpoint(&config)?;

        match self.targets.entry(config.name.clone()) {
            Entry::Occupied(_) => Err(TargetError::AlreadyExists(config.name).into()),
            Entry::Vacant(slot) => {
                debug!(
                    target_name = %config.name,
                    address = %config.address,
                    "target registered"
                );
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                slot.insert(Target::new(config, generation));
                Ok(())
            }
        }
    }

    fn delete_target(
        &self,
        name: &str,
    ) -> Result<()> {
        let (_, target) = self
            .targets
            .remove(name)
            .ok_or_else(|| TargetError::NotFound(name.to_string()))?;
        target.cancel.cancel();
        debug!(target_name = %name, "target removed");
        Ok(())
    }

    fn target_names(&self) -> HashSet<String> {
        self.targets.iter().map(|t| t.key().clone()).collect()
    }

    fn target_count(&self) -> usize {
        self.targets.len()
    }

    async fn init_target(
        &self,
        shutdown: CancellationToken,
        name: String,
    ) {
        let Some((config, cancel, generation)) = self
            .targets
            .get(&name)
            .map(|t| (t.config.clone(), t.cancel.clone(), t.generation))
        else {
            warn!(target_name = %name, "init requested for unknown target");
            return;
        };

        self.update(&name, generation, |t| t.state = TargetState::Connecting);
        let cancelled = || crate::Error::from(TargetError::Cancelled(name.clone()));
        let result = tokio::select! {
            _ = shutdown.cancelled() => Err(cancelled()),
            _ = cancel.cancelled() => Err(cancelled()),
            r = self.connect(&config) => r,
        };

        match result {
            Ok(channel) => {
                let current = self.update(&name, generation, |t| {
                    t.channel = Some(channel);
                    t.state = TargetState::Connected;
                });
                if !current {
                    debug!(target_name = %name, "target replaced during initialization");
                    return;
                }
                metrics::record_target_operation("init", true);
                info!(target_name = %name, address = %config.address, "target initialized");
            }
            Err(crate::Error::Target(TargetError::Cancelled(_))) => {
                self.update(&name, generation, |t| t.state = TargetState::Cancelled);
                debug!(target_name = %name, "target initialization cancelled");
            }
            Err(e) => {
                self.update(&name, generation, |t| {
                    t.state = TargetState::Failed(e.to_string())
                });
                metrics::record_target_operation("init", false);
                warn!(target_name = %name, "failed to initialize target: {:?}", e);
            }
        }
    }
}

fn endpoint(config: &TargetConfig) -> Result<Endpoint> {
    let scheme = if config.is_insecure() { "http" } else { "https" };
    Endpoint::from_shared(format!("{}://{}", scheme, config.address)).map_err(|_| {
        TargetError::InvalidAddress {
            name: config.name.clone(),
            address: config.address.clone(),
        }
        .into()
    })
}

async fn tls_config(config: &TargetConfig) -> Result<ClientTlsConfig> {
    if config.skip_verify.unwrap_or(false) {
        warn!(
            target_name = %config.name,
            "skip_verify is not supported, the server certificate is still verified"
        );
    }

    let host = config
        .address
        .rsplit_once(':')
        .map(|(host, _)| host.trim_start_matches('[').trim_end_matches(']'))
        .unwrap_or(&config.address);
    let mut tls = ClientTlsConfig::new().domain_name(host);
    if let Some(ca) = &config.tls_ca {
        let pem = tokio::fs::read(ca).await?;
        tls = tls.ca_certificate(Certificate::from_pem(pem));
    }
    Ok(tls)
}

fn connect_error(
    config: &TargetConfig,
    e: tonic::transport::Error,
) -> crate::Error {
    TargetError::Connect {
        name: config.name.clone(),
        source: Box::new(e),
    }
    .into()
}
