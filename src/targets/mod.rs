//! Live target registry.
//!
//! The registry owns one entry per monitored device and the transport
//! channel used to reach it. The reconciler drives it through the
//! [`TargetRegistry`] trait; [`TargetManager`] is the default implementation.
mod dial;
mod manager;
pub use dial::*;
pub use manager::*;

use std::collections::HashSet;

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

use crate::Result;
use crate::TargetConfig;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TargetRegistry: Send + Sync + 'static {
    /// Registers a target without connecting to it.
    ///
    /// # Errors
    /// - [`crate::TargetError::AlreadyExists`] if the name is taken
    /// - [`crate::TargetError::InvalidAddress`] if no endpoint can be built from the address
    fn add_target(
        &self,
        config: TargetConfig,
    ) -> Result<()>;

    /// Removes a target, aborting its initialization if still in flight.
    ///
    /// # Errors
    /// [`crate::TargetError::NotFound`] if the name is not registered
    fn delete_target(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Names of all registered targets
    fn target_names(&self) -> HashSet<String>;

    fn target_count(&self) -> usize;

    /// Establishes the transport for a registered target.
    ///
    /// Errors stay inside the registry (logged and recorded on the target);
    /// the call returns once the target is connected, failed, or `shutdown`
    /// fired.
    async fn init_target(
        &self,
        shutdown: CancellationToken,
        name: String,
    );
}
