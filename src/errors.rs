//! Collector Error Hierarchy
//!
//! Errors are grouped by the layer that raises them: configuration loading,
//! target registry mutations, output formatting, and process infrastructure.
//! Only formatting errors are meant to reach a caller outside a reconciliation
//! pass; everything else is absorbed and logged where it happens.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or unreadable configuration source
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration parsed but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Per-target registry failures (add, delete, connect)
    #[error(transparent)]
    Target(#[from] TargetError),

    /// Message rendering failures surfaced to `print` callers
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Infrastructure-level failures (I/O, file watching, admin listener)
    #[error(transparent)]
    System(#[from] SystemError),
}

impl Error {
    /// `true` when the configuration source declares no targets at all.
    ///
    /// Reconciliation treats this as an empty desired set instead of a failure.
    pub fn is_no_targets(&self) -> bool {
        matches!(self, Error::Target(TargetError::NoTargetsFound))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Configuration source contains no target definitions
    #[error("no targets found")]
    NoTargetsFound,

    #[error("target {0:?} already exists")]
    AlreadyExists(String),

    #[error("target {0:?} does not exist")]
    NotFound(String),

    /// Address could not be turned into a transport endpoint
    #[error("target {name:?} has invalid address {address:?}")]
    InvalidAddress { name: String, address: String },

    /// Transport connection failure
    #[error("failed to connect target {name:?}")]
    Connect {
        name: String,
        #[source]
        source: Box<tonic::transport::Error>,
    },

    /// Initialization aborted by the shutdown signal
    #[error("initialization of target {0:?} cancelled")]
    Cancelled(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Requested output format has no registered formatter
    #[error("unsupported output format {0:?}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// File system notification backend failures
    #[error(transparent)]
    Watch(#[from] notify::Error),

    #[error("Admin server error: {0}")]
    AdminServer(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::System(SystemError::Io(e))
    }
}

impl From<notify::Error> for Error {
    fn from(e: notify::Error) -> Self {
        Error::System(SystemError::Watch(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(FormatError::Json(e))
    }
}
