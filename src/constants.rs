// -
// Configuration sources

/// Environment variable naming an operator-supplied config file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
/// Prefix of environment overrides, e.g. `COLLECTOR__GLOBAL__FORMAT=json`
pub(crate) const ENV_PREFIX: &str = "COLLECTOR";
/// Config file picked up from the working directory when `CONFIG_PATH` is unset
pub(crate) const DEFAULT_CONFIG_FILE: &str = "collector.toml";

// -
// Targets

/// Port appended to target addresses that do not carry one
pub(crate) const DEFAULT_TARGET_PORT: u16 = 57400;
pub(crate) const DEFAULT_TARGET_TIMEOUT_MS: u64 = 10_000;

// -
// Output

/// Output format names understood by the default formatter ("" renders as json)
pub(crate) const SUPPORTED_FORMATS: &[&str] = &["", "json", "event"];
pub(crate) const OUTPUT_INDENT: &str = "  ";
/// Metadata key carrying the producer identity into the formatter
pub(crate) const SOURCE_METADATA_KEY: &str = "source";

// -
// Lifecycle

/// Buffered config change notifications awaiting reconciliation
pub(crate) const CONFIG_EVENT_BUFFER: usize = 64;
pub(crate) const SHUTDOWN_DRAIN_TIMEOUT_MS: u64 = 5_000;
