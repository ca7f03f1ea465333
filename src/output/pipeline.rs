//! Serialized rendering of telemetry messages.
//!
//! Any number of producers may call [`OutputPipeline::print`] concurrently.
//! A single lock covers every sink, so the header, body and any error echo of
//! one call always land as one contiguous block.

use std::collections::HashMap;
use std::io;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use super::render_capabilities;
use super::Formatter;
use super::MarshalOptions;
use super::TelemetryMessage;
use crate::constants::OUTPUT_INDENT;
use crate::constants::SOURCE_METADATA_KEY;
use crate::metrics;
use crate::GlobalSettings;
use crate::Result;
use crate::TargetLoader;

/// Formatting subset of [`GlobalSettings`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSettings {
    pub format: String,
    pub no_prefix: bool,
    /// When false, formatting errors are echoed to the echo sink as well
    pub log_enabled: bool,
}

impl From<&GlobalSettings> for OutputSettings {
    fn from(settings: &GlobalSettings) -> Self {
        Self {
            format: settings.format.clone(),
            no_prefix: settings.no_prefix,
            log_enabled: settings.logging_enabled(),
        }
    }
}

type Sink = Box<dyn Write + Send>;

struct Sinks {
    /// Rendered messages
    out: Sink,
    /// Message kind labels
    header: Sink,
    /// Formatting errors when logging is off
    echo: Sink,
}

pub struct OutputPipeline {
    sinks: Mutex<Sinks>,
    formatter: Arc<dyn Formatter>,
    settings: OutputSettings,
    /// Declared targets decide whether output is prefixed with its source
    targets: Arc<dyn TargetLoader>,
}

impl OutputPipeline {
    /// Pipeline writing messages and error echoes to stdout, headers to stderr
    pub fn stdio(
        formatter: Arc<dyn Formatter>,
        settings: OutputSettings,
        targets: Arc<dyn TargetLoader>,
    ) -> Self {
        Self {
            sinks: Mutex::new(Sinks {
                out: Box::new(io::stdout()),
                header: Box::new(io::stderr()),
                echo: Box::new(io::stdout()),
            }),
            formatter,
            settings,
            targets,
        }
    }

    /// Replaces the output sinks
    pub fn with_sinks(
        self,
        out: impl Write + Send + 'static,
        header: impl Write + Send + 'static,
        echo: impl Write + Send + 'static,
    ) -> Self {
        *self.sinks.lock() = Sinks {
            out: Box::new(out),
            header: Box::new(header),
            echo: Box::new(echo),
        };
        self
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    /// Renders one message from `source` under the `kind` header.
    ///
    /// # Errors
    /// Formatter failures and sink write failures are returned after being
    /// logged; the caller decides whether the message counts as delivered.
    pub fn print(
        &self,
        source: &str,
        kind: &str,
        msg: &TelemetryMessage,
    ) -> Result<()> {
        let mut sinks = self.sinks.lock();
        let result = self.render(&mut sinks, source, kind, msg);
        if result.is_err() {
            metrics::PRINT_FAILURES.inc();
        }
        result
    }

    fn render(
        &self,
        sinks: &mut Sinks,
        source: &str,
        kind: &str,
        msg: &TelemetryMessage,
    ) -> Result<()> {
        writeln!(sinks.header, "{kind}")?;
        let prefix = self.prefix(source);

        match msg {
            TelemetryMessage::Capabilities(caps) if self.uses_builtin_renderer(msg) => {
                let text = render_capabilities(&prefix, caps);
                sinks.out.write_all(text.as_bytes())?;
                sinks.out.flush()?;
                return Ok(());
            }
            _ => {}
        }

        let opts = MarshalOptions {
            multiline: true,
            indent: OUTPUT_INDENT.to_string(),
            format: self.settings.format.clone(),
        };
        let meta = HashMap::from([(SOURCE_METADATA_KEY.to_string(), source.to_string())]);
        let bytes = match self.formatter.marshal(msg, &opts, &meta) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("error marshaling {}: {}", kind, e);
                if !self.settings.log_enabled {
                    writeln!(sinks.echo, "error marshaling {kind}: {e}")?;
                }
                return Err(e);
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        writeln!(sinks.out, "{}", prefix_lines(&prefix, &text))?;
        sinks.out.flush()?;
        Ok(())
    }

    /// Built-in layouts are only used when no explicit format is configured.
    fn uses_builtin_renderer(
        &self,
        msg: &TelemetryMessage,
    ) -> bool {
        self.settings.format.is_empty() && msg.has_builtin_renderer()
    }

    /// Source label put in front of every output line
    pub(crate) fn prefix(
        &self,
        source: &str,
    ) -> String {
        if self.targets.declared_count() > 1 && !self.settings.no_prefix {
            format!("[{source}] ")
        } else {
            String::new()
        }
    }
}

/// Prepends `prefix` to every line of `text`, dropping one trailing newline.
pub(crate) fn prefix_lines(
    prefix: &str,
    text: &str,
) -> String {
    let text = text.strip_suffix('\n').unwrap_or(text);
    if prefix.is_empty() {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
