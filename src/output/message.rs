use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Payload encodings a device can advertise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Encoding {
    Json,
    Bytes,
    Proto,
    Ascii,
    JsonIetf,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Json => "JSON",
            Encoding::Bytes => "BYTES",
            Encoding::Proto => "PROTO",
            Encoding::Ascii => "ASCII",
            Encoding::JsonIetf => "JSON_IETF",
        }
    }
}

/// A schema model supported by a device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModelData {
    pub name: String,
    pub organization: String,
    pub version: String,
}

/// Feature set advertised by a device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CapabilityResponse {
    pub supported_models: Vec<ModelData>,
    pub supported_encodings: Vec<Encoding>,
    pub gnmi_version: String,
}

/// Protocol message handed to the output pipeline.
///
/// Only capability responses carry a built-in human readable layout; every
/// other variant is rendered by the configured formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Capabilities(CapabilityResponse),
    Get(Value),
    Set(Value),
    Subscribe(Value),
}

impl TelemetryMessage {
    /// Default header label for this message
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryMessage::Capabilities(_) => "Capabilities Response",
            TelemetryMessage::Get(_) => "Get Response",
            TelemetryMessage::Set(_) => "Set Response",
            TelemetryMessage::Subscribe(_) => "Subscribe Response",
        }
    }

    pub fn has_builtin_renderer(&self) -> bool {
        matches!(self, TelemetryMessage::Capabilities(_))
    }

    /// Generic tree representation consumed by formatters
    pub fn to_value(&self) -> Result<Value> {
        Ok(match self {
            TelemetryMessage::Capabilities(caps) => serde_json::to_value(caps)?,
            TelemetryMessage::Get(v)
            | TelemetryMessage::Set(v)
            | TelemetryMessage::Subscribe(v) => v.clone(),
        })
    }
}
