//! Telemetry output: message model, formatters and the serialized print
//! pipeline shared by all producers.
mod capabilities;
mod formatter;
mod message;
mod pipeline;
pub use capabilities::*;
pub use formatter::*;
pub use message::*;
pub use pipeline::*;
