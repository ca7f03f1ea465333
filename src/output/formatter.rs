use std::collections::BTreeMap;
use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::TelemetryMessage;
use crate::FormatError;
use crate::Result;

/// Rendering options passed to every [`Formatter::marshal`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalOptions {
    pub multiline: bool,
    pub indent: String,
    /// Format name; empty selects the formatter's default
    pub format: String,
}

#[cfg_attr(test, automock)]
pub trait Formatter: Send + Sync + 'static {
    /// Renders `msg` in the requested format, attaching `meta` (e.g. the
    /// producing target) where the format has room for it.
    fn marshal(
        &self,
        msg: &TelemetryMessage,
        opts: &MarshalOptions,
        meta: &HashMap<String, String>,
    ) -> Result<Vec<u8>>;
}

/// Built-in formats: `json` (also the empty format) and `event`.
///
/// `event` flattens the message tree into `path: value` lines, one per leaf.
#[derive(Debug, Clone, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn marshal(
        &self,
        msg: &TelemetryMessage,
        opts: &MarshalOptions,
        meta: &HashMap<String, String>,
    ) -> Result<Vec<u8>> {
        let value = msg.to_value()?;
        match opts.format.as_str() {
            "" | "json" => marshal_json(value, opts, meta),
            "event" => Ok(marshal_event(&value, opts, meta).into_bytes()),
            other => Err(FormatError::UnsupportedFormat(other.to_string()).into()),
        }
    }
}

fn marshal_json(
    value: Value,
    opts: &MarshalOptions,
    meta: &HashMap<String, String>,
) -> Result<Vec<u8>> {
    let mut doc = Map::new();
    for (k, v) in meta {
        doc.insert(k.clone(), Value::String(v.clone()));
    }
    match value {
        Value::Object(fields) => doc.extend(fields),
        other => {
            doc.insert("value".to_string(), other);
        }
    }

    if !opts.multiline {
        return Ok(serde_json::to_vec(&doc)?);
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(opts.indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    Ok(buf)
}

fn marshal_event(
    value: &Value,
    opts: &MarshalOptions,
    meta: &HashMap<String, String>,
) -> String {
    let mut lines: Vec<String> = meta
        .iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();

    let mut leaves = Vec::new();
    flatten(String::new(), value, &mut leaves);
    lines.extend(leaves.into_iter().map(|(path, v)| format!("{path}: {v}")));

    lines.join(if opts.multiline { "\n" } else { " " })
}

fn flatten(
    path: String,
    value: &Value,
    out: &mut Vec<(String, String)>,
) {
    let join = |key: &str| {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{path}/{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten(join(k), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(join(&i.to_string()), v, out);
            }
        }
        Value::String(s) => out.push((leaf_path(path), s.clone())),
        other => out.push((leaf_path(path), other.to_string())),
    }
}

fn leaf_path(path: String) -> String {
    if path.is_empty() {
        "value".to_string()
    } else {
        path
    }
}
