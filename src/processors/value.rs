//! Processor result values.
//!
//! A context entry is one of three shapes: plain JSON data, a raw HTTP
//! response captured from an upstream call, or a rendered string. The
//! response assembler branches on the shape; templates see all three as
//! ordinary values.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Output of one data processor, stored in the pipeline context under the
/// step's declared name.
#[derive(Debug, Clone)]
pub enum ProcessorValue {
    /// JSON-compatible data (mapping, list, or scalar).
    Json(serde_json::Value),
    /// A raw HTTP response (status, headers, body) for pass-through
    /// streaming.
    Raw(RawResponse),
    /// A rendered string.
    Rendered(String),
}

impl ProcessorValue {
    pub fn as_raw(&self) -> Option<&RawResponse> {
        match self {
            ProcessorValue::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    /// The value as templates see it.
    pub fn to_template_value(&self) -> serde_json::Value {
        match self {
            ProcessorValue::Json(value) => value.clone(),
            ProcessorValue::Rendered(text) => serde_json::Value::String(text.clone()),
            ProcessorValue::Raw(raw) => serde_json::json!({
                "status": raw.status,
                "ok": raw.is_ok(),
                "headers": raw.headers,
                "text": raw.text(),
            }),
        }
    }
}

impl Serialize for ProcessorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_template_value().serialize(serializer)
    }
}

/// A captured upstream response. Header names are lowercased on insert so
/// lookups and the streaming allow-list stay case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        RawResponse {
            status,
            ..Default::default()
        }
    }

    /// Build a 200 response carrying a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut resp = RawResponse::new(200);
        resp.set_header("content-type", "application/json");
        resp.set_header("content-length", body.len().to_string());
        resp.body = body;
        resp
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// Failure-shaped means an HTTP error status.
    pub fn is_ok(&self) -> bool {
        self.status < 400
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Serialize for RawResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("ok", &self.is_ok())?;
        map.serialize_entry("headers", &self.headers)?;
        map.serialize_entry("text", &self.text())?;
        map.end()
    }
}
