use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::status::ReportedStatus;

/// Reasons a `/data` body is rejected
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Cumulative network counters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NetTotals {
    #[serde(default)]
    pub bytes_sent: u64,
    #[serde(default)]
    pub bytes_recv: u64,
}

/// Only the displayed percentages are typed strictly; everything else is
/// read leniently since it never reaches the panel.
#[derive(Debug, Deserialize)]
struct RawSample {
    status: Option<Value>,
    cpu: Option<f64>,
    mem: Option<f64>,
    disk: Option<Value>,
    uptime: Option<Value>,
    net: Option<Value>,
}

/// One poll result. Replaces whatever was displayed before.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSample {
    pub status: ReportedStatus,
    pub cpu: Option<f64>,
    pub mem: Option<f64>,
    pub disk: Option<f64>,
    /// Host boot time, epoch seconds
    pub uptime: Option<f64>,
    pub net: Option<NetTotals>,
}

impl StatusSample {
    /// Validate a response body. Absent or null `cpu`/`mem` stay `None`;
    /// a non-numeric `cpu`/`mem` rejects the whole payload. A non-string
    /// status is kept as unrecognized, and bad extras are dropped.
    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(PayloadError::NotAnObject(json_kind(&value)));
        }

        let raw: RawSample = serde_json::from_value(value)?;
        Ok(Self {
            status: status_field(raw.status),
            cpu: raw.cpu,
            mem: raw.mem,
            disk: lenient_number("disk", raw.disk),
            uptime: lenient_number("uptime", raw.uptime),
            net: raw.net.filter(|v| !v.is_null()).and_then(|v| {
                serde_json::from_value(v)
                    .map_err(|e| warn!("Ignoring unreadable net counters: {}", e))
                    .ok()
            }),
        })
    }

    pub fn cpu_or_zero(&self) -> f64 {
        self.cpu.unwrap_or(0.0)
    }

    pub fn mem_or_zero(&self) -> f64 {
        self.mem.unwrap_or(0.0)
    }
}

fn status_field(field: Option<Value>) -> ReportedStatus {
    match field {
        None | Some(Value::Null) => ReportedStatus::Missing,
        Some(Value::String(label)) => ReportedStatus::from_field(Some(&label)),
        Some(other) => ReportedStatus::Unrecognized(other.to_string()),
    }
}

fn lenient_number(name: &str, field: Option<Value>) -> Option<f64> {
    match field {
        None | Some(Value::Null) => None,
        Some(value) => {
            let number = value.as_f64();
            if number.is_none() {
                warn!("Ignoring non-numeric {} field: {}", name, value);
            }
            number
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
