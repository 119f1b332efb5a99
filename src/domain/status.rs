use std::fmt;

/// Health status reported by the `/data` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    WarmingUp,
}

impl Status {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "OK" => Some(Status::Ok),
            "Warning" => Some(Status::Warning),
            "Critical" => Some(Status::Critical),
            "WarmingUp" => Some(Status::WarmingUp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "Warning",
            Status::Critical => "Critical",
            Status::WarmingUp => "WarmingUp",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status field as it arrived on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Known(Status),
    Missing,
    Unrecognized(String),
}

impl ReportedStatus {
    pub fn from_field(field: Option<&str>) -> Self {
        match field {
            None => ReportedStatus::Missing,
            Some(label) => match Status::from_label(label) {
                Some(status) => ReportedStatus::Known(status),
                None => ReportedStatus::Unrecognized(label.to_string()),
            },
        }
    }

    /// Status used for display. Missing or unknown labels render as healthy.
    pub fn effective(&self) -> Status {
        match self {
            ReportedStatus::Known(status) => *status,
            ReportedStatus::Missing | ReportedStatus::Unrecognized(_) => Status::Ok,
        }
    }
}

/// Severity class applied to the alert bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Warn,
    Crit,
}

impl Severity {
    pub fn class_name(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warn => "warn",
            Severity::Crit => "crit",
        }
    }
}

/// Visual state of the status banner: text, severity class and bar width
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: &'static str,
    pub severity: Severity,
    pub width_percent: f64,
}

impl Banner {
    pub fn for_status(status: Status) -> Self {
        match status {
            Status::Warning => Self {
                text: "Warning",
                severity: Severity::Warn,
                width_percent: 66.0,
            },
            Status::Critical => Self {
                text: "Critical",
                severity: Severity::Crit,
                width_percent: 33.0,
            },
            // WarmingUp is never rendered by the poller; treat it like any other non-alert value
            Status::Ok | Status::WarmingUp => Self {
                text: "OK",
                severity: Severity::Ok,
                width_percent: 100.0,
            },
        }
    }
}
