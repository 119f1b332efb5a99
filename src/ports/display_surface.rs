use std::fmt;

use crate::domain::Severity;

/// Elements the host panel must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    CpuVal,
    CpuBar,
    MemVal,
    MemBar,
    Status,
    AlertBar,
    Next,
}

impl ElementId {
    #[cfg(test)]
    pub const ALL: [ElementId; 7] = [
        ElementId::CpuVal,
        ElementId::CpuBar,
        ElementId::MemVal,
        ElementId::MemBar,
        ElementId::Status,
        ElementId::AlertBar,
        ElementId::Next,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementId::CpuVal => "cpu-val",
            ElementId::CpuBar => "cpu-bar",
            ElementId::MemVal => "mem-val",
            ElementId::MemBar => "mem-bar",
            ElementId::Status => "status",
            ElementId::AlertBar => "alert-bar",
            ElementId::Next => "next",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for the write-only panel the poller draws on.
///
/// Writes are infallible from the caller's point of view; an implementation
/// that can fail (e.g. a closed terminal) logs and carries on.
pub trait DisplaySurface: Send + Sync {
    /// Replace the text content of an element
    fn set_text(&self, id: ElementId, text: &str);

    /// Set an element's inline width, in percent
    fn set_width(&self, id: ElementId, percent: f64);

    /// Make `severity` the only severity class on an element
    fn set_severity(&self, id: ElementId, severity: Severity);
}
