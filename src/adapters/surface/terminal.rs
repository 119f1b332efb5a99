use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::domain::Severity;
use crate::ports::{DisplaySurface, ElementId};

use super::MemorySurface;

const BAR_CELLS: usize = 20;

/// Draws the panel as a single, continuously rewritten terminal line
pub struct TerminalSurface<W: Write + Send> {
    state: MemorySurface,
    out: Mutex<W>,
    color: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            state: MemorySurface::new(),
            out: Mutex::new(out),
            color,
        }
    }

    /// Panel line for the current element state
    pub fn render_line(&self) -> String {
        let status = self.state.text(ElementId::Status).unwrap_or_else(|| "--".to_string());
        let severity = self.state.severity(ElementId::AlertBar);
        let next = self.state.text(ElementId::Next).unwrap_or_default();

        format!(
            "CPU {} {:>4}  MEM {} {:>4}  {} {}  {}",
            bar(self.state.width(ElementId::CpuBar)),
            self.state.text(ElementId::CpuVal).unwrap_or_else(|| "--".to_string()),
            bar(self.state.width(ElementId::MemBar)),
            self.state.text(ElementId::MemVal).unwrap_or_else(|| "--".to_string()),
            bar(self.state.width(ElementId::AlertBar)),
            self.paint(&status, severity),
            next,
        )
    }

    fn paint(&self, text: &str, severity: Option<Severity>) -> String {
        let Some(severity) = severity else {
            return text.to_string();
        };
        if !self.color {
            return format!("{} ({})", text, severity.class_name());
        }
        let code = match severity {
            Severity::Ok => "32",
            Severity::Warn => "33",
            Severity::Crit => "31",
        };
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }

    fn redraw(&self) {
        let line = self.render_line();
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let result = if self.color {
            write!(out, "\r\x1b[2K{}", line)
        } else {
            writeln!(out, "{}", line)
        };
        if let Err(e) = result.and_then(|_| out.flush()) {
            debug!("Terminal write failed at update {}: {}", self.state.mutations(), e);
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bar(width: Option<f64>) -> String {
    let filled = width
        .map(|w| ((w.clamp(0.0, 100.0) / 100.0) * BAR_CELLS as f64).round() as usize)
        .unwrap_or(0);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_CELLS - filled))
}

impl<W: Write + Send> DisplaySurface for TerminalSurface<W> {
    fn set_text(&self, id: ElementId, text: &str) {
        self.state.set_text(id, text);
        self.redraw();
    }

    fn set_width(&self, id: ElementId, percent: f64) {
        self.state.set_width(id, percent);
        self.redraw();
    }

    fn set_severity(&self, id: ElementId, severity: Severity) {
        self.state.set_severity(id, severity);
        self.redraw();
    }
}
