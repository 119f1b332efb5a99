use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::Severity;
use crate::ports::{DisplaySurface, ElementId};

/// Last written state of one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementState {
    pub text: Option<String>,
    pub width_percent: Option<f64>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Default)]
struct Elements {
    by_id: HashMap<ElementId, ElementState>,
    mutations: u64,
}

/// In-memory panel: keeps every element's state and counts writes
#[derive(Debug, Default)]
pub struct MemorySurface {
    elements: Mutex<Elements>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Elements> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn element(&self, id: ElementId) -> ElementState {
        self.lock().by_id.get(&id).cloned().unwrap_or_default()
    }

    pub fn text(&self, id: ElementId) -> Option<String> {
        self.element(id).text
    }

    pub fn width(&self, id: ElementId) -> Option<f64> {
        self.element(id).width_percent
    }

    pub fn severity(&self, id: ElementId) -> Option<Severity> {
        self.element(id).severity
    }

    /// Total number of writes since creation
    pub fn mutations(&self) -> u64 {
        self.lock().mutations
    }

    fn update(&self, id: ElementId, apply: impl FnOnce(&mut ElementState)) {
        let mut elements = self.lock();
        apply(elements.by_id.entry(id).or_default());
        elements.mutations += 1;
    }
}

impl DisplaySurface for MemorySurface {
    fn set_text(&self, id: ElementId, text: &str) {
        self.update(id, |el| el.text = Some(text.to_string()));
    }

    fn set_width(&self, id: ElementId, percent: f64) {
        self.update(id, |el| el.width_percent = Some(percent));
    }

    fn set_severity(&self, id: ElementId, severity: Severity) {
        self.update(id, |el| el.severity = Some(severity));
    }
}
