use crate::domain::{Banner, Gauge, GaugeReading, Status};
use crate::ports::{DisplaySurface, ElementId};

impl Gauge {
    fn elements(&self) -> (ElementId, ElementId) {
        match self {
            Gauge::Cpu => (ElementId::CpuVal, ElementId::CpuBar),
            Gauge::Mem => (ElementId::MemVal, ElementId::MemBar),
        }
    }
}

/// Write a percentage label and bar width for one gauge
pub fn set_gauge(surface: &dyn DisplaySurface, gauge: Gauge, value: f64) {
    let (label_id, bar_id) = gauge.elements();
    let reading = GaugeReading::from_value(value);
    surface.set_text(label_id, &reading.label());
    surface.set_width(bar_id, reading.width_percent());
}

/// Write banner text, severity class and alert bar width
pub fn set_status(surface: &dyn DisplaySurface, status: Status) {
    let banner = Banner::for_status(status);
    surface.set_text(ElementId::Status, banner.text);
    surface.set_severity(ElementId::AlertBar, banner.severity);
    surface.set_width(ElementId::AlertBar, banner.width_percent);
}
