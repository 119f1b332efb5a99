/// Which percentage gauge to update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    Cpu,
    Mem,
}

/// Display form of a percentage, clamped to [0, 100]. The label is
/// rounded; the bar keeps the unrounded width.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeReading {
    pub percent: u8,
    width: f64,
}

impl GaugeReading {
    /// Never fails: NaN reads as 0, out-of-range values are clamped
    pub fn from_value(value: f64) -> Self {
        let width = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        Self {
            percent: width.round() as u8,
            width,
        }
    }

    pub fn label(&self) -> String {
        format!("{}%", self.percent)
    }

    pub fn width_percent(&self) -> f64 {
        self.width
    }
}
