pub mod countdown;
pub mod gauge;
pub mod sample;
pub mod status;

pub use countdown::Countdown;
pub use gauge::{Gauge, GaugeReading};
pub use sample::{PayloadError, StatusSample};
pub use status::{Banner, ReportedStatus, Severity, Status};
