pub mod http;
pub mod surface;

pub use http::{HttpSourceConfig, HttpStatusSource};
pub use surface::TerminalSurface;
