pub mod display_surface;
pub mod status_source;

pub use display_surface::{DisplaySurface, ElementId};
pub use status_source::{FetchError, StatusSource};
