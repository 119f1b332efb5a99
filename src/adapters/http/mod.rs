mod client;

pub use client::{HttpSourceConfig, HttpStatusSource};
