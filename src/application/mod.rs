pub mod poller;
pub mod render;

pub use poller::Poller;
