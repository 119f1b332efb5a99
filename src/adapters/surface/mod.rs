mod memory;
mod terminal;

pub use memory::MemorySurface;
pub use terminal::TerminalSurface;
