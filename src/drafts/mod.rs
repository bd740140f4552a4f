pub mod autosave;
pub mod manager;

pub use autosave::*;
pub use manager::*;
