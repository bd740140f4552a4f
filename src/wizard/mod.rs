pub mod catalog;
pub mod progress;
pub mod machine;

pub use machine::*;
