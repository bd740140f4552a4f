pub mod notifications;
pub mod join;

pub use join::*;
pub use notifications::*;
