pub mod service;
pub mod session;
pub mod draft;
pub mod join_request;
pub mod notification;
pub mod trip;

pub use service::*;
pub use session::*;
pub use draft::*;
pub use join_request::*;
pub use notification::*;
pub use trip::*;
