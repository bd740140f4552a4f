pub mod connection;
pub mod migrations;
pub mod kv_store;
pub mod trip_repo;

pub use connection::*;
