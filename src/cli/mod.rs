pub mod commands;
pub mod init;
pub mod wizard;
pub mod draft;
pub mod trip;
pub mod join;
pub mod notify;

pub use commands::*;

use crate::config::Config;
use crate::db::connection;
use crate::error::TripwizError;
use crate::output;

/// Map a runner result to an exit code, reporting errors in the requested format.
pub(crate) fn finish(result: Result<i32, TripwizError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

pub(crate) fn load_config() -> Result<Config, TripwizError> {
    Config::load(&connection::config_path()?)
}
