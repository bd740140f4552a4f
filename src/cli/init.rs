use serde_json::json;

use crate::cli::finish;
use crate::config::Config;
use crate::db::connection;
use crate::error::TripwizError;
use crate::output;

pub fn run(owner: Option<String>, autosave_secs: Option<u64>, json_output: bool) -> i32 {
    finish(run_inner(owner, autosave_secs, json_output), json_output)
}

fn run_inner(
    owner: Option<String>,
    autosave_secs: Option<u64>,
    json_output: bool,
) -> Result<i32, TripwizError> {
    let path = connection::init_db()?;
    let config_path = connection::config_path()?;

    let mut config = Config::load(&config_path)?;
    if let Some(owner) = owner {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(TripwizError::validation("Owner must not be empty"));
        }
        config.owner = owner.to_string();
    }
    if let Some(secs) = autosave_secs {
        config.autosave_interval_secs = secs;
    }
    config.save(&config_path)?;

    if json_output {
        output::json::print(&output::json::success(json!({
            "path": path.to_string_lossy(),
            "owner": config.owner,
            "autosave_interval_secs": config.autosave_interval_secs
        })));
    } else {
        println!("Initialized tripwiz at {}", path.display());
    }
    Ok(0)
}
