use serde_json::json;

use crate::cli::commands::TripCommands;
use crate::cli::{finish, load_config};
use crate::db::connection;
use crate::db::kv_store::SqliteStore;
use crate::db::trip_repo::{SqliteTrips, TripBackend};
use crate::error::TripwizError;
use crate::output;
use crate::planner::Planner;

pub fn run(cmd: TripCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: TripCommands, json_output: bool) -> Result<i32, TripwizError> {
    let conn = connection::open_db()?;
    let trips = SqliteTrips::new(&conn);

    match cmd {
        TripCommands::Reserve { title } => {
            let config = load_config()?;
            let mut planner =
                Planner::open(SqliteStore::new(&conn), config.autosave_interval_secs)?;
            let result = planner.reserve(&trips, &config.owner, &title);
            planner.persist()?;
            let trip = result?;
            if json_output {
                output::json::print(&output::json::success(output::json::trip_json(&trip)));
            } else {
                println!("Reserved trip:");
                output::text::print_trip(&trip);
            }
        }
        TripCommands::List => {
            let list = trips.get_trips()?;
            if json_output {
                let trips_json: Vec<_> = list.iter().map(output::json::trip_json).collect();
                output::json::print(&output::json::success(json!({ "trips": trips_json })));
            } else {
                output::text::print_trip_list(&list);
            }
        }
        TripCommands::Update { id, title } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(TripwizError::validation("Trip title must not be empty"));
            }
            let trip = trips.update_trip(&id, title)?;
            if json_output {
                output::json::print(&output::json::success(output::json::trip_json(&trip)));
            } else {
                output::text::print_trip(&trip);
            }
        }
        TripCommands::Delete { id } => {
            trips.delete_trip(&id)?;
            if json_output {
                output::json::print(&output::json::success(json!({ "deleted": { "id": id } })));
            } else {
                println!("Deleted trip {id}");
            }
        }
    }
    Ok(0)
}
