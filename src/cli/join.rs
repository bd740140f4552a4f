use chrono::Utc;
use serde_json::json;

use crate::cli::commands::JoinCommands;
use crate::cli::finish;
use crate::db::connection;
use crate::db::kv_store::SqliteStore;
use crate::db::trip_repo::{SqliteTrips, TripBackend};
use crate::error::TripwizError;
use crate::output;
use crate::social::JoinWorkflow;

pub fn run(cmd: JoinCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: JoinCommands, json_output: bool) -> Result<i32, TripwizError> {
    let conn = connection::open_db()?;
    let workflow = JoinWorkflow::new(SqliteStore::new(&conn));
    let now = Utc::now();

    let request = match cmd {
        JoinCommands::Request { trip_id, name, email, message } => {
            let trip = SqliteTrips::new(&conn).get_trip(&trip_id)?;
            workflow.create_join_request(&trip, &name, &email, message.as_deref(), now)?
        }
        JoinCommands::Accept { id } => workflow.accept_join_request(&id, now)?,
        JoinCommands::Reject { id, reason } => {
            workflow.reject_join_request(&id, reason.as_deref(), now)?
        }
        JoinCommands::List { trip } => {
            let requests = workflow.list_requests(trip.as_deref())?;
            if json_output {
                let requests_json: Vec<_> = requests.iter().map(output::json::request_json).collect();
                output::json::print(&output::json::success(json!({ "requests": requests_json })));
            } else if requests.is_empty() {
                println!("No join requests found.");
            } else {
                for r in &requests {
                    output::text::print_request(r);
                }
            }
            return Ok(0);
        }
    };

    if json_output {
        output::json::print(&output::json::success(json!({
            "request": output::json::request_json(&request)
        })));
    } else {
        output::text::print_request(&request);
    }
    Ok(0)
}
