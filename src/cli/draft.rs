use chrono::Utc;
use serde_json::json;

use crate::cli::commands::DraftCommands;
use crate::cli::{finish, load_config};
use crate::db::connection;
use crate::db::kv_store::SqliteStore;
use crate::error::TripwizError;
use crate::output;
use crate::planner::Planner;

pub fn run(cmd: DraftCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: DraftCommands, json_output: bool) -> Result<i32, TripwizError> {
    let conn = connection::open_db()?;
    let config = load_config()?;
    let mut planner = Planner::open(SqliteStore::new(&conn), config.autosave_interval_secs)?;
    let now = Utc::now();

    match cmd {
        DraftCommands::Save { name } => {
            let draft = planner.save_draft(name.as_deref(), now)?;
            planner.persist()?;
            if json_output {
                output::json::print(&output::json::success(output::json::draft_json(&draft)));
            } else {
                println!("Saved draft:");
                output::text::print_draft(&draft);
            }
        }
        DraftCommands::List { all } => {
            let drafts = if all {
                planner.drafts().list_drafts()?
            } else {
                planner.sidebar_drafts()?
            };
            if json_output {
                let drafts_json: Vec<_> = drafts.iter().map(output::json::draft_json).collect();
                output::json::print(&output::json::success(json!({
                    "drafts": drafts_json,
                    "current_draft_id": planner.wizard().current_draft_id()
                })));
            } else {
                output::text::print_draft_list(&drafts);
            }
        }
        DraftCommands::Load { id } => {
            let result = planner.load_draft(&id, now);
            // A rejected draft resets the live session; keep that on disk too.
            planner.persist()?;
            let draft = result?;
            if json_output {
                output::json::print(&output::json::success(json!({
                    "draft": output::json::draft_json(&draft),
                    "wizard": output::json::wizard_json(planner.wizard())
                })));
            } else {
                println!("Loaded draft: {} ({})", draft.name, draft.id);
                output::text::print_wizard(planner.wizard());
            }
        }
        DraftCommands::Rename { id, name } => {
            let draft = planner.rename_draft(&id, &name, now)?;
            if json_output {
                output::json::print(&output::json::success(output::json::draft_json(&draft)));
            } else {
                println!("Renamed draft {} to {}", draft.id, draft.name);
            }
        }
        DraftCommands::Delete { id } => {
            planner.delete_draft(&id)?;
            let was_current = planner.wizard().current_draft_id() == Some(id.as_str());
            if was_current {
                planner.reset();
            }
            planner.persist()?;
            if json_output {
                output::json::print(&output::json::success(json!({
                    "deleted": { "id": id },
                    "session_reset": was_current
                })));
            } else {
                println!("Deleted draft {id}");
                if was_current {
                    println!("Live session reset.");
                }
            }
        }
    }
    Ok(0)
}
