use chrono::Utc;
use serde_json::{json, Value};

use crate::cli::commands::WizardCommands;
use crate::cli::{finish, load_config};
use crate::db::connection;
use crate::db::kv_store::SqliteStore;
use crate::drafts::AutosaveOutcome;
use crate::error::TripwizError;
use crate::output;
use crate::planner::Planner;
use crate::wizard::StepOutcome;

pub fn run(cmd: WizardCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: WizardCommands, json_output: bool) -> Result<i32, TripwizError> {
    let conn = connection::open_db()?;
    let config = load_config()?;
    let mut planner = Planner::open(SqliteStore::new(&conn), config.autosave_interval_secs)?;
    let now = Utc::now();

    let mut message = None;
    let mut step = None;
    let read_only = matches!(cmd, WizardCommands::Status);
    match cmd {
        WizardCommands::Select { kinds } => {
            planner.select_services(&kinds, now)?;
            message = Some("Wizard started".to_string());
        }
        WizardCommands::Advance { kind } => {
            let outcome = planner.advance_step(kind)?;
            message = Some(describe_step(kind.as_str(), &outcome));
            step = Some(step_json(&outcome));
        }
        WizardCommands::Back => {
            let at = planner.step_back()?;
            message = Some(format!("Back to step {at}"));
        }
        WizardCommands::Data { kind, data } => {
            planner.set_module_data(kind, parse_data(&data)?)?;
            message = Some(format!("Saved {} data", kind.as_str()));
        }
        WizardCommands::Add { kind, data } => {
            let data = data.as_deref().map(parse_data).transpose()?.unwrap_or(Value::Null);
            planner.add_module(kind, data, now)?;
            message = Some(format!("Added {}", kind.as_str()));
        }
        WizardCommands::Reset => {
            planner.reset();
            message = Some("Wizard reset".to_string());
        }
        WizardCommands::Status => {}
    }

    let autosave = if read_only {
        AutosaveOutcome::NotDue
    } else {
        let outcome = planner.autosave_tick(now);
        planner.persist()?;
        outcome
    };

    if json_output {
        let mut data = json!({
            "wizard": output::json::wizard_json(planner.wizard()),
            "autosave": output::json::autosave_json(&autosave)
        });
        if let Some(step) = step {
            data["step"] = step;
        }
        output::json::print(&output::json::success(data));
    } else {
        if let Some(message) = message {
            println!("{message}");
        }
        output::text::print_wizard(planner.wizard());
        output::text::print_autosave(&autosave);
    }
    Ok(0)
}

fn parse_data(raw: &str) -> Result<Value, TripwizError> {
    serde_json::from_str(raw).map_err(|e| TripwizError::validation(format!("Invalid JSON data: {e}")))
}

fn describe_step(kind: &str, outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Advanced { step, total } => format!("{kind}: step {step}/{total}"),
        StepOutcome::ModuleCompleted { next } => {
            format!("{kind} completed, next: {}", next.as_str())
        }
        StepOutcome::SessionCompleted => format!("{kind} completed, wizard finished"),
    }
}

fn step_json(outcome: &StepOutcome) -> Value {
    match outcome {
        StepOutcome::Advanced { step, total } => {
            json!({ "outcome": "advanced", "step": step, "total": total })
        }
        StepOutcome::ModuleCompleted { next } => {
            json!({ "outcome": "module_completed", "next": next.as_str() })
        }
        StepOutcome::SessionCompleted => json!({ "outcome": "session_completed" }),
    }
}
