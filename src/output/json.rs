use serde_json::{json, Value};

use crate::drafts::AutosaveOutcome;
use crate::error::TripwizError;
use crate::models::{Draft, JoinRequest, Notification, Trip, WizardSession};
use crate::wizard::WizardMachine;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &TripwizError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn print(value: &Value) {
    println!("{value:#}");
}

pub fn wizard_json(wizard: &WizardMachine) -> Value {
    let session = wizard.session();
    json!({
        "state": wizard.state().as_str(),
        "progress": wizard.progress(),
        "current_module": session.current_module().map(|m| m.kind.as_str()),
        "current_module_index": session.current_module_index,
        "current_draft_id": wizard.current_draft_id(),
        "modules": modules_json(session),
    })
}

fn modules_json(session: &WizardSession) -> Value {
    Value::Array(
        session
            .active_modules
            .iter()
            .map(|m| {
                json!({
                    "kind": m.kind.as_str(),
                    "current_step": m.current_step,
                    "total_steps": m.total_steps,
                    "completed": m.completed,
                    "data": m.data,
                })
            })
            .collect(),
    )
}

pub fn autosave_json(outcome: &AutosaveOutcome) -> Value {
    match outcome {
        AutosaveOutcome::NotDue => json!({ "status": "not_due" }),
        AutosaveOutcome::SkippedEmpty => json!({ "status": "skipped_empty" }),
        AutosaveOutcome::SkippedUnchanged => json!({ "status": "skipped_unchanged" }),
        AutosaveOutcome::Saved(id) => json!({ "status": "saved", "draft_id": id }),
        AutosaveOutcome::Failed(message) => json!({ "status": "failed", "message": message }),
    }
}

pub fn draft_json(d: &Draft) -> Value {
    json!({
        "id": d.id,
        "name": d.name,
        "progress": d.progress,
        "selected_services": d.selected_services.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "created_at": d.created_at.to_rfc3339(),
        "updated_at": d.updated_at.to_rfc3339()
    })
}

pub fn trip_json(t: &Trip) -> Value {
    json!({
        "id": t.id,
        "owner": t.owner,
        "title": t.title,
        "services": t.services.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "details": t.details,
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn request_json(r: &JoinRequest) -> Value {
    json!({
        "id": r.id,
        "trip_id": r.trip_id,
        "requester_name": r.requester_name,
        "requester_email": r.requester_email,
        "message": r.message,
        "status": r.status.as_str(),
        "created_at": r.created_at.to_rfc3339(),
        "responded_at": r.responded_at.map(|t| t.to_rfc3339())
    })
}

pub fn notification_json(n: &Notification) -> Value {
    let mut v = json!({
        "id": n.id,
        "type": n.kind.as_str(),
        "recipient": n.recipient,
        "title": n.title,
        "message": n.message,
        "read": n.read,
        "created_at": n.created_at.to_rfc3339()
    });
    if let Some(ref data) = n.data {
        v["data"] = data.clone();
    }
    v
}
