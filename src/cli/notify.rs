use serde_json::json;

use crate::cli::commands::NotifyCommands;
use crate::cli::finish;
use crate::db::connection;
use crate::db::kv_store::SqliteStore;
use crate::error::TripwizError;
use crate::output;
use crate::social::NotificationCenter;

pub fn run(cmd: NotifyCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: NotifyCommands, json_output: bool) -> Result<i32, TripwizError> {
    let conn = connection::open_db()?;
    let center = NotificationCenter::new(SqliteStore::new(&conn));

    let (data, text) = match cmd {
        NotifyCommands::List { recipient, unread } => {
            let mut items = center.list(recipient.as_deref())?;
            if unread {
                items.retain(|n| !n.read);
            }
            let count = center.unread_count(recipient.as_deref())?;
            if !json_output {
                output::text::print_notifications(&items, count);
                return Ok(0);
            }
            let items_json: Vec<_> = items.iter().map(output::json::notification_json).collect();
            output::json::print(&output::json::success(json!({
                "notifications": items_json,
                "unread_count": count
            })));
            return Ok(0);
        }
        NotifyCommands::Read { id } => {
            let n = center.mark_as_read(&id)?;
            let text = format!("Marked {} as read", n.id);
            (json!({ "notification": output::json::notification_json(&n) }), text)
        }
        NotifyCommands::ReadAll { recipient } => {
            let changed = center.mark_all_as_read(recipient.as_deref())?;
            (json!({ "marked": changed }), format!("Marked {changed} as read"))
        }
        NotifyCommands::Delete { id } => {
            center.delete(&id)?;
            let text = format!("Deleted notification {id}");
            (json!({ "deleted": { "id": id } }), text)
        }
    };

    let unread = center.unread_count(None)?;
    if json_output {
        let mut data = data;
        data["unread_count"] = json!(unread);
        output::json::print(&output::json::success(data));
    } else {
        println!("{text}");
        println!("Unread: {unread}");
    }
    Ok(0)
}
