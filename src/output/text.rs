use crate::drafts::AutosaveOutcome;
use crate::models::{Draft, JoinRequest, Notification, Trip};
use crate::wizard::WizardMachine;

pub fn print_wizard(wizard: &WizardMachine) {
    let session = wizard.session();
    println!("Wizard: {} ({}%)", wizard.state().as_str(), wizard.progress());
    if let Some(id) = wizard.current_draft_id() {
        println!("  Draft: {id}");
    }
    for (i, m) in session.active_modules.iter().enumerate() {
        let marker = if !session.completed && i == session.current_module_index {
            ">"
        } else {
            " "
        };
        let status = if m.completed { "done" } else { "open" };
        println!(
            " {marker} [{status}] {} {}/{}",
            m.kind.as_str(),
            m.current_step,
            m.total_steps
        );
    }
}

pub fn print_autosave(outcome: &AutosaveOutcome) {
    match outcome {
        AutosaveOutcome::Saved(id) => println!("Autosaved draft {id}"),
        AutosaveOutcome::Failed(message) => eprintln!("Autosave failed: {message}"),
        _ => {}
    }
}

pub fn print_draft(d: &Draft) {
    println!("Draft: {} ({})", d.name, d.id);
    println!("  Progress: {}%", d.progress);
    println!("  Updated: {}", d.updated_at.format("%Y-%m-%d %H:%M:%S"));
}

pub fn print_draft_list(drafts: &[Draft]) {
    if drafts.is_empty() {
        println!("No drafts found.");
        return;
    }
    for d in drafts {
        println!(
            "  {} ({}) {}% - {}",
            d.name,
            &d.id[..std::cmp::min(8, d.id.len())],
            d.progress,
            d.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_trip(t: &Trip) {
    let services: Vec<&str> = t.services.iter().map(|k| k.as_str()).collect();
    println!("Trip: {} ({})", t.title, t.id);
    println!("  Owner: {}", t.owner);
    println!("  Services: {}", services.join(", "));
}

pub fn print_trip_list(trips: &[Trip]) {
    if trips.is_empty() {
        println!("No trips found.");
        return;
    }
    for t in trips {
        println!("  {} ({}) @{}", t.title, t.id, t.owner);
    }
}

pub fn print_request(r: &JoinRequest) {
    println!(
        "  [{}] {} <{}> -> trip {} ({})",
        r.status.as_str(),
        r.requester_name,
        r.requester_email,
        r.trip_id,
        r.id
    );
    if let Some(ref message) = r.message {
        println!("      \"{message}\"");
    }
}

pub fn print_notifications(items: &[Notification], unread: usize) {
    println!("Unread: {unread}");
    for n in items {
        let marker = if n.read { " " } else { "*" };
        println!("{marker} {} [{}] {}: {}", n.id, n.kind.as_str(), n.title, n.message);
    }
}
