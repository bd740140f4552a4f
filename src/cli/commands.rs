use clap::{Parser, Subcommand};

use crate::models::ServiceKind;

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "tripwiz",
    version = VERSION,
    about = "Step-by-step trip planning with resumable drafts",
    after_help = "\
NOTE:
  Data lives in $TRIPWIZ_DIR, or ./.tripwiz when unset.
  Run `tripwiz init` before any other command.

EXIT CODES:
  0  Success
  1  Error (storage, validation, invalid transition, etc.)

SERVICES:
  flights (3 steps), hotel (2), car (2), activities (2)

BEHAVIOR NOTES:
  Only the current module can advance; stale advances are rejected.
  `wizard add` appends an optional service as already completed.
  Every wizard change polls autosave; drafts are written once the interval elapsed.
  `draft delete` of the loaded draft also resets the live session.
  `trip reserve` needs a completed wizard; it deletes the draft and resets.
  Join request decisions are final."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize tripwiz data directory
    Init {
        /// Owner recorded on reserved trips
        #[arg(long)]
        owner: Option<String>,
        /// Autosave interval in seconds
        #[arg(long)]
        autosave_secs: Option<u64>,
    },

    /// Drive the planning wizard
    #[command(subcommand)]
    Wizard(WizardCommands),

    /// Saved drafts of the wizard
    #[command(subcommand)]
    Draft(DraftCommands),

    /// Reserved trips
    #[command(subcommand)]
    Trip(TripCommands),

    /// Requests to join a trip
    #[command(subcommand)]
    Join(JoinCommands),

    /// Notification inbox
    #[command(subcommand)]
    Notify(NotifyCommands),
}

#[derive(Subcommand)]
pub enum WizardCommands {
    /// Start a wizard with the given services, in order
    Select {
        #[arg(required = true, value_parser = parse_service_kind)]
        kinds: Vec<ServiceKind>,
    },
    /// Complete one step of the current module
    Advance {
        #[arg(value_parser = parse_service_kind)]
        kind: ServiceKind,
    },
    /// Go back one step in the current module
    Back,
    /// Store sub-form data (JSON) for an open module
    Data {
        #[arg(value_parser = parse_service_kind)]
        kind: ServiceKind,
        data: String,
    },
    /// Add an optional service as already completed
    Add {
        #[arg(value_parser = parse_service_kind)]
        kind: ServiceKind,
        /// Service data as JSON
        #[arg(long)]
        data: Option<String>,
    },
    /// Discard the live session
    Reset,
    /// Show the live session and progress
    Status,
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Save the live session as a draft
    Save {
        #[arg(long)]
        name: Option<String>,
    },
    /// List drafts (the loaded draft is hidden unless --all)
    List {
        #[arg(long)]
        all: bool,
    },
    /// Replace the live session with a draft
    Load { id: String },
    /// Rename a draft
    Rename { id: String, name: String },
    /// Delete a draft
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// Reserve the completed wizard as a trip
    Reserve {
        #[arg(long)]
        title: String,
    },
    /// List trips
    List,
    /// Change a trip's title
    Update {
        id: String,
        #[arg(long)]
        title: String,
    },
    /// Delete a trip
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum JoinCommands {
    /// Ask to join a trip
    Request {
        trip_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Accept a pending request
    Accept { id: String },
    /// Reject a pending request
    Reject {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List join requests
    List {
        #[arg(long)]
        trip: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum NotifyCommands {
    /// List notifications
    List {
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        unread: bool,
    },
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll {
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Delete a notification
    Delete { id: String },
}

fn parse_service_kind(s: &str) -> Result<ServiceKind, String> {
    ServiceKind::from_str(&s.to_ascii_lowercase()).ok_or_else(|| {
        format!("unknown service '{s}' (expected flights, hotel, car or activities)")
    })
}
