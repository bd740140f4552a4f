use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ServiceKind, WizardSession};

/// A named point-in-time snapshot of a wizard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub name: String,
    /// True while the name is generated; cleared by an explicit name or rename.
    #[serde(default)]
    pub auto_named: bool,
    pub progress: u8,
    pub selected_services: Vec<ServiceKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub session: WizardSession,
}
