use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ServiceKind;

/// Progress of one selected service inside the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    pub kind: ServiceKind,
    pub current_step: u32,
    pub total_steps: u32,
    pub completed: bool,
    #[serde(default)]
    pub data: Value,
}

/// Serializable state of a planning session.
///
/// `current_module_index == active_modules.len()` only once `completed` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub selected_service_kinds: Vec<ServiceKind>,
    pub active_modules: Vec<ModuleState>,
    pub current_module_index: usize,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    Idle,
    InProgress,
    Completed,
}

impl WizardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl WizardSession {
    pub fn state(&self) -> WizardState {
        if self.completed {
            WizardState::Completed
        } else if self.active_modules.is_empty() {
            WizardState::Idle
        } else {
            WizardState::InProgress
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active_modules.is_empty()
    }

    pub fn current_module(&self) -> Option<&ModuleState> {
        if self.completed {
            return None;
        }
        self.active_modules.get(self.current_module_index)
    }
}
