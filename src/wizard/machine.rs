use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::error::TripwizError;
use crate::models::{ModuleState, ServiceKind, WizardSession, WizardState};

use super::catalog;
use super::progress;

/// Result of a successful `advance_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The module moved forward but still has steps left.
    Advanced { step: u32, total: u32 },
    /// The module finished and the cursor moved to the next open module.
    ModuleCompleted { next: ServiceKind },
    /// The last open module finished; the session is now completed.
    SessionCompleted,
}

/// Owns the live wizard session and the pointer to its draft.
#[derive(Debug, Clone, Default)]
pub struct WizardMachine {
    session: WizardSession,
    current_draft_id: Option<String>,
    revision: u64,
}

impl WizardMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a machine from persisted parts, checking the session first.
    pub fn restore(
        session: WizardSession,
        current_draft_id: Option<String>,
        revision: u64,
    ) -> Result<Self, TripwizError> {
        validate_session(&session)?;
        Ok(Self {
            session,
            current_draft_id,
            revision,
        })
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn state(&self) -> WizardState {
        self.session.state()
    }

    pub fn progress(&self) -> u8 {
        progress::progress(
            &self.session.active_modules,
            self.session.current_module_index,
            self.session.completed,
        )
    }

    pub fn current_draft_id(&self) -> Option<&str> {
        self.current_draft_id.as_deref()
    }

    /// Bumped on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bind_draft(&mut self, draft_id: &str) {
        self.current_draft_id = Some(draft_id.to_string());
    }

    pub fn select_services(&mut self, kinds: &[ServiceKind]) -> Result<(), TripwizError> {
        self.require_state(WizardState::Idle, "select services")?;
        if kinds.is_empty() {
            return Err(TripwizError::validation("Select at least one service"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = kinds.iter().find(|k| !seen.insert(**k)) {
            return Err(TripwizError::validation(format!(
                "Service {} selected more than once",
                dup.as_str()
            )));
        }

        self.session = WizardSession {
            selected_service_kinds: kinds.to_vec(),
            active_modules: kinds.iter().map(|k| new_module(*k)).collect(),
            current_module_index: 0,
            completed: false,
        };
        self.touch();
        Ok(())
    }

    pub fn advance_step(&mut self, kind: ServiceKind) -> Result<StepOutcome, TripwizError> {
        self.require_state(WizardState::InProgress, "advance")?;
        let index = self.session.current_module_index;
        let current = self
            .session
            .active_modules
            .get(index)
            .map(|m| m.kind)
            .ok_or_else(|| TripwizError::invalid_snapshot("cursor past last module"))?;
        if current != kind {
            debug!(
                requested = kind.as_str(),
                current = current.as_str(),
                "rejected advance for stale module"
            );
            return Err(TripwizError::stale_module(kind.as_str(), current.as_str()));
        }

        let module = &mut self.session.active_modules[index];
        module.current_step += 1;
        if module.current_step < module.total_steps {
            let outcome = StepOutcome::Advanced {
                step: module.current_step,
                total: module.total_steps,
            };
            self.touch();
            return Ok(outcome);
        }
        module.completed = true;

        // Optional services added mid-flow are already completed; skip them.
        let next_open = self
            .session
            .active_modules
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, m)| !m.completed)
            .map(|(i, m)| (i, m.kind));

        let outcome = match next_open {
            Some((next_index, next_kind)) => {
                self.session.current_module_index = next_index;
                StepOutcome::ModuleCompleted { next: next_kind }
            }
            None => {
                self.session.current_module_index = self.session.active_modules.len();
                self.session.completed = true;
                StepOutcome::SessionCompleted
            }
        };
        self.touch();
        Ok(outcome)
    }

    /// Explicit back navigation inside the current module.
    pub fn step_back(&mut self) -> Result<u32, TripwizError> {
        self.require_state(WizardState::InProgress, "go back")?;
        let index = self.session.current_module_index;
        let module = self
            .session
            .active_modules
            .get_mut(index)
            .ok_or_else(|| TripwizError::invalid_snapshot("cursor past last module"))?;
        if module.current_step == 0 {
            return Err(TripwizError::validation(format!(
                "Already at the first step of {}",
                module.kind.as_str()
            )));
        }
        module.current_step -= 1;
        let step = module.current_step;
        self.touch();
        Ok(step)
    }

    /// Store the sub-form payload of an open module.
    pub fn set_module_data(&mut self, kind: ServiceKind, data: Value) -> Result<(), TripwizError> {
        self.require_state(WizardState::InProgress, "edit module data")?;
        let module = self
            .session
            .active_modules
            .iter_mut()
            .find(|m| m.kind == kind)
            .ok_or_else(|| {
                TripwizError::validation(format!("Service {} is not selected", kind.as_str()))
            })?;
        if module.completed {
            return Err(TripwizError::validation(format!(
                "Service {} is already completed",
                kind.as_str()
            )));
        }
        module.data = data;
        self.touch();
        Ok(())
    }

    /// Append an optional service as an already-completed module.
    ///
    /// The cursor does not move and completion is never triggered here.
    pub fn add_module(&mut self, kind: ServiceKind, data: Value) -> Result<(), TripwizError> {
        self.require_state(WizardState::InProgress, "add a service")?;
        if self.session.selected_service_kinds.contains(&kind) {
            return Err(TripwizError::validation(format!(
                "Service {} is already part of this trip",
                kind.as_str()
            )));
        }
        let total_steps = catalog::total_steps(kind);
        self.session.selected_service_kinds.push(kind);
        self.session.active_modules.push(ModuleState {
            kind,
            current_step: total_steps,
            total_steps,
            completed: true,
            data,
        });
        self.touch();
        Ok(())
    }

    /// Back to idle. Also drops the draft pointer.
    pub fn reset(&mut self) {
        self.session = WizardSession::default();
        self.current_draft_id = None;
        self.touch();
    }

    /// Replace the live session wholesale. Invalid snapshots leave the machine untouched.
    pub fn load_snapshot(
        &mut self,
        session: WizardSession,
        draft_id: Option<String>,
    ) -> Result<(), TripwizError> {
        validate_session(&session)?;
        self.session = session;
        self.current_draft_id = draft_id;
        self.touch();
        Ok(())
    }

    fn require_state(&self, expected: WizardState, action: &str) -> Result<(), TripwizError> {
        let state = self.state();
        if state != expected {
            debug!(state = state.as_str(), action, "rejected wizard transition");
            return Err(TripwizError::invalid_transition(state.as_str(), action));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn new_module(kind: ServiceKind) -> ModuleState {
    ModuleState {
        kind,
        current_step: 0,
        total_steps: catalog::total_steps(kind),
        completed: false,
        data: Value::Null,
    }
}

/// Check the structural invariants of a session.
pub fn validate_session(session: &WizardSession) -> Result<(), TripwizError> {
    let modules = &session.active_modules;
    let kinds: Vec<ServiceKind> = modules.iter().map(|m| m.kind).collect();
    if kinds != session.selected_service_kinds {
        return Err(TripwizError::invalid_snapshot(
            "selected services do not match active modules",
        ));
    }
    let unique: HashSet<_> = kinds.iter().collect();
    if unique.len() != kinds.len() {
        return Err(TripwizError::invalid_snapshot("duplicate service"));
    }

    for module in modules {
        if module.total_steps != catalog::total_steps(module.kind) {
            return Err(TripwizError::invalid_snapshot(format!(
                "{} has {} steps, expected {}",
                module.kind.as_str(),
                module.total_steps,
                catalog::total_steps(module.kind)
            )));
        }
        if module.current_step > module.total_steps {
            return Err(TripwizError::invalid_snapshot(format!(
                "{} step {} exceeds {}",
                module.kind.as_str(),
                module.current_step,
                module.total_steps
            )));
        }
        if module.completed != (module.current_step == module.total_steps) {
            return Err(TripwizError::invalid_snapshot(format!(
                "{} completion flag disagrees with its step",
                module.kind.as_str()
            )));
        }
    }

    let cursor = session.current_module_index;
    if modules.is_empty() {
        if cursor != 0 || session.completed {
            return Err(TripwizError::invalid_snapshot("empty session must be idle"));
        }
        return Ok(());
    }
    if session.completed {
        if cursor != modules.len() || modules.iter().any(|m| !m.completed) {
            return Err(TripwizError::invalid_snapshot(
                "completed session has unfinished modules",
            ));
        }
        return Ok(());
    }
    if cursor >= modules.len() {
        return Err(TripwizError::invalid_snapshot("cursor out of range"));
    }
    if modules[cursor].completed || modules[..cursor].iter().any(|m| !m.completed) {
        return Err(TripwizError::invalid_snapshot(
            "cursor does not point at the first open module",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn flights_hotel() -> WizardMachine {
        let mut machine = WizardMachine::new();
        machine
            .select_services(&[ServiceKind::Flights, ServiceKind::Hotel])
            .unwrap();
        machine
    }

    #[test]
    fn test_select_services() {
        let machine = flights_hotel();
        assert_eq!(machine.state(), WizardState::InProgress);
        assert_eq!(machine.session().current_module_index, 0);
        assert_eq!(machine.session().active_modules.len(), 2);
        assert!(machine
            .session()
            .active_modules
            .iter()
            .all(|m| m.current_step == 0 && !m.completed));
        assert_eq!(machine.progress(), 0);
    }

    #[test]
    fn test_select_rejects_empty_duplicates_and_non_idle() {
        let mut machine = WizardMachine::new();
        assert_eq!(
            machine.select_services(&[]).unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            machine
                .select_services(&[ServiceKind::Car, ServiceKind::Car])
                .unwrap_err()
                .code,
            ErrorCode::ValidationError
        );
        assert_eq!(machine.state(), WizardState::Idle);

        let mut machine = flights_hotel();
        let err = machine.select_services(&[ServiceKind::Car]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_flights_then_hotel_walkthrough() {
        let mut machine = flights_hotel();
        machine.advance_step(ServiceKind::Flights).unwrap();
        machine.advance_step(ServiceKind::Flights).unwrap();
        let outcome = machine.advance_step(ServiceKind::Flights).unwrap();
        assert_eq!(outcome, StepOutcome::ModuleCompleted { next: ServiceKind::Hotel });
        assert_eq!(machine.session().current_module_index, 1);
        assert_eq!(machine.progress(), 60);

        let outcome = machine.advance_step(ServiceKind::Hotel).unwrap();
        assert_eq!(outcome, StepOutcome::Advanced { step: 1, total: 2 });
        assert_eq!(machine.progress(), 80);

        let outcome = machine.advance_step(ServiceKind::Hotel).unwrap();
        assert_eq!(outcome, StepOutcome::SessionCompleted);
        assert!(machine.session().completed);
        assert_eq!(machine.session().current_module_index, 2);
        assert_eq!(machine.progress(), 100);
        assert!(validate_session(machine.session()).is_ok());
    }

    #[test]
    fn test_stale_advance_is_rejected_without_mutation() {
        let mut machine = flights_hotel();
        let before = machine.session().clone();
        let revision = machine.revision();

        let err = machine.advance_step(ServiceKind::Hotel).unwrap_err();
        assert_eq!(err.code, ErrorCode::StaleModule);
        assert_eq!(machine.session(), &before);
        assert_eq!(machine.revision(), revision);
    }

    #[test]
    fn test_advance_after_completion_is_rejected() {
        let mut machine = WizardMachine::new();
        machine.select_services(&[ServiceKind::Hotel]).unwrap();
        machine.advance_step(ServiceKind::Hotel).unwrap();
        machine.advance_step(ServiceKind::Hotel).unwrap();
        let err = machine.advance_step(ServiceKind::Hotel).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(machine.progress(), 100);
    }

    #[test]
    fn test_step_back() {
        let mut machine = flights_hotel();
        assert!(machine.step_back().is_err());
        machine.advance_step(ServiceKind::Flights).unwrap();
        machine.advance_step(ServiceKind::Flights).unwrap();
        assert_eq!(machine.step_back().unwrap(), 1);
        assert_eq!(machine.session().active_modules[0].current_step, 1);
        assert_eq!(machine.progress(), 20);
    }

    #[test]
    fn test_add_module_keeps_cursor_and_counts_fully() {
        let mut machine = flights_hotel();
        machine
            .add_module(ServiceKind::Car, json!({ "company": "Hertz" }))
            .unwrap();
        let session = machine.session();
        assert_eq!(session.current_module_index, 0);
        assert_eq!(
            session.selected_service_kinds,
            vec![ServiceKind::Flights, ServiceKind::Hotel, ServiceKind::Car]
        );
        assert!(session.active_modules[2].completed);
        assert_eq!(session.active_modules[2].data["company"], "Hertz");
        // 2 of 7 steps
        assert_eq!(machine.progress(), 29);
        assert!(!session.completed);

        let err = machine.add_module(ServiceKind::Car, Value::Null).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_completion_skips_added_modules() {
        let mut machine = WizardMachine::new();
        machine.select_services(&[ServiceKind::Hotel]).unwrap();
        machine.add_module(ServiceKind::Activities, Value::Null).unwrap();
        machine.advance_step(ServiceKind::Hotel).unwrap();
        let outcome = machine.advance_step(ServiceKind::Hotel).unwrap();
        assert_eq!(outcome, StepOutcome::SessionCompleted);
        assert_eq!(machine.session().current_module_index, 2);
    }

    #[test]
    fn test_add_module_requires_in_progress() {
        let mut machine = WizardMachine::new();
        let err = machine.add_module(ServiceKind::Car, Value::Null).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_set_module_data() {
        let mut machine = flights_hotel();
        machine
            .set_module_data(ServiceKind::Hotel, json!({ "nights": 3 }))
            .unwrap();
        assert_eq!(machine.session().active_modules[1].data["nights"], 3);
        let err = machine
            .set_module_data(ServiceKind::Car, Value::Null)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_reset_clears_draft_pointer() {
        let mut machine = flights_hotel();
        machine.bind_draft("01DRAFT");
        machine.reset();
        assert_eq!(machine.state(), WizardState::Idle);
        assert_eq!(machine.current_draft_id(), None);
        assert_eq!(machine.session(), &WizardSession::default());
    }

    #[test]
    fn test_load_snapshot_roundtrip() {
        let mut source = flights_hotel();
        source.advance_step(ServiceKind::Flights).unwrap();
        source.add_module(ServiceKind::Activities, json!(["museum"])).unwrap();
        let snapshot = source.session().clone();

        let mut machine = WizardMachine::new();
        machine
            .load_snapshot(snapshot.clone(), Some("01DRAFT".into()))
            .unwrap();
        assert_eq!(machine.session(), &snapshot);
        assert_eq!(machine.current_draft_id(), Some("01DRAFT"));
    }

    #[test]
    fn test_load_invalid_snapshot_is_rejected() {
        let mut machine = flights_hotel();
        let before = machine.session().clone();

        let mut bad = before.clone();
        bad.active_modules[0].completed = true;
        let err = machine.load_snapshot(bad, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSnapshot);
        assert_eq!(machine.session(), &before);

        let mut bad = before.clone();
        bad.current_module_index = 2;
        assert!(machine.load_snapshot(bad, None).is_err());

        let mut bad = before.clone();
        bad.active_modules[1].total_steps = 0;
        assert!(machine.load_snapshot(bad, None).is_err());

        let mut bad = before;
        bad.selected_service_kinds.pop();
        assert!(machine.load_snapshot(bad, None).is_err());
    }
}
