//! Root composition of a planning session.
//!
//! Couples the wizard to its draft manager so that session-shape changes
//! re-arm autosave, reset drops both the draft pointer and the timer, and a
//! reserved trip never lingers as an open draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::db::kv_store::{write_json, KeyValueStore, SESSION_KEY};
use crate::db::trip_repo::TripBackend;
use crate::drafts::{is_missing_draft, AutosaveOutcome, AutosaveSchedule, DraftManager};
use crate::error::TripwizError;
use crate::models::{Draft, NewTrip, ServiceKind, Trip, WizardSession, WizardState};
use crate::wizard::{StepOutcome, WizardMachine};

/// Persisted form of the live session between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSession {
    pub session: WizardSession,
    pub current_draft_id: Option<String>,
    pub revision: u64,
    pub autosave: AutosaveSchedule,
}

pub struct Planner<S: KeyValueStore> {
    wizard: WizardMachine,
    drafts: DraftManager<S>,
    store: S,
}

impl<S: KeyValueStore + Clone> Planner<S> {
    pub fn new(store: S, autosave_secs: u64) -> Self {
        Self {
            wizard: WizardMachine::new(),
            drafts: DraftManager::new(store.clone(), AutosaveSchedule::new(autosave_secs)),
            store,
        }
    }

    /// Load the live session saved under the session key.
    ///
    /// A stored session that does not decode or fails validation is discarded
    /// for a fresh one.
    pub fn open(store: S, autosave_secs: u64) -> Result<Self, TripwizError> {
        let live = match store.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<LiveSession>(&raw) {
                Ok(live) => Some(live),
                Err(e) => {
                    warn!(error = %e, "stored session does not decode, starting fresh");
                    None
                }
            },
            None => Some(LiveSession::default()),
        };
        let restored = live.and_then(|live| {
            match WizardMachine::restore(live.session, live.current_draft_id, live.revision) {
                Ok(wizard) => Some((wizard, live.autosave)),
                Err(e) => {
                    warn!(error = %e, "stored session is invalid, starting fresh");
                    None
                }
            }
        });
        let (wizard, mut schedule) =
            restored.unwrap_or_else(|| (WizardMachine::new(), AutosaveSchedule::default()));
        schedule.set_interval(autosave_secs);
        Ok(Self {
            wizard,
            drafts: DraftManager::new(store.clone(), schedule),
            store,
        })
    }

    /// Write the live session back under the session key.
    pub fn persist(&self) -> Result<(), TripwizError> {
        write_json(&self.store, SESSION_KEY, &self.live())
    }

    pub fn live(&self) -> LiveSession {
        LiveSession {
            session: self.wizard.session().clone(),
            current_draft_id: self.wizard.current_draft_id().map(str::to_string),
            revision: self.wizard.revision(),
            autosave: self.drafts.schedule().clone(),
        }
    }

    pub fn wizard(&self) -> &WizardMachine {
        &self.wizard
    }

    pub fn drafts(&self) -> &DraftManager<S> {
        &self.drafts
    }

    pub fn progress(&self) -> u8 {
        self.wizard.progress()
    }

    pub fn select_services(&mut self, kinds: &[ServiceKind], now: DateTime<Utc>) -> Result<(), TripwizError> {
        self.wizard.select_services(kinds)?;
        self.drafts.schedule_mut().start(now);
        Ok(())
    }

    pub fn advance_step(&mut self, kind: ServiceKind) -> Result<StepOutcome, TripwizError> {
        self.wizard.advance_step(kind)
    }

    pub fn step_back(&mut self) -> Result<u32, TripwizError> {
        self.wizard.step_back()
    }

    pub fn set_module_data(&mut self, kind: ServiceKind, data: Value) -> Result<(), TripwizError> {
        self.wizard.set_module_data(kind, data)
    }

    pub fn add_module(&mut self, kind: ServiceKind, data: Value, now: DateTime<Utc>) -> Result<(), TripwizError> {
        self.wizard.add_module(kind, data)?;
        self.drafts.schedule_mut().start(now);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.wizard.reset();
        self.drafts.schedule_mut().cancel();
    }

    pub fn autosave_tick(&mut self, now: DateTime<Utc>) -> AutosaveOutcome {
        self.drafts.autosave_tick(&mut self.wizard, now)
    }

    pub fn save_draft(&mut self, name: Option<&str>, now: DateTime<Utc>) -> Result<Draft, TripwizError> {
        self.drafts.save_draft(&mut self.wizard, name, now)
    }

    pub fn load_draft(&mut self, id: &str, now: DateTime<Utc>) -> Result<Draft, TripwizError> {
        self.drafts.load_draft(&mut self.wizard, id, now)
    }

    pub fn rename_draft(&mut self, id: &str, name: &str, now: DateTime<Utc>) -> Result<Draft, TripwizError> {
        self.drafts.rename_draft(id, name, now)
    }

    /// Delete a stored draft. Resetting the live session is the caller's call.
    pub fn delete_draft(&mut self, id: &str) -> Result<(), TripwizError> {
        self.drafts.delete_draft(id)
    }

    pub fn sidebar_drafts(&self) -> Result<Vec<Draft>, TripwizError> {
        self.drafts.sidebar_drafts(self.wizard.current_draft_id())
    }

    /// Turn a completed session into a trip, then drop its draft and reset.
    ///
    /// If the draft cannot be removed the trip is withdrawn and the session is
    /// left as it was.
    pub fn reserve(
        &mut self,
        trips: &impl TripBackend,
        owner: &str,
        title: &str,
    ) -> Result<Trip, TripwizError> {
        let state = self.wizard.state();
        if state != WizardState::Completed {
            return Err(TripwizError::invalid_transition(state.as_str(), "reserve a trip"));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(TripwizError::validation("Trip title must not be empty"));
        }

        let session = self.wizard.session();
        let details: Map<String, Value> = session
            .active_modules
            .iter()
            .map(|m| (m.kind.as_str().to_string(), m.data.clone()))
            .collect();
        let trip = trips.create_trip(&NewTrip {
            owner: owner.to_string(),
            title: title.to_string(),
            services: session.selected_service_kinds.clone(),
            details: Value::Object(details),
        })?;

        if let Some(id) = self.wizard.current_draft_id().map(str::to_string) {
            match self.drafts.delete_draft(&id) {
                Ok(()) => {}
                Err(e) if is_missing_draft(&e) => {}
                Err(e) => {
                    // The session stays completed and bound to its draft; take the trip back.
                    if let Err(undo) = trips.delete_trip(&trip.id) {
                        warn!(trip_id = %trip.id, error = %undo, "failed to withdraw trip");
                    }
                    return Err(e);
                }
            }
        }
        self.reset();
        info!(trip_id = %trip.id, "reserved trip");
        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::kv_store::testing::FlakyStore;
    use crate::db::kv_store::SqliteStore;
    use crate::db::trip_repo::SqliteTrips;
    use crate::error::ErrorCode;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn complete_hotel(planner: &mut Planner<SqliteStore<'_>>) {
        planner.select_services(&[ServiceKind::Hotel], at(0)).unwrap();
        planner
            .set_module_data(ServiceKind::Hotel, json!({ "name": "Ritz" }))
            .unwrap();
        planner.advance_step(ServiceKind::Hotel).unwrap();
        planner.advance_step(ServiceKind::Hotel).unwrap();
    }

    #[test]
    fn test_reset_clears_draft_pointer_and_timer() {
        let conn = open_in_memory().unwrap();
        let mut planner = Planner::new(SqliteStore::new(&conn), 30);
        planner.select_services(&[ServiceKind::Car], at(0)).unwrap();
        planner.save_draft(None, at(1)).unwrap();
        assert!(planner.wizard().current_draft_id().is_some());

        planner.reset();
        assert_eq!(planner.wizard().current_draft_id(), None);
        assert!(!planner.drafts().schedule().is_active());
        // a stale tick after reset must not resurrect a draft
        assert_eq!(planner.autosave_tick(at(1_000)), AutosaveOutcome::NotDue);
        assert_eq!(planner.drafts().list_drafts().unwrap().len(), 1);
    }

    #[test]
    fn test_add_module_rearms_autosave() {
        let conn = open_in_memory().unwrap();
        let mut planner = Planner::new(SqliteStore::new(&conn), 30);
        planner.select_services(&[ServiceKind::Flights], at(0)).unwrap();
        planner.add_module(ServiceKind::Hotel, json!(null), at(20)).unwrap();
        assert_eq!(planner.autosave_tick(at(30)), AutosaveOutcome::NotDue);
        assert!(matches!(planner.autosave_tick(at(50)), AutosaveOutcome::Saved(_)));
    }

    #[test]
    fn test_reserve_deletes_draft_and_resets() {
        let conn = open_in_memory().unwrap();
        let trips = SqliteTrips::new(&conn);
        let mut planner = Planner::new(SqliteStore::new(&conn), 30);
        complete_hotel(&mut planner);
        let draft = planner.save_draft(None, at(5)).unwrap();
        assert_eq!(draft.progress, 100);

        let trip = planner.reserve(&trips, "alice", "Paris").unwrap();
        assert_eq!(trip.services, vec![ServiceKind::Hotel]);
        assert_eq!(trip.details["hotel"]["name"], "Ritz");
        assert_eq!(planner.wizard().state(), WizardState::Idle);
        assert_eq!(planner.wizard().current_draft_id(), None);
        assert!(planner.drafts().list_drafts().unwrap().is_empty());
        assert_eq!(trips.get_trips().unwrap().len(), 1);
    }

    #[test]
    fn test_reserve_without_draft() {
        let conn = open_in_memory().unwrap();
        let trips = SqliteTrips::new(&conn);
        let mut planner = Planner::new(SqliteStore::new(&conn), 30);
        complete_hotel(&mut planner);
        assert!(planner.reserve(&trips, "alice", "Paris").is_ok());
    }

    #[test]
    fn test_reserve_requires_completed_session() {
        let conn = open_in_memory().unwrap();
        let trips = SqliteTrips::new(&conn);
        let mut planner = Planner::new(SqliteStore::new(&conn), 30);
        planner.select_services(&[ServiceKind::Hotel], at(0)).unwrap();
        let err = planner.reserve(&trips, "alice", "Paris").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert!(trips.get_trips().unwrap().is_empty());
    }

    #[test]
    fn test_persist_and_reopen() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut planner = Planner::new(store, 30);
        planner
            .select_services(&[ServiceKind::Flights, ServiceKind::Car], at(0))
            .unwrap();
        planner.advance_step(ServiceKind::Flights).unwrap();
        planner.save_draft(Some("Road trip"), at(1)).unwrap();
        planner.persist().unwrap();

        let reopened = Planner::open(store, 45).unwrap();
        assert_eq!(reopened.wizard().session(), planner.wizard().session());
        assert_eq!(
            reopened.wizard().current_draft_id(),
            planner.wizard().current_draft_id()
        );
        assert_eq!(reopened.drafts().schedule().interval_secs(), 45);
        assert!(reopened.sidebar_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_open_discards_invalid_session() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut live = LiveSession::default();
        live.session.current_module_index = 3;
        live.current_draft_id = Some("01GONE".into());
        write_json(&store, SESSION_KEY, &live).unwrap();

        let planner = Planner::open(store, 30).unwrap();
        assert_eq!(planner.wizard().state(), WizardState::Idle);
        assert_eq!(planner.wizard().current_draft_id(), None);
    }

    #[test]
    fn test_open_discards_undecodable_session() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        store.put(SESSION_KEY, r#"{"session": 42}"#).unwrap();

        let mut planner = Planner::open(store, 30).unwrap();
        assert_eq!(planner.wizard().state(), WizardState::Idle);
        assert!(!planner.drafts().schedule().is_active());
        planner.select_services(&[ServiceKind::Car], at(0)).unwrap();
        planner.persist().unwrap();
        let reopened = Planner::open(store, 30).unwrap();
        assert_eq!(reopened.wizard().state(), WizardState::InProgress);
    }

    #[test]
    fn test_reserve_keeps_session_when_draft_delete_fails() {
        let conn = open_in_memory().unwrap();
        let trips = SqliteTrips::new(&conn);
        let store = FlakyStore::new(SqliteStore::new(&conn));
        let mut planner = Planner::new(&store, 30);
        planner.select_services(&[ServiceKind::Hotel], at(0)).unwrap();
        planner.advance_step(ServiceKind::Hotel).unwrap();
        planner.advance_step(ServiceKind::Hotel).unwrap();
        let draft = planner.save_draft(None, at(5)).unwrap();

        store.failing.set(true);
        let err = planner.reserve(&trips, "alice", "Paris").unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(trips.get_trips().unwrap().is_empty());
        assert_eq!(planner.wizard().state(), WizardState::Completed);
        assert_eq!(planner.wizard().current_draft_id(), Some(draft.id.as_str()));

        store.failing.set(false);
        planner.reserve(&trips, "alice", "Paris").unwrap();
        assert_eq!(trips.get_trips().unwrap().len(), 1);
        assert!(planner.drafts().list_drafts().unwrap().is_empty());
        assert_eq!(planner.wizard().state(), WizardState::Idle);
    }
}
