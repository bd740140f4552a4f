use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::db::kv_store::{read_records, write_json, KeyValueStore, DRAFTS_KEY};
use crate::error::{ErrorCode, TripwizError};
use crate::models::{Draft, ServiceKind, WizardSession};
use crate::wizard::progress::progress;
use crate::wizard::WizardMachine;

use super::AutosaveSchedule;

/// The narrow surface the draft manager needs from a live session.
pub trait SessionHost {
    fn snapshot(&self) -> WizardSession;
    fn revision(&self) -> u64;
    fn current_draft_id(&self) -> Option<&str>;
    fn bind_draft(&mut self, draft_id: &str);
    fn apply_snapshot(&mut self, session: WizardSession, draft_id: &str) -> Result<(), TripwizError>;
    fn reset(&mut self);
}

impl SessionHost for WizardMachine {
    fn snapshot(&self) -> WizardSession {
        self.session().clone()
    }

    fn revision(&self) -> u64 {
        WizardMachine::revision(self)
    }

    fn current_draft_id(&self) -> Option<&str> {
        WizardMachine::current_draft_id(self)
    }

    fn bind_draft(&mut self, draft_id: &str) {
        WizardMachine::bind_draft(self, draft_id)
    }

    fn apply_snapshot(&mut self, session: WizardSession, draft_id: &str) -> Result<(), TripwizError> {
        self.load_snapshot(session, Some(draft_id.to_string()))
    }

    fn reset(&mut self) {
        WizardMachine::reset(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    NotDue,
    SkippedEmpty,
    SkippedUnchanged,
    Saved(String),
    Failed(String),
}

pub struct DraftManager<S> {
    store: S,
    schedule: AutosaveSchedule,
}

impl<S: KeyValueStore> DraftManager<S> {
    pub fn new(store: S, schedule: AutosaveSchedule) -> Self {
        Self { store, schedule }
    }

    pub fn schedule(&self) -> &AutosaveSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut AutosaveSchedule {
        &mut self.schedule
    }

    /// All drafts, most recently updated first.
    pub fn list_drafts(&self) -> Result<Vec<Draft>, TripwizError> {
        let mut drafts: Vec<Draft> = read_records(&self.store, DRAFTS_KEY)?;
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(drafts)
    }

    /// Drafts for display next to the live session, which is never listed as a draft of itself.
    pub fn sidebar_drafts(&self, current_draft_id: Option<&str>) -> Result<Vec<Draft>, TripwizError> {
        let mut drafts = self.list_drafts()?;
        if let Some(current) = current_draft_id {
            drafts.retain(|d| d.id != current);
        }
        Ok(drafts)
    }

    pub fn get_draft(&self, id: &str) -> Result<Draft, TripwizError> {
        let drafts: Vec<Draft> = read_records(&self.store, DRAFTS_KEY)?;
        drafts
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| TripwizError::draft_not_found(id))
    }

    /// Explicit save. Creates the draft on first call, upserts afterwards.
    pub fn save_draft(
        &mut self,
        host: &mut impl SessionHost,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Draft, TripwizError> {
        let name = name.map(validate_name).transpose()?;
        let session = host.snapshot();
        if session.is_empty() {
            return Err(TripwizError::validation("Nothing to save: no services selected"));
        }
        let draft = self.upsert(host, session, name, now)?;
        self.schedule.mark_saved(host.revision(), now);
        Ok(draft)
    }

    /// Poll the autosave timer. Storage errors are logged and retried next tick.
    pub fn autosave_tick(&mut self, host: &mut impl SessionHost, now: DateTime<Utc>) -> AutosaveOutcome {
        if !self.schedule.is_due(now) {
            return AutosaveOutcome::NotDue;
        }
        let session = host.snapshot();
        if session.is_empty() {
            self.schedule.start(now);
            debug!("autosave skipped: empty session");
            return AutosaveOutcome::SkippedEmpty;
        }
        let revision = host.revision();
        if !self.schedule.needs_save(revision) {
            self.schedule.start(now);
            debug!(revision, "autosave skipped: no changes");
            return AutosaveOutcome::SkippedUnchanged;
        }

        match self.upsert(host, session, None, now) {
            Ok(draft) => {
                self.schedule.mark_saved(revision, now);
                debug!(draft_id = %draft.id, progress = draft.progress, "autosaved draft");
                AutosaveOutcome::Saved(draft.id)
            }
            Err(e) => {
                self.schedule.mark_failed(now);
                warn!(error = %e, "autosave failed, will retry on next tick");
                AutosaveOutcome::Failed(e.message)
            }
        }
    }

    /// Replace the live session with a stored draft.
    ///
    /// A draft that fails validation is not adopted: the live session is reset instead.
    pub fn load_draft(
        &mut self,
        host: &mut impl SessionHost,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Draft, TripwizError> {
        let draft = self.get_draft(id)?;
        if let Err(e) = host.apply_snapshot(draft.session.clone(), &draft.id) {
            warn!(draft_id = id, error = %e, "rejected invalid draft, starting fresh");
            host.reset();
            self.schedule.cancel();
            return Err(e);
        }
        self.schedule.mark_saved(host.revision(), now);
        info!(draft_id = id, "loaded draft");
        Ok(draft)
    }

    pub fn rename_draft(
        &mut self,
        id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Draft, TripwizError> {
        let name = validate_name(name)?;
        let mut drafts: Vec<Draft> = read_records(&self.store, DRAFTS_KEY)?;
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| TripwizError::draft_not_found(id))?;
        draft.name = name;
        draft.auto_named = false;
        draft.updated_at = now;
        let renamed = draft.clone();
        write_json(&self.store, DRAFTS_KEY, &drafts)?;
        Ok(renamed)
    }

    /// Remove a stored draft. Does not touch the live session.
    pub fn delete_draft(&mut self, id: &str) -> Result<(), TripwizError> {
        let mut drafts: Vec<Draft> = read_records(&self.store, DRAFTS_KEY)?;
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Err(TripwizError::draft_not_found(id));
        }
        write_json(&self.store, DRAFTS_KEY, &drafts)?;
        info!(draft_id = id, "deleted draft");
        Ok(())
    }

    fn upsert(
        &self,
        host: &mut impl SessionHost,
        session: WizardSession,
        name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Draft, TripwizError> {
        let percent = progress(
            &session.active_modules,
            session.current_module_index,
            session.completed,
        );
        let mut drafts: Vec<Draft> = read_records(&self.store, DRAFTS_KEY)?;
        let current_id = host.current_draft_id().map(str::to_string);
        let position = current_id
            .as_deref()
            .and_then(|id| drafts.iter().position(|d| d.id == id));

        let draft = match position {
            Some(pos) => {
                let draft = &mut drafts[pos];
                match name {
                    Some(name) => {
                        draft.name = name;
                        draft.auto_named = false;
                    }
                    None if draft.auto_named
                        && draft.selected_services != session.selected_service_kinds =>
                    {
                        draft.name = auto_name(&session.selected_service_kinds, now);
                    }
                    None => {}
                }
                draft.progress = percent;
                draft.selected_services = session.selected_service_kinds.clone();
                draft.updated_at = now;
                draft.session = session;
                draft.clone()
            }
            None => {
                let id = current_id.unwrap_or_else(|| ulid::Ulid::new().to_string());
                let auto_named = name.is_none();
                let draft = Draft {
                    id,
                    name: name.unwrap_or_else(|| auto_name(&session.selected_service_kinds, now)),
                    auto_named,
                    progress: percent,
                    selected_services: session.selected_service_kinds.clone(),
                    created_at: now,
                    updated_at: now,
                    session,
                };
                info!(draft_id = %draft.id, name = %draft.name, "created draft");
                drafts.push(draft.clone());
                draft
            }
        };

        write_json(&self.store, DRAFTS_KEY, &drafts)?;
        host.bind_draft(&draft.id);
        Ok(draft)
    }
}

/// Whether an error is a missing draft rather than a storage failure.
pub fn is_missing_draft(err: &TripwizError) -> bool {
    err.code == ErrorCode::DraftNotFound
}

fn validate_name(name: &str) -> Result<String, TripwizError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TripwizError::validation("Draft name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn auto_name(kinds: &[ServiceKind], now: DateTime<Utc>) -> String {
    let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
    format!("{} ({})", labels.join(" + "), now.format("%Y-%m-%d %H:%M"))
}
