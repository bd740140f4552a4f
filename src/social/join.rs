use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::db::kv_store::{read_list, write_json, KeyValueStore, JOIN_REQUESTS_KEY};
use crate::error::TripwizError;
use crate::models::{JoinRequest, JoinRequestStatus, NotificationKind, Trip};

use super::NotificationCenter;

/// Join requests for finished trips and the notifications they produce.
pub struct JoinWorkflow<S> {
    store: S,
    notifications: NotificationCenter<S>,
}

impl<S: KeyValueStore + Clone> JoinWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self {
            notifications: NotificationCenter::new(store.clone()),
            store,
        }
    }

    pub fn notifications(&self) -> &NotificationCenter<S> {
        &self.notifications
    }

    pub fn list_requests(&self, trip_id: Option<&str>) -> Result<Vec<JoinRequest>, TripwizError> {
        let mut requests = self.load()?;
        if let Some(trip_id) = trip_id {
            requests.retain(|r| r.trip_id == trip_id);
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    pub fn get_request(&self, id: &str) -> Result<JoinRequest, TripwizError> {
        self.load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TripwizError::request_not_found(id))
    }

    /// File a pending request and notify the trip owner.
    pub fn create_join_request(
        &self,
        trip: &Trip,
        requester_name: &str,
        requester_email: &str,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<JoinRequest, TripwizError> {
        let requester_name = requester_name.trim();
        let requester_email = requester_email.trim();
        if requester_name.is_empty() || requester_email.is_empty() {
            return Err(TripwizError::validation(
                "Requester name and email are required",
            ));
        }

        let request = JoinRequest {
            id: ulid::Ulid::new().to_string(),
            trip_id: trip.id.clone(),
            requester_name: requester_name.to_string(),
            requester_email: requester_email.to_string(),
            message: message.map(str::trim).filter(|m| !m.is_empty()).map(str::to_string),
            status: JoinRequestStatus::Pending,
            created_at: now,
            responded_at: None,
        };
        let mut requests = self.load()?;
        requests.push(request.clone());
        write_json(&self.store, JOIN_REQUESTS_KEY, &requests)?;

        let body = match &request.message {
            Some(note) => format!("{requester_name} wants to join \"{}\": {note}", trip.title),
            None => format!("{requester_name} wants to join \"{}\"", trip.title),
        };
        self.notify(
            NotificationKind::JoinRequest,
            &trip.owner,
            "New join request",
            &body,
            &request,
            now,
        );
        info!(request_id = %request.id, trip_id = %trip.id, "join request created");
        Ok(request)
    }

    pub fn accept_join_request(&self, id: &str, now: DateTime<Utc>) -> Result<JoinRequest, TripwizError> {
        let request = self.decide(id, JoinRequestStatus::Accepted, now)?;
        let body = format!(
            "Your request to join trip {} was accepted.",
            request.trip_id
        );
        self.notify(
            NotificationKind::JoinAccepted,
            &request.requester_email,
            "Join request accepted",
            &body,
            &request,
            now,
        );
        Ok(request)
    }

    /// Decline a pending request. The reason, when given, is the notification message.
    pub fn reject_join_request(
        &self,
        id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<JoinRequest, TripwizError> {
        let request = self.decide(id, JoinRequestStatus::Rejected, now)?;
        let body = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => reason.to_string(),
            None => format!("Your request to join trip {} was declined.", request.trip_id),
        };
        self.notify(
            NotificationKind::JoinRejected,
            &request.requester_email,
            "Join request declined",
            &body,
            &request,
            now,
        );
        Ok(request)
    }

    fn decide(
        &self,
        id: &str,
        status: JoinRequestStatus,
        now: DateTime<Utc>,
    ) -> Result<JoinRequest, TripwizError> {
        let mut requests = self.load()?;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| TripwizError::request_not_found(id))?;
        if request.status.is_terminal() {
            return Err(TripwizError::request_not_pending(id, request.status.as_str()));
        }
        request.status = status;
        request.responded_at = Some(now);
        let decided = request.clone();
        write_json(&self.store, JOIN_REQUESTS_KEY, &requests)?;
        info!(request_id = id, status = status.as_str(), "join request decided");
        Ok(decided)
    }

    /// Notifications are a side effect: a failed write never undoes the request change.
    fn notify(
        &self,
        kind: NotificationKind,
        recipient: &str,
        title: &str,
        message: &str,
        request: &JoinRequest,
        now: DateTime<Utc>,
    ) {
        let data = json!({ "tripId": request.trip_id, "requestId": request.id });
        if let Err(e) = self
            .notifications
            .push(kind, recipient, title, message, Some(data), now)
        {
            warn!(request_id = %request.id, kind = kind.as_str(), error = %e, "failed to store notification");
        }
    }

    fn load(&self) -> Result<Vec<JoinRequest>, TripwizError> {
        read_list(&self.store, JOIN_REQUESTS_KEY)
    }
}
