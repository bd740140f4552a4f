use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::db::kv_store::{read_list, write_json, KeyValueStore, NOTIFICATIONS_KEY};
use crate::error::TripwizError;
use crate::models::{Notification, NotificationKind};

/// Notification inbox backed by a single stored list.
///
/// Unread counts are always derived from the stored list.
pub struct NotificationCenter<S> {
    store: S,
}

impl<S: KeyValueStore> NotificationCenter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Newest first, optionally scoped to one recipient.
    pub fn list(&self, recipient: Option<&str>) -> Result<Vec<Notification>, TripwizError> {
        let mut items = self.load()?;
        if let Some(recipient) = recipient {
            items.retain(|n| n.recipient == recipient);
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    pub fn unread_count(&self, recipient: Option<&str>) -> Result<usize, TripwizError> {
        Ok(self.list(recipient)?.iter().filter(|n| !n.read).count())
    }

    pub fn push(
        &self,
        kind: NotificationKind,
        recipient: &str,
        title: &str,
        message: &str,
        data: Option<Value>,
        now: DateTime<Utc>,
    ) -> Result<Notification, TripwizError> {
        let notification = Notification {
            id: ulid::Ulid::new().to_string(),
            kind,
            recipient: recipient.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            created_at: now,
            data,
        };
        let mut items = self.load()?;
        items.push(notification.clone());
        write_json(&self.store, NOTIFICATIONS_KEY, &items)?;
        Ok(notification)
    }

    pub fn mark_as_read(&self, id: &str) -> Result<Notification, TripwizError> {
        let mut items = self.load()?;
        let item = items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| TripwizError::notification_not_found(id))?;
        if item.read {
            return Ok(item.clone());
        }
        item.read = true;
        let updated = item.clone();
        write_json(&self.store, NOTIFICATIONS_KEY, &items)?;
        Ok(updated)
    }

    /// Returns how many notifications flipped to read.
    pub fn mark_all_as_read(&self, recipient: Option<&str>) -> Result<usize, TripwizError> {
        let mut items = self.load()?;
        let mut changed = 0;
        for item in items
            .iter_mut()
            .filter(|n| !n.read && recipient.map_or(true, |r| n.recipient == r))
        {
            item.read = true;
            changed += 1;
        }
        if changed > 0 {
            write_json(&self.store, NOTIFICATIONS_KEY, &items)?;
        }
        Ok(changed)
    }

    pub fn delete(&self, id: &str) -> Result<(), TripwizError> {
        let mut items = self.load()?;
        let before = items.len();
        items.retain(|n| n.id != id);
        if items.len() == before {
            return Err(TripwizError::notification_not_found(id));
        }
        write_json(&self.store, NOTIFICATIONS_KEY, &items)
    }

    fn load(&self) -> Result<Vec<Notification>, TripwizError> {
        read_list(&self.store, NOTIFICATIONS_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::kv_store::SqliteStore;
    use crate::error::ErrorCode;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn push(center: &NotificationCenter<SqliteStore<'_>>, recipient: &str, secs: i64) -> Notification {
        center
            .push(NotificationKind::JoinRequest, recipient, "t", "m", None, at(secs))
            .unwrap()
    }

    fn stored_unread(center: &NotificationCenter<SqliteStore<'_>>) -> usize {
        center.load().unwrap().iter().filter(|n| !n.read).count()
    }

    #[test]
    fn test_list_newest_first_and_scoped() {
        let conn = open_in_memory().unwrap();
        let center = NotificationCenter::new(SqliteStore::new(&conn));
        let first = push(&center, "alice", 0);
        let second = push(&center, "alice", 5);
        push(&center, "bob", 10);

        let alice = center.list(Some("alice")).unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].id, second.id);
        assert_eq!(alice[1].id, first.id);
        assert_eq!(center.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_unread_count_stays_consistent() {
        let conn = open_in_memory().unwrap();
        let center = NotificationCenter::new(SqliteStore::new(&conn));
        let a = push(&center, "alice", 0);
        let b = push(&center, "alice", 1);
        let c = push(&center, "bob", 2);
        assert_eq!(center.unread_count(None).unwrap(), 3);
        assert_eq!(center.unread_count(Some("alice")).unwrap(), 2);

        center.mark_as_read(&a.id).unwrap();
        center.mark_as_read(&a.id).unwrap();
        assert_eq!(center.unread_count(None).unwrap(), stored_unread(&center));
        assert_eq!(center.unread_count(None).unwrap(), 2);

        center.delete(&b.id).unwrap();
        assert_eq!(center.unread_count(None).unwrap(), stored_unread(&center));
        assert_eq!(center.unread_count(Some("alice")).unwrap(), 0);

        push(&center, "alice", 3);
        assert_eq!(center.mark_all_as_read(Some("bob")).unwrap(), 1);
        assert_eq!(center.unread_count(None).unwrap(), 1);
        assert_eq!(center.mark_all_as_read(None).unwrap(), 1);
        assert_eq!(center.unread_count(None).unwrap(), 0);
        assert_eq!(center.unread_count(None).unwrap(), stored_unread(&center));
        assert!(center.list(None).unwrap().iter().any(|n| n.id == c.id && n.read));
    }

    #[test]
    fn test_unknown_ids() {
        let conn = open_in_memory().unwrap();
        let center = NotificationCenter::new(SqliteStore::new(&conn));
        assert_eq!(
            center.mark_as_read("nope").unwrap_err().code,
            ErrorCode::NotificationNotFound
        );
        assert_eq!(
            center.delete("nope").unwrap_err().code,
            ErrorCode::NotificationNotFound
        );
    }
}
