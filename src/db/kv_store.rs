use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::TripwizError;

pub const DRAFTS_KEY: &str = "tripwiz.drafts";
pub const JOIN_REQUESTS_KEY: &str = "tripwiz.join_requests";
pub const NOTIFICATIONS_KEY: &str = "tripwiz.notifications";
pub const SESSION_KEY: &str = "tripwiz.session";

/// Durable string key-value storage. Each key holds one JSON document.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, TripwizError>;
    fn put(&self, key: &str, value: &str) -> Result<(), TripwizError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, TripwizError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), TripwizError> {
        (**self).put(key, value)
    }
}

#[derive(Clone, Copy)]
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, TripwizError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), TripwizError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Read a JSON document, `None` when the key is absent.
pub fn read_json<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, TripwizError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), TripwizError> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw)
}

/// Read a JSON array stored under `key`; a missing key is an empty list.
pub fn read_list<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Vec<T>, TripwizError> {
    Ok(read_json(store, key)?.unwrap_or_default())
}

/// Like [`read_list`], but entries that do not decode as `T` are skipped with
/// a warning instead of failing the whole list.
pub fn read_records<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Vec<T>, TripwizError> {
    let raw: Vec<Value> = read_list(store, key)?;
    let records = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::*;

    /// Wraps a store and fails every write while `failing` is set.
    pub struct FlakyStore<S> {
        pub inner: S,
        pub failing: Cell<bool>,
    }

    impl<S: KeyValueStore> FlakyStore<S> {
        pub fn new(inner: S) -> Self {
            Self {
                inner,
                failing: Cell::new(false),
            }
        }
    }

    impl<S: KeyValueStore> KeyValueStore for FlakyStore<S> {
        fn get(&self, key: &str) -> Result<Option<String>, TripwizError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), TripwizError> {
            if self.failing.get() {
                return Err(TripwizError::storage("quota exceeded"));
            }
            self.inner.put(key, value)
        }
    }
}
