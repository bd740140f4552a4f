use rusqlite::{params, Connection};

use crate::error::TripwizError;
use crate::models::{NewTrip, Trip};

/// Backend trip store. The wizard only relies on create/update/delete by id.
pub trait TripBackend {
    fn create_trip(&self, fields: &NewTrip) -> Result<Trip, TripwizError>;
    fn update_trip(&self, id: &str, title: &str) -> Result<Trip, TripwizError>;
    fn delete_trip(&self, id: &str) -> Result<(), TripwizError>;
    fn get_trip(&self, id: &str) -> Result<Trip, TripwizError>;
    fn get_trips(&self) -> Result<Vec<Trip>, TripwizError>;
}

pub struct SqliteTrips<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteTrips<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl TripBackend for SqliteTrips<'_> {
    fn create_trip(&self, fields: &NewTrip) -> Result<Trip, TripwizError> {
        let id = ulid::Ulid::new().to_string();
        let services = serde_json::to_string(&fields.services)?;
        let details = serde_json::to_string(&fields.details)?;
        self.conn.execute(
            "INSERT INTO trips (id, owner, title, services, details) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, fields.owner, fields.title, services, details],
        )?;
        self.get_trip(&id)
    }

    fn update_trip(&self, id: &str, title: &str) -> Result<Trip, TripwizError> {
        let changed = self.conn.execute(
            "UPDATE trips SET title = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![title, id],
        )?;
        if changed == 0 {
            return Err(TripwizError::trip_not_found(id));
        }
        self.get_trip(id)
    }

    fn delete_trip(&self, id: &str) -> Result<(), TripwizError> {
        let changed = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(TripwizError::trip_not_found(id));
        }
        Ok(())
    }

    fn get_trip(&self, id: &str) -> Result<Trip, TripwizError> {
        self.conn
            .query_row(
                "SELECT id, owner, title, services, details, created_at, updated_at
                 FROM trips WHERE id = ?1",
                params![id],
                row_to_trip,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => TripwizError::trip_not_found(id),
                _ => TripwizError::from(e),
            })
    }

    fn get_trips(&self) -> Result<Vec<Trip>, TripwizError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, title, services, details, created_at, updated_at
             FROM trips ORDER BY created_at DESC, id DESC",
        )?;
        let trips = stmt
            .query_map([], row_to_trip)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trips)
    }
}

fn row_to_trip(row: &rusqlite::Row) -> rusqlite::Result<Trip> {
    Ok(Trip {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        services: json_column(row, 3)?,
        details: json_column(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn json_column<T: serde::de::DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
