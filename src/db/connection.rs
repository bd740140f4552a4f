use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::TripwizError;

use super::migrations;

/// Resolve the data directory: `$TRIPWIZ_DIR`, else `<cwd>/.tripwiz`.
pub fn data_dir() -> Result<PathBuf, TripwizError> {
    if let Some(dir) = env::var_os("TRIPWIZ_DIR").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let cwd = env::current_dir().map_err(|e| TripwizError::storage(e.to_string()))?;
    Ok(cwd.join(".tripwiz"))
}

/// Get the path to the tripwiz database.
pub fn db_path() -> Result<PathBuf, TripwizError> {
    Ok(data_dir()?.join("tripwiz.db"))
}

/// Get the config file path.
pub fn config_path() -> Result<PathBuf, TripwizError> {
    Ok(data_dir()?.join("config.json"))
}

/// Open a connection to the database. Returns error if not initialized.
pub fn open_db() -> Result<Connection, TripwizError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(TripwizError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db() -> Result<PathBuf, TripwizError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TripwizError::storage(e.to_string()))?;
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

/// In-memory database with the full schema, used by unit tests.
pub fn open_in_memory() -> Result<Connection, TripwizError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), TripwizError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
