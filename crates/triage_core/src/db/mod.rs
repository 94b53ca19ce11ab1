use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::AppError;
use crate::normalize::timestamps::now_rfc3339_utc;

/// Schema steps in order. A step's name is recorded once it has been applied.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_init.sql",
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../migrations/0001_init.sql"
    )),
)];

fn db_error(code: &str, message: impl Into<String>, err: rusqlite::Error) -> AppError {
    AppError::new(code, message).with_details(err.to_string())
}

pub fn open(path: &Path) -> Result<Connection, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new("DB_OPEN_FAILED", "Failed to create database directory")
                .with_details(format!("path={}; err={e}", parent.display()))
        })?;
    }
    Connection::open(path).map_err(|e| db_error("DB_OPEN_FAILED", "Failed to open SQLite database", e))
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    Connection::open_in_memory()
        .map_err(|e| db_error("DB_OPEN_FAILED", "Failed to open in-memory SQLite database", e))
}

/// Open (creating if needed) and bring the schema up to date.
pub fn open_and_migrate(path: &Path) -> Result<Connection, AppError> {
    let mut conn = open(path)?;
    migrate(&mut conn)?;
    Ok(conn)
}

pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (name TEXT PRIMARY KEY NOT NULL, applied_at TEXT NOT NULL);",
    )
    .map_err(|e| db_error("DB_MIGRATION_FAILED", "Failed to create migrations table", e))?;

    for (name, sql) in MIGRATIONS {
        let tx = conn
            .transaction()
            .map_err(|e| db_error("DB_TX_FAILED", "Failed to start migration transaction", e))?;
        let applied: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| db_error("DB_MIGRATION_FAILED", "Failed to read applied migrations", e))?;
        if applied {
            continue;
        }

        tx.execute_batch(sql)
            .map_err(|e| db_error("DB_MIGRATION_FAILED", format!("Migration {name} failed"), e))?;
        tx.execute(
            "INSERT INTO _migrations(name, applied_at) VALUES (?1, ?2)",
            params![name, now_rfc3339_utc()?],
        )
        .map_err(|e| db_error("DB_MIGRATION_FAILED", format!("Failed to record {name}"), e))?;
        tx.commit()
            .map_err(|e| db_error("DB_TX_FAILED", "Failed to commit migration", e))?;
    }

    Ok(())
}
