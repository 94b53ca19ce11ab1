use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Incident, IncidentPatch, IncidentStatus, NewIncident};
use crate::error::AppError;
use crate::normalize::timestamps::now_rfc3339_utc;
use crate::validate::{validate_new_incident, validate_patch};

const INCIDENT_COLUMNS: &str = r#"
  id, project, category, description, full_description,
  status, date, image, video, comments, resolved_at
"#;

fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<Incident> {
    let status: String = row.get(5)?;
    let status = status.parse::<IncidentStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Incident {
        id: row.get(0)?,
        project: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        full_description: row.get(4)?,
        status,
        date: row.get(6)?,
        image: row.get(7)?,
        video: row.get(8)?,
        comments: row.get(9)?,
        resolved_at: row.get(10)?,
    })
}

/// All incidents, newest report first (ties broken by id, newest first).
pub fn list_incidents(conn: &Connection) -> Result<Vec<Incident>, AppError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents ORDER BY date DESC, id DESC"
        ))
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to prepare incidents query")
                .with_details(e.to_string())
        })?;

    let rows = stmt.query_map([], incident_from_row).map_err(|e| {
        AppError::new("DB_QUERY_FAILED", "Failed to query incidents").with_details(e.to_string())
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to decode incident row")
                .with_details(e.to_string())
        })?);
    }

    Ok(out)
}

pub fn count_incidents(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to count incidents")
                .with_details(e.to_string())
        })
}

fn find_incident(conn: &Connection, id: i64) -> Result<Option<Incident>, AppError> {
    conn.query_row(
        &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1"),
        [id],
        incident_from_row,
    )
    .optional()
    .map_err(|e| {
        AppError::new("DB_QUERY_FAILED", "Failed to query incident")
            .with_details(format!("id={id}; err={e}"))
    })
}

pub fn get_incident(conn: &Connection, id: i64) -> Result<Incident, AppError> {
    find_incident(conn, id)?
        .ok_or_else(|| AppError::not_found("Incident not found").with_details(format!("id={id}")))
}

/// Persist a new report. Input is validated and canonicalized first; a missing date
/// means "now".
pub fn insert_incident(conn: &mut Connection, input: &NewIncident) -> Result<Incident, AppError> {
    let input = validate_new_incident(input)?;
    let date = match input.date {
        Some(d) => d,
        None => now_rfc3339_utc()?,
    };
    let resolved_at = (input.status == IncidentStatus::Resolved).then(|| date.clone());

    conn.execute(
        r#"
      INSERT INTO incidents(
        project, category, description, full_description,
        status, date, image, video, comments, resolved_at
      ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '', ?9)
      "#,
        params![
            input.project,
            input.category,
            input.description,
            input.full_description,
            input.status.as_str(),
            date,
            input.image,
            input.video,
            resolved_at,
        ],
    )
    .map_err(|e| {
        AppError::new("DB_INSERT_FAILED", "Failed to insert incident").with_details(e.to_string())
    })?;

    get_incident(conn, conn.last_insert_rowid())
}

/// Apply an operator update. Only the fields present in `patch` change; `comments`
/// replaces the stored note. `resolved_at` is stamped the first time the incident
/// becomes resolved and is kept if it is later reopened.
pub fn update_incident(
    conn: &mut Connection,
    id: i64,
    patch: &IncidentPatch,
) -> Result<Incident, AppError> {
    validate_patch(patch)?;

    let tx = conn.transaction().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to start update transaction")
            .with_details(e.to_string())
    })?;

    let current = find_incident(&tx, id)?
        .ok_or_else(|| AppError::not_found("Incident not found").with_details(format!("id={id}")))?;

    if let Some(status) = patch.status {
        let resolved_at = match (status, current.resolved_at.as_ref()) {
            (IncidentStatus::Resolved, None) => Some(now_rfc3339_utc()?),
            (_, existing) => existing.cloned(),
        };
        tx.execute(
            "UPDATE incidents SET status = ?1, resolved_at = ?2 WHERE id = ?3",
            params![status.as_str(), resolved_at, id],
        )
        .map_err(|e| {
            AppError::new("DB_UPDATE_FAILED", "Failed to update incident status")
                .with_details(e.to_string())
        })?;
    }

    if let Some(comments) = patch.comments.as_deref() {
        tx.execute(
            "UPDATE incidents SET comments = ?1 WHERE id = ?2",
            params![comments, id],
        )
        .map_err(|e| {
            AppError::new("DB_UPDATE_FAILED", "Failed to update incident comments")
                .with_details(e.to_string())
        })?;
    }

    let updated = get_incident(&tx, id)?;
    tx.commit().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to commit update transaction")
            .with_details(e.to_string())
    })?;

    Ok(updated)
}
