use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_enum, col_opt_ts, col_opt_uuid, col_ts, col_uuid, joined_name, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::enums::SoinStatus;
use crate::models::*;

const SOIN_COLUMNS: &str = "s.id, s.patient_id, s.hospitalisation_id, s.type_soin, s.title, \
     s.description, s.scheduled_at, s.assigned_to_nurse_id, s.status, s.created_at, s.updated_at";

fn row_to_soin(row: &Row<'_>) -> rusqlite::Result<Soin> {
    Ok(Soin {
        id: col_uuid(row, 0)?,
        patient_id: col_uuid(row, 1)?,
        hospitalisation_id: col_opt_uuid(row, 2)?,
        type_soin: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        scheduled_at: col_ts(row, 6)?,
        assigned_to_nurse_id: col_opt_uuid(row, 7)?,
        status: col_enum(row, 8)?,
        created_at: col_ts(row, 9)?,
        updated_at: col_opt_ts(row, 10)?,
    })
}

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<SoinListing> {
    Ok(SoinListing {
        soin: row_to_soin(row)?,
        patient_name: joined_name(row.get(11)?, row.get(12)?),
    })
}

pub fn insert_soin(conn: &Connection, soin: &Soin) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO soins (id, patient_id, hospitalisation_id, type_soin, title, description,
                            scheduled_at, assigned_to_nurse_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            soin.id.to_string(),
            soin.patient_id.to_string(),
            soin.hospitalisation_id.map(|h| h.to_string()),
            soin.type_soin,
            soin.title,
            soin.description,
            format_instant(&soin.scheduled_at),
            soin.assigned_to_nurse_id.map(|n| n.to_string()),
            soin.status.as_str(),
            format_instant(&soin.created_at),
            soin.updated_at.as_ref().map(format_instant),
        ],
    )?;
    Ok(())
}

pub fn get_soin(conn: &Connection, id: &Uuid) -> Result<Option<Soin>, DatabaseError> {
    let sql = format!("SELECT {SOIN_COLUMNS} FROM soins s WHERE s.id = ?1");
    let soin = conn
        .query_row(&sql, params![id.to_string()], row_to_soin)
        .optional()?;
    Ok(soin)
}

pub fn update_soin_status(conn: &Connection, id: &Uuid, status: SoinStatus) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE soins SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_ts(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("soin", id));
    }
    Ok(())
}

pub fn delete_soin(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM soins WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("soin", id));
    }
    Ok(())
}

/// Care tasks in schedule order; restricted to one nurse's assignments when given.
pub fn list_soins(
    conn: &Connection,
    nurse: Option<&Uuid>,
    limit: usize,
) -> Result<Vec<SoinListing>, DatabaseError> {
    let sql = format!(
        "SELECT {SOIN_COLUMNS}, p.first_name, p.last_name
         FROM soins s LEFT JOIN patients p ON p.id = s.patient_id
         WHERE (?1 IS NULL OR s.assigned_to_nurse_id = ?1)
         ORDER BY s.scheduled_at ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![nurse.map(|n| n.to_string()), limit as i64],
        row_to_listing,
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Care tasks of one patient, in schedule order.
pub fn list_soins_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Soin>, DatabaseError> {
    let sql = format!(
        "SELECT {SOIN_COLUMNS} FROM soins s WHERE s.patient_id = ?1 ORDER BY s.scheduled_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_soin)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Still-scheduled tasks between two storage-format instants (inclusive).
pub fn scheduled_soins_between(
    conn: &Connection,
    start: &str,
    end: &str,
    nurse: Option<&Uuid>,
) -> Result<Vec<SoinListing>, DatabaseError> {
    let sql = format!(
        "SELECT {SOIN_COLUMNS}, p.first_name, p.last_name
         FROM soins s LEFT JOIN patients p ON p.id = s.patient_id
         WHERE s.status = 'scheduled'
           AND s.scheduled_at >= ?1 AND s.scheduled_at <= ?2
           AND (?3 IS NULL OR s.assigned_to_nurse_id = ?3)
         ORDER BY s.scheduled_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![start, end, nurse.map(|n| n.to_string())],
        row_to_listing,
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
