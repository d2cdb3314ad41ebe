use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_enum, col_opt_ts, col_ts, col_uuid, joined_name};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.medecin_id, a.starts_at, a.ends_at, \
     a.location, a.status, a.reason, a.created_at";

/// Which appointments a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentScope {
    All,
    Medecin(Uuid),
    /// Appointments of one patient dossier.
    Patient(Uuid),
}

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: col_uuid(row, 0)?,
        patient_id: col_uuid(row, 1)?,
        medecin_id: col_uuid(row, 2)?,
        starts_at: col_ts(row, 3)?,
        ends_at: col_opt_ts(row, 4)?,
        location: row.get(5)?,
        status: col_enum(row, 6)?,
        reason: row.get(7)?,
        created_at: col_ts(row, 8)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, medecin_id, starts_at, ends_at, location, status, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.medecin_id.to_string(),
            format_instant(&appt.starts_at),
            appt.ends_at.as_ref().map(format_instant),
            appt.location,
            appt.status.as_str(),
            appt.reason,
            format_instant(&appt.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    let appt = conn
        .query_row(&sql, params![id.to_string()], row_to_appointment)
        .optional()?;
    Ok(appt)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("appointment", id));
    }
    Ok(())
}

/// Appointments in start order with patient and physician names.
pub fn list_appointments(
    conn: &Connection,
    scope: AppointmentScope,
    limit: usize,
) -> Result<Vec<AppointmentListing>, DatabaseError> {
    let (filter, key) = match scope {
        AppointmentScope::All => ("?1 IS NULL", None),
        AppointmentScope::Medecin(id) => ("a.medecin_id = ?1", Some(id.to_string())),
        AppointmentScope::Patient(id) => ("a.patient_id = ?1", Some(id.to_string())),
    };
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, p.first_name, p.last_name, m.prenom, m.nom
         FROM appointments a
         LEFT JOIN patients p ON p.id = a.patient_id
         LEFT JOIN profiles m ON m.id = a.medecin_id
         WHERE {filter}
         ORDER BY a.starts_at ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![key, limit as i64], |row| {
        Ok(AppointmentListing {
            appointment: row_to_appointment(row)?,
            patient_name: joined_name(row.get(9)?, row.get(10)?),
            medecin_name: joined_name(row.get(11)?, row.get(12)?),
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
