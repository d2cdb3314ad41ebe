use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_opt_enum, col_opt_ts, col_opt_uuid, col_ts, col_uuid, like_pattern, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, dob, gender, \
     blood_type, managed_by_staff, created_at, updated_at";

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: col_uuid(row, 0)?,
        user_id: col_opt_uuid(row, 1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        dob: row
            .get::<_, Option<String>>(6)?
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        gender: col_opt_enum(row, 7)?,
        blood_type: col_opt_enum(row, 8)?,
        managed_by_staff: row.get::<_, i64>(9)? != 0,
        created_at: col_ts(row, 10)?,
        updated_at: col_opt_ts(row, 11)?,
    })
}

/// Unique column an upsert resolves conflicts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientKey {
    Email,
    Phone,
    UserId,
}

impl PatientKey {
    fn column(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::UserId => "user_id",
        }
    }
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, user_id, first_name, last_name, email, phone, dob, gender,
                               blood_type, managed_by_staff, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            patient.id.to_string(),
            patient.user_id.map(|u| u.to_string()),
            patient.first_name,
            patient.last_name,
            patient.email,
            patient.phone,
            patient.dob.map(|d| d.to_string()),
            patient.gender.map(|g| g.as_str()),
            patient.blood_type.map(|b| b.as_str()),
            patient.managed_by_staff as i64,
            format_instant(&patient.created_at),
            patient.updated_at.as_ref().map(format_instant),
        ],
    )?;
    Ok(())
}

/// Insert a new dossier from validated fields.
pub fn create_patient(
    conn: &Connection,
    fields: &PatientFields,
    user_id: Option<Uuid>,
    managed_by_staff: bool,
) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO patients (id, user_id, first_name, last_name, email, phone, dob, gender,
                               blood_type, managed_by_staff, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id.to_string(),
            user_id.map(|u| u.to_string()),
            fields.first_name,
            fields.last_name,
            fields.email,
            fields.phone,
            fields.dob.map(|d| d.to_string()),
            fields.gender.as_str(),
            fields.blood_type.map(|b| b.as_str()),
            managed_by_staff as i64,
            now_ts(),
        ],
    )?;
    Ok(id)
}

/// Insert or update on the given unique key, returning the row id.
///
/// On conflict the identity fields are overwritten; `user_id` is only
/// replaced when a new one is supplied, and the staff-managed flag is
/// only ever raised, never cleared.
pub fn upsert_patient(
    conn: &Connection,
    fields: &PatientFields,
    key: PatientKey,
    user_id: Option<Uuid>,
    managed_by_staff: bool,
) -> Result<Uuid, DatabaseError> {
    let sql = format!(
        "INSERT INTO patients (id, user_id, first_name, last_name, email, phone, dob, gender,
                               blood_type, managed_by_staff, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT({col}) DO UPDATE SET
            user_id = COALESCE(excluded.user_id, patients.user_id),
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            phone = excluded.phone,
            dob = excluded.dob,
            gender = excluded.gender,
            blood_type = excluded.blood_type,
            managed_by_staff = MAX(patients.managed_by_staff, excluded.managed_by_staff),
            updated_at = excluded.created_at
         RETURNING id",
        col = key.column()
    );
    let raw: String = conn.query_row(
        &sql,
        params![
            Uuid::new_v4().to_string(),
            user_id.map(|u| u.to_string()),
            fields.first_name,
            fields.last_name,
            fields.email,
            fields.phone,
            fields.dob.map(|d| d.to_string()),
            fields.gender.as_str(),
            fields.blood_type.map(|b| b.as_str()),
            managed_by_staff as i64,
            now_ts(),
        ],
        |row| row.get(0),
    )?;
    Uuid::parse_str(&raw)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("invalid patient id {raw}")))
}

/// Overwrite the dossier fields of an existing row, optionally linking a user.
/// `managed_by_staff` can raise the flag but never clears it.
pub fn update_patient_fields(
    conn: &Connection,
    id: &Uuid,
    fields: &PatientFields,
    link_user: Option<Uuid>,
    managed_by_staff: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET
            first_name = ?1, last_name = ?2, email = ?3, phone = ?4, dob = ?5,
            gender = ?6, blood_type = ?7, updated_at = ?8,
            user_id = COALESCE(?9, user_id),
            managed_by_staff = MAX(managed_by_staff, ?11)
         WHERE id = ?10",
        params![
            fields.first_name,
            fields.last_name,
            fields.email,
            fields.phone,
            fields.dob.map(|d| d.to_string()),
            fields.gender.as_str(),
            fields.blood_type.map(|b| b.as_str()),
            now_ts(),
            link_user.map(|u| u.to_string()),
            id.to_string(),
            managed_by_staff as i64,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("patient", id));
    }
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    find_one(conn, "id", &id.to_string())
}

pub fn find_patient_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    find_one(conn, "user_id", &user_id.to_string())
}

pub fn find_patient_by_email(conn: &Connection, email: &str) -> Result<Option<Patient>, DatabaseError> {
    find_one(conn, "email", email)
}

pub fn find_patient_by_phone(conn: &Connection, phone: &str) -> Result<Option<Patient>, DatabaseError> {
    find_one(conn, "phone", phone)
}

fn find_one(conn: &Connection, column: &'static str, value: &str) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE {column} = ?1 LIMIT 1");
    let patient = conn.query_row(&sql, params![value], row_to_patient).optional()?;
    Ok(patient)
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("patient", id));
    }
    Ok(())
}

/// Staff patient list: newest first, optionally filtered on name, email or phone.
pub fn search_patients(
    conn: &Connection,
    query: Option<&str>,
    limit: usize,
) -> Result<Vec<Patient>, DatabaseError> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let sql = format!(
                "SELECT {PATIENT_COLUMNS} FROM patients
                 WHERE first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\'
                    OR email LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![like_pattern(q), limit as i64], row_to_patient)?;
            rows.map(|r| r.map_err(DatabaseError::from)).collect()
        }
        None => {
            let sql = format!(
                "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64], row_to_patient)?;
            rows.map(|r| r.map_err(DatabaseError::from)).collect()
        }
    }
}

/// Autocomplete: name or email matches, alphabetical by last name.
pub fn suggest_patients(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> Result<Vec<Patient>, DatabaseError> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\'
            OR email LIKE ?1 ESCAPE '\\'
         ORDER BY last_name ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![like_pattern(q), limit as i64], row_to_patient)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// All dossiers, alphabetical, for select boxes.
pub fn list_patients_by_name(conn: &Connection, limit: usize) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], row_to_patient)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
