//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table family. All public functions are re-exported here.
//! Ids and timestamps are stored as text; the `col_*` helpers convert them
//! back and surface malformed values as row conversion errors.

mod appointment;
mod message;
mod notification;
mod patient;
mod profile;
mod shift;
mod soin;
mod stats;
mod stay;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use crate::datetime::{format_instant, parse_instant};

pub use appointment::*;
pub use message::*;
pub use notification::*;
pub use patient::*;
pub use profile::*;
pub use shift::*;
pub use soin::*;
pub use stats::*;
pub use stay::*;

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

pub(crate) fn col_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, format!("invalid uuid {raw}: {e}")))
}

pub(crate) fn col_opt_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.is_empty() => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, format!("invalid uuid {raw}: {e}"))),
        _ => Ok(None),
    }
}

pub(crate) fn col_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_instant(&raw).ok_or_else(|| conversion_error(idx, format!("invalid timestamp {raw}")))
}

pub(crate) fn col_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => parse_instant(&raw)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("invalid timestamp {raw}"))),
        _ => Ok(None),
    }
}

pub(crate) fn col_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

pub(crate) fn col_opt_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.is_empty() => T::from_str(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, e.to_string())),
        _ => Ok(None),
    }
}

/// Joined "first last" name; `None` when the join found no row.
pub(crate) fn joined_name(first: Option<String>, last: Option<String>) -> Option<String> {
    if first.is_none() && last.is_none() {
        return None;
    }
    let name = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    Some(name.trim().to_string())
}

pub(crate) fn now_ts() -> String {
    format_instant(&Utc::now())
}

/// `%term%` with LIKE wildcards escaped; pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::datetime::parse_instant;
    use crate::models::enums::*;
    use crate::models::*;

    pub fn profile(conn: &Connection, role: Role, nom: &str, prenom: &str) -> Uuid {
        let id = Uuid::new_v4();
        insert_profile(
            conn,
            &Profile {
                id,
                email: Some(format!("{}.{}@docta.test", prenom.to_lowercase(), nom.to_lowercase())),
                role,
                nom: Some(nom.into()),
                prenom: Some(prenom.into()),
                telephone: None,
                avatar_url: None,
                specialite: None,
                service: None,
                actif: true,
                created_at: Utc::now(),
            },
        )
        .unwrap();
        id
    }

    pub fn patient(conn: &Connection, first: &str, last: &str) -> Uuid {
        let id = Uuid::new_v4();
        insert_patient(
            conn,
            &Patient {
                id,
                user_id: None,
                first_name: first.into(),
                last_name: last.into(),
                email: None,
                phone: None,
                dob: None,
                gender: Some(Gender::Other),
                blood_type: None,
                managed_by_staff: true,
                created_at: Utc::now(),
                updated_at: None,
            },
        )
        .unwrap();
        id
    }

    pub fn legacy_stay(
        conn: &Connection,
        patient_id: Uuid,
        admitted: &str,
        discharged: Option<&str>,
        status: HospitalizationStatus,
    ) -> Uuid {
        insert_legacy_stay(
            conn,
            &NewLegacyStay {
                patient_id,
                ward: Some("Médecine".into()),
                room: Some("101".into()),
                bed: Some("A".into()),
                admitted_at: parse_instant(admitted).unwrap(),
                discharged_at: discharged.map(|d| parse_instant(d).unwrap()),
                status,
            },
        )
        .unwrap()
    }

    pub fn current_stay(
        conn: &Connection,
        patient_id: Uuid,
        admitted: &str,
        discharged: Option<&str>,
        statut: HospitalisationStatut,
    ) -> Uuid {
        insert_current_stay(
            conn,
            &NewCurrentStay {
                patient_id,
                service: Some("Cardiologie".into()),
                chambre: Some("12".into()),
                lit: Some("2".into()),
                motif: None,
                date_admission: parse_instant(admitted).unwrap(),
                date_sortie_prevue: None,
                date_sortie_reelle: discharged.map(|d| parse_instant(d).unwrap()),
                statut,
            },
        )
        .unwrap()
    }
}
