use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{joined_name, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::enums::{HospitalisationStatut, HospitalizationStatus};
use crate::stay::{CurrentStayRow, LegacyStayRow, Stay, StayListing, StaySource};

const LEGACY_COLUMNS: &str =
    "h.id, h.patient_id, h.ward, h.room, h.bed, h.admitted_at, h.discharged_at, h.status";

const CURRENT_COLUMNS: &str = "h.id, h.patient_id, h.service, h.chambre, h.lit, h.motif, \
     h.date_admission, h.date_sortie_prevue, h.date_sortie_reelle, h.statut";

/// New row for the legacy `hospitalizations` table.
#[derive(Debug, Clone)]
pub struct NewLegacyStay {
    pub patient_id: Uuid,
    pub ward: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub admitted_at: DateTime<Utc>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub status: HospitalizationStatus,
}

/// New row for the current `hospitalisations` table.
#[derive(Debug, Clone)]
pub struct NewCurrentStay {
    pub patient_id: Uuid,
    pub service: Option<String>,
    pub chambre: Option<String>,
    pub lit: Option<String>,
    pub motif: Option<String>,
    pub date_admission: DateTime<Utc>,
    pub date_sortie_prevue: Option<DateTime<Utc>>,
    pub date_sortie_reelle: Option<DateTime<Utc>>,
    pub statut: HospitalisationStatut,
}

fn read_legacy(row: &Row<'_>) -> rusqlite::Result<LegacyStayRow> {
    Ok(LegacyStayRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        ward: row.get(2)?,
        room: row.get(3)?,
        bed: row.get(4)?,
        admitted_at: row.get(5)?,
        discharged_at: row.get(6)?,
        status: row.get(7)?,
    })
}

fn read_current(row: &Row<'_>) -> rusqlite::Result<CurrentStayRow> {
    Ok(CurrentStayRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        service: row.get(2)?,
        chambre: row.get(3)?,
        lit: row.get(4)?,
        motif: row.get(5)?,
        date_admission: row.get(6)?,
        date_sortie_prevue: row.get(7)?,
        date_sortie_reelle: row.get(8)?,
        statut: row.get(9)?,
    })
}

pub fn insert_legacy_stay(conn: &Connection, stay: &NewLegacyStay) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO hospitalizations (id, patient_id, ward, room, bed, admitted_at, discharged_at, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id.to_string(),
            stay.patient_id.to_string(),
            stay.ward,
            stay.room,
            stay.bed,
            format_instant(&stay.admitted_at),
            stay.discharged_at.as_ref().map(format_instant),
            stay.status.as_str(),
            now_ts(),
        ],
    )?;
    Ok(id)
}

pub fn insert_current_stay(conn: &Connection, stay: &NewCurrentStay) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO hospitalisations (id, patient_id, service, chambre, lit, motif, date_admission,
                                       date_sortie_prevue, date_sortie_reelle, statut, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id.to_string(),
            stay.patient_id.to_string(),
            stay.service,
            stay.chambre,
            stay.lit,
            stay.motif,
            format_instant(&stay.date_admission),
            stay.date_sortie_prevue.as_ref().map(format_instant),
            stay.date_sortie_reelle.as_ref().map(format_instant),
            stay.statut.as_str(),
            now_ts(),
        ],
    )?;
    Ok(id)
}

/// Keep rows that map cleanly; a malformed row is logged and skipped so one
/// bad record cannot hide every other stay.
fn mapped<R>(rows: Vec<R>) -> Vec<Stay>
where
    Stay: TryFrom<R, Error = crate::stay::StayMappingError>,
{
    rows.into_iter()
        .filter_map(|raw| match Stay::try_from(raw) {
            Ok(stay) => Some(stay),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unmappable stay row");
                None
            }
        })
        .collect()
}

/// Every stay of a patient, from both tables.
pub fn stays_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Stay>, DatabaseError> {
    let pid = patient_id.to_string();

    let sql = format!("SELECT {LEGACY_COLUMNS} FROM hospitalizations h WHERE h.patient_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let legacy = stmt
        .query_map(params![pid], read_legacy)?
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!("SELECT {CURRENT_COLUMNS} FROM hospitalisations h WHERE h.patient_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let current = stmt
        .query_map(params![pid], read_current)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stays = mapped(legacy);
    stays.extend(mapped(current));
    stays.sort_by(|a, b| b.admitted_at.cmp(&a.admitted_at));
    Ok(stays)
}

/// Look a stay up by id in either table.
pub fn locate_stay(conn: &Connection, id: &Uuid) -> Result<Option<Stay>, DatabaseError> {
    let key = id.to_string();

    let sql = format!("SELECT {LEGACY_COLUMNS} FROM hospitalizations h WHERE h.id = ?1");
    if let Some(raw) = conn.query_row(&sql, params![key], read_legacy).optional()? {
        return Ok(mapped(vec![raw]).pop());
    }

    let sql = format!("SELECT {CURRENT_COLUMNS} FROM hospitalisations h WHERE h.id = ?1");
    let raw = conn.query_row(&sql, params![key], read_current).optional()?;
    Ok(raw.and_then(|r| mapped(vec![r]).pop()))
}

/// All stays with patient names, most recent admission first.
pub fn list_stays(conn: &Connection, limit: usize) -> Result<Vec<StayListing>, DatabaseError> {
    let mut listings = Vec::new();

    let sql = format!(
        "SELECT {LEGACY_COLUMNS}, p.first_name, p.last_name
         FROM hospitalizations h LEFT JOIN patients p ON p.id = h.patient_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((read_legacy(row)?, joined_name(row.get(8)?, row.get(9)?)))
    })?;
    for row in rows {
        let (raw, name) = row?;
        if let Some(stay) = mapped(vec![raw]).pop() {
            listings.push(StayListing { stay, patient_name: name });
        }
    }

    let sql = format!(
        "SELECT {CURRENT_COLUMNS}, p.first_name, p.last_name
         FROM hospitalisations h LEFT JOIN patients p ON p.id = h.patient_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((read_current(row)?, joined_name(row.get(10)?, row.get(11)?)))
    })?;
    for row in rows {
        let (raw, name) = row?;
        if let Some(stay) = mapped(vec![raw]).pop() {
            listings.push(StayListing { stay, patient_name: name });
        }
    }

    listings.sort_by(|a, b| b.stay.admitted_at.cmp(&a.stay.admitted_at));
    listings.truncate(limit);
    Ok(listings)
}

/// Write a modified stay back to the table it came from.
pub fn save_stay(conn: &Connection, stay: &Stay) -> Result<(), DatabaseError> {
    let changed = match stay.source {
        StaySource::Legacy => conn.execute(
            "UPDATE hospitalizations
             SET ward = ?1, room = ?2, bed = ?3, admitted_at = ?4, discharged_at = ?5,
                 status = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                stay.ward,
                stay.room,
                stay.bed,
                format_instant(&stay.admitted_at),
                stay.discharged_at.as_ref().map(format_instant),
                stay.status.to_legacy().as_str(),
                now_ts(),
                stay.id.to_string(),
            ],
        )?,
        StaySource::Current => conn.execute(
            "UPDATE hospitalisations
             SET service = ?1, chambre = ?2, lit = ?3, motif = ?4, date_admission = ?5,
                 date_sortie_prevue = ?6, date_sortie_reelle = ?7, statut = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                stay.ward,
                stay.room,
                stay.bed,
                stay.reason,
                format_instant(&stay.admitted_at),
                stay.planned_discharge_at.as_ref().map(format_instant),
                stay.discharged_at.as_ref().map(format_instant),
                stay.status.to_statut().as_str(),
                now_ts(),
                stay.id.to_string(),
            ],
        )?,
    };
    if changed == 0 {
        return Err(DatabaseError::not_found(stay.source.table(), stay.id));
    }
    Ok(())
}

pub fn delete_stay(conn: &Connection, source: StaySource, id: &Uuid) -> Result<(), DatabaseError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", source.table());
    let changed = conn.execute(&sql, params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found(source.table(), id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_instant;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::stay::StayStatus;

    #[test]
    fn patient_stays_merge_both_tables_newest_first() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Jean", "Valjean");
        let old = fixtures::legacy_stay(&conn, p, "2024-01-01T08:00", Some("2024-01-04T10:00"), HospitalizationStatus::Discharged);
        let new = fixtures::current_stay(&conn, p, "2024-03-01T08:00", None, HospitalisationStatut::EnCours);

        let stays = stays_for_patient(&conn, &p).unwrap();
        assert_eq!(stays.len(), 2);
        assert_eq!(stays[0].id, new);
        assert_eq!(stays[0].source, StaySource::Current);
        assert_eq!(stays[0].ward.as_deref(), Some("Cardiologie"));
        assert_eq!(stays[1].id, old);
        assert_eq!(stays[1].status, StayStatus::Discharged);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Jean", "Valjean");
        fixtures::legacy_stay(&conn, p, "2024-01-01T08:00", None, HospitalizationStatus::Active);
        conn.execute(
            "INSERT INTO hospitalisations (id, patient_id, date_admission, statut, created_at)
             VALUES (?1, ?2, 'hier', 'en_cours', '2024-01-01T00:00:00Z')",
            params![Uuid::new_v4().to_string(), p.to_string()],
        )
        .unwrap();
        assert_eq!(stays_for_patient(&conn, &p).unwrap().len(), 1);
        assert_eq!(list_stays(&conn, 10).unwrap().len(), 1);
    }

    #[test]
    fn locate_stay_searches_both_tables() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Jean", "Valjean");
        let legacy = fixtures::legacy_stay(&conn, p, "2024-01-01T08:00", None, HospitalizationStatus::Active);
        let current = fixtures::current_stay(&conn, p, "2024-01-02T08:00", None, HospitalisationStatut::Planifiee);
        assert_eq!(locate_stay(&conn, &legacy).unwrap().unwrap().source, StaySource::Legacy);
        assert_eq!(locate_stay(&conn, &current).unwrap().unwrap().source, StaySource::Current);
        assert!(locate_stay(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn save_writes_back_in_the_source_vocabulary() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Jean", "Valjean");
        let id = fixtures::current_stay(&conn, p, "2024-01-02T08:00", None, HospitalisationStatut::EnCours);

        let mut stay = locate_stay(&conn, &id).unwrap().unwrap();
        stay.status = StayStatus::Discharged;
        stay.discharged_at = parse_instant("2024-01-06T11:00");
        save_stay(&conn, &stay).unwrap();

        let (statut, sortie): (String, String) = conn
            .query_row(
                "SELECT statut, date_sortie_reelle FROM hospitalisations WHERE id = ?1",
                params![id.to_string()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(statut, "terminee");
        assert_eq!(sortie, "2024-01-06T11:00:00Z");
    }

    #[test]
    fn listing_joins_patient_names() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Cosette", "Fauchelevent");
        fixtures::legacy_stay(&conn, p, "2024-01-01T08:00", None, HospitalizationStatus::Active);
        let list = list_stays(&conn, 10).unwrap();
        assert_eq!(list[0].patient_name.as_deref(), Some("Cosette Fauchelevent"));
    }

    #[test]
    fn delete_targets_the_right_table() {
        let conn = open_memory_database().unwrap();
        let p = fixtures::patient(&conn, "Jean", "Valjean");
        let id = fixtures::legacy_stay(&conn, p, "2024-01-01T08:00", None, HospitalizationStatus::Active);
        assert!(delete_stay(&conn, StaySource::Current, &id).is_err());
        delete_stay(&conn, StaySource::Legacy, &id).unwrap();
        assert!(locate_stay(&conn, &id).unwrap().is_none());
    }
}
