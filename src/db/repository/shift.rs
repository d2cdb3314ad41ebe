use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_enum, col_ts, col_uuid, joined_name};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::*;

const SHIFT_COLUMNS: &str = "s.id, s.user_id, s.role, s.starts_at, s.ends_at, s.created_at";

fn row_to_shift(row: &Row<'_>) -> rusqlite::Result<Shift> {
    Ok(Shift {
        id: col_uuid(row, 0)?,
        user_id: col_uuid(row, 1)?,
        role: col_enum(row, 2)?,
        starts_at: col_ts(row, 3)?,
        ends_at: col_ts(row, 4)?,
        created_at: col_ts(row, 5)?,
    })
}

pub fn insert_shift(conn: &Connection, shift: &Shift) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO shifts (id, user_id, role, starts_at, ends_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            shift.id.to_string(),
            shift.user_id.to_string(),
            shift.role.as_str(),
            format_instant(&shift.starts_at),
            format_instant(&shift.ends_at),
            format_instant(&shift.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_shift(conn: &Connection, id: &Uuid) -> Result<Option<Shift>, DatabaseError> {
    let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts s WHERE s.id = ?1");
    let shift = conn
        .query_row(&sql, params![id.to_string()], row_to_shift)
        .optional()?;
    Ok(shift)
}

pub fn delete_shift(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM shifts WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("shift", id));
    }
    Ok(())
}

/// Shifts in start order, optionally for one staff member.
pub fn list_shifts(
    conn: &Connection,
    user_id: Option<&Uuid>,
    limit: usize,
) -> Result<Vec<ShiftListing>, DatabaseError> {
    let sql = format!(
        "SELECT {SHIFT_COLUMNS}, p.prenom, p.nom
         FROM shifts s LEFT JOIN profiles p ON p.id = s.user_id
         WHERE (?1 IS NULL OR s.user_id = ?1)
         ORDER BY s.starts_at ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.map(|u| u.to_string()), limit as i64], |row| {
        Ok(ShiftListing {
            shift: row_to_shift(row)?,
            user_name: joined_name(row.get(6)?, row.get(7)?),
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::datetime::parse_instant;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Role;

    fn shift(user_id: Uuid, start: &str, end: &str) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            user_id,
            role: Role::Infirmiere,
            starts_at: parse_instant(start).unwrap(),
            ends_at: parse_instant(end).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn list_filters_by_user_and_orders_by_start() {
        let conn = open_memory_database().unwrap();
        let a = fixtures::profile(&conn, Role::Infirmiere, "Simplice", "Soeur");
        let b = fixtures::profile(&conn, Role::Infirmiere, "Perpetue", "Soeur");
        insert_shift(&conn, &shift(a, "2024-07-02T07:00", "2024-07-02T19:00")).unwrap();
        insert_shift(&conn, &shift(a, "2024-07-01T07:00", "2024-07-01T19:00")).unwrap();
        insert_shift(&conn, &shift(b, "2024-07-01T19:00", "2024-07-02T07:00")).unwrap();

        let mine = list_shifts(&conn, Some(&a), 50).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].shift.starts_at < mine[1].shift.starts_at);
        assert_eq!(mine[0].user_name.as_deref(), Some("Soeur Simplice"));
        assert_eq!(list_shifts(&conn, None, 50).unwrap().len(), 3);
    }

    #[test]
    fn delete_shift_roundtrip() {
        let conn = open_memory_database().unwrap();
        let a = fixtures::profile(&conn, Role::Infirmiere, "Simplice", "Soeur");
        let s = shift(a, "2024-07-02T07:00", "2024-07-02T19:00");
        insert_shift(&conn, &s).unwrap();
        assert!(get_shift(&conn, &s.id).unwrap().is_some());
        delete_shift(&conn, &s.id).unwrap();
        assert!(get_shift(&conn, &s.id).unwrap().is_none());
    }
}
