use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_enum, col_opt_ts, col_ts, col_uuid, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::*;

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, title, message, created_at, read_at";

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: col_uuid(row, 0)?,
        user_id: col_uuid(row, 1)?,
        kind: col_enum(row, 2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        created_at: col_ts(row, 5)?,
        read_at: col_opt_ts(row, 6)?,
    })
}

pub fn insert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, type, title, message, created_at, read_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            n.id.to_string(),
            n.user_id.to_string(),
            n.kind.as_str(),
            n.title,
            n.message,
            format_instant(&n.created_at),
            n.read_at.as_ref().map(format_instant),
        ],
    )?;
    Ok(())
}

pub fn get_notification(conn: &Connection, id: &Uuid) -> Result<Option<Notification>, DatabaseError> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");
    let n = conn
        .query_row(&sql, params![id.to_string()], row_to_notification)
        .optional()?;
    Ok(n)
}

pub fn list_notifications_for_user(
    conn: &Connection,
    user_id: &Uuid,
    limit: usize,
) -> Result<Vec<Notification>, DatabaseError> {
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?1
         ORDER BY created_at DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], row_to_notification)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Latest notifications across all users (admin view).
pub fn list_recent_notifications(conn: &Connection, limit: usize) -> Result<Vec<Notification>, DatabaseError> {
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], row_to_notification)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn mark_notification_read(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read_at = COALESCE(read_at, ?1) WHERE id = ?2",
        params![now_ts(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("notification", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{NotificationType, Role};

    fn note(user_id: Uuid, title: &str, age_minutes: i64) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: NotificationType::InApp,
            title: title.into(),
            message: "Rappel".into(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
            read_at: None,
        }
    }

    #[test]
    fn user_feed_is_newest_first() {
        let conn = open_memory_database().unwrap();
        let u = fixtures::profile(&conn, Role::Patient, "Thenard", "Azelma");
        let other = fixtures::profile(&conn, Role::Patient, "Thenard", "Eponine");
        insert_notification(&conn, &note(u, "ancienne", 30)).unwrap();
        insert_notification(&conn, &note(u, "récente", 1)).unwrap();
        insert_notification(&conn, &note(other, "autre", 5)).unwrap();

        let feed = list_notifications_for_user(&conn, &u, 10).unwrap();
        let titles: Vec<&str> = feed.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["récente", "ancienne"]);
        assert_eq!(list_recent_notifications(&conn, 2).unwrap().len(), 2);
    }

    #[test]
    fn mark_read() {
        let conn = open_memory_database().unwrap();
        let u = fixtures::profile(&conn, Role::Patient, "Thenard", "Azelma");
        let n = note(u, "x", 0);
        insert_notification(&conn, &n).unwrap();
        mark_notification_read(&conn, &n.id).unwrap();
        assert!(get_notification(&conn, &n.id).unwrap().unwrap().read_at.is_some());
        assert!(mark_notification_read(&conn, &Uuid::new_v4()).is_err());
    }
}
