use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_opt_ts, col_ts, col_uuid, joined_name, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::*;

const MESSAGE_COLUMNS: &str = "m.id, m.sender_id, m.recipient_id, m.body, m.created_at, m.read_at";

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: col_uuid(row, 0)?,
        sender_id: col_uuid(row, 1)?,
        recipient_id: col_uuid(row, 2)?,
        body: row.get(3)?,
        created_at: col_ts(row, 4)?,
        read_at: col_opt_ts(row, 5)?,
    })
}

pub fn insert_message(conn: &Connection, message: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, sender_id, recipient_id, body, created_at, read_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.id.to_string(),
            message.sender_id.to_string(),
            message.recipient_id.to_string(),
            message.body,
            format_instant(&message.created_at),
            message.read_at.as_ref().map(format_instant),
        ],
    )?;
    Ok(())
}

pub fn get_message(conn: &Connection, id: &Uuid) -> Result<Option<Message>, DatabaseError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1");
    let message = conn
        .query_row(&sql, params![id.to_string()], row_to_message)
        .optional()?;
    Ok(message)
}

/// Stamp `read_at` once; re-reading keeps the first timestamp.
pub fn mark_message_read(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE messages SET read_at = COALESCE(read_at, ?1) WHERE id = ?2",
        params![now_ts(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("message", id));
    }
    Ok(())
}

/// Sent and received messages of a user, newest first.
pub fn list_messages_for_user(
    conn: &Connection,
    user_id: &Uuid,
    limit: usize,
) -> Result<Vec<MessageListing>, DatabaseError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS}, s.prenom, s.nom, r.prenom, r.nom
         FROM messages m
         LEFT JOIN profiles s ON s.id = m.sender_id
         LEFT JOIN profiles r ON r.id = m.recipient_id
         WHERE m.sender_id = ?1 OR m.recipient_id = ?1
         ORDER BY m.created_at DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], |row| {
        Ok(MessageListing {
            message: row_to_message(row)?,
            sender_name: joined_name(row.get(6)?, row.get(7)?),
            recipient_name: joined_name(row.get(8)?, row.get(9)?),
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn unread_message_count(conn: &Connection, user_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND read_at IS NULL",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Delete messages read before `cutoff` (storage format). Unread messages are kept.
pub fn delete_read_messages_before(conn: &Connection, cutoff: &str) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM messages WHERE read_at IS NOT NULL AND read_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
