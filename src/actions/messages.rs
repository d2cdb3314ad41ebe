use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::datetime::format_instant;
use crate::db::repository as repo;
use crate::models::{Message, MessageListing};
use crate::validation::{parse_id, required};

pub const INBOX_LIMIT: usize = 100;
pub const MAX_BODY_CHARS: usize = 4000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageForm {
    pub recipient_id: Option<String>,
    pub body: Option<String>,
}

/// Any signed-in user: send a direct message to another profile.
pub fn send_message(conn: &Connection, actor: &Actor, form: &MessageForm) -> ActionResult {
    let recipient_id = parse_id(form.recipient_id.as_deref(), "Destinataire requis")?;
    let body = required(form.body.as_deref(), "Le message ne peut pas être vide")?;
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ActionError::validation(format!(
            "Le message dépasse {MAX_BODY_CHARS} caractères"
        )));
    }
    if recipient_id == actor.user_id {
        return Err(ActionError::validation(
            "Vous ne pouvez pas vous envoyer un message",
        ));
    }
    if repo::get_profile(conn, &recipient_id)?.is_none() {
        return Err(ActionError::NotFound("Destinataire introuvable".into()));
    }

    let message = Message {
        id: Uuid::new_v4(),
        sender_id: actor.user_id,
        recipient_id,
        body,
        created_at: Utc::now(),
        read_at: None,
    };
    repo::insert_message(conn, &message)?;
    tracing::debug!(sender = %actor.user_id, recipient = %recipient_id, "Message sent");
    Ok("Message envoyé")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageIdForm {
    pub message_id: Option<String>,
}

/// Only the recipient can mark a message as read.
pub fn mark_message_read(conn: &Connection, actor: &Actor, form: &MessageIdForm) -> ActionResult {
    let id = parse_id(form.message_id.as_deref(), "Message ID manquant")?;
    let message = repo::get_message(conn, &id)?
        .filter(|m| m.recipient_id == actor.user_id)
        .ok_or_else(|| ActionError::NotFound("Message introuvable".into()))?;
    repo::mark_message_read(conn, &message.id)?;
    Ok("Message marqué comme lu")
}

pub fn list_inbox(conn: &Connection, actor: &Actor) -> ActionResult<Vec<MessageListing>> {
    Ok(repo::list_messages_for_user(conn, &actor.user_id, INBOX_LIMIT)?)
}

/// Purge messages read more than `retention_days` before `now`.
pub fn cleanup_messages(
    conn: &Connection,
    retention_days: i64,
    now: DateTime<Utc>,
) -> ActionResult<usize> {
    let cutoff = Duration::try_days(retention_days)
        .filter(|window| *window > Duration::zero())
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| ActionError::validation("Durée de conservation invalide"))?;
    let deleted = repo::delete_read_messages_before(conn, &format_instant(&cutoff))?;
    tracing::info!(deleted, retention_days, "Read messages purged");
    Ok(deleted)
}
