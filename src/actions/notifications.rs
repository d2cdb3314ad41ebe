use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository as repo;
use crate::models::enums::{NotificationType, Role};
use crate::models::Notification;
use crate::validation::{optional_choice, parse_id, required};

pub const LIST_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationForm {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
}

/// Admin: notify one user. The channel defaults to in-app.
pub fn create_notification(conn: &Connection, actor: &Actor, form: &NotificationForm) -> ActionResult {
    actor.require_admin("Accès refusé: admin requis")?;
    let user_id = parse_id(form.user_id.as_deref(), "Utilisateur requis")?;
    let title = required(form.title.as_deref(), "Le titre est requis")?;
    let message = required(form.message.as_deref(), "Le message est requis")?;
    let kind = optional_choice::<NotificationType>(form.kind.as_deref(), "Type")?
        .unwrap_or(NotificationType::InApp);
    if repo::get_profile(conn, &user_id)?.is_none() {
        return Err(ActionError::NotFound("Utilisateur introuvable".into()));
    }

    let notification = Notification {
        id: Uuid::new_v4(),
        user_id,
        kind,
        title,
        message,
        created_at: Utc::now(),
        read_at: None,
    };
    repo::insert_notification(conn, &notification)?;
    tracing::info!(actor = %actor.user_id, user = %user_id, kind = kind.as_str(), "Notification created");
    Ok("Notification créée")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationIdForm {
    pub notification_id: Option<String>,
}

pub fn mark_notification_read(
    conn: &Connection,
    actor: &Actor,
    form: &NotificationIdForm,
) -> ActionResult {
    let id = parse_id(form.notification_id.as_deref(), "Notification ID manquant")?;
    let notification = repo::get_notification(conn, &id)?
        .filter(|n| n.user_id == actor.user_id)
        .ok_or_else(|| ActionError::NotFound("Notification introuvable".into()))?;
    repo::mark_notification_read(conn, &notification.id)?;
    Ok("Notification marquée comme lue")
}

/// The actor's own notifications; admins see the latest across all users.
pub fn list_notifications(conn: &Connection, actor: &Actor) -> ActionResult<Vec<Notification>> {
    let list = match actor.role {
        Role::Admin => repo::list_recent_notifications(conn, LIST_LIMIT)?,
        _ => repo::list_notifications_for_user(conn, &actor.user_id, LIST_LIMIT)?,
    };
    Ok(list)
}
