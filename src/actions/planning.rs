use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository as repo;
use crate::models::enums::Role;
use crate::models::{Shift, ShiftListing};
use crate::validation::{optional_choice, parse_datetime, parse_id};

pub const LIST_LIMIT: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftForm {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

/// Admin: plan a shift for a staff member. The shift role is the member's
/// profile role; a submitted role that disagrees is rejected.
pub fn create_shift(conn: &Connection, actor: &Actor, form: &ShiftForm) -> ActionResult {
    actor.require_admin("Accès refusé: admin requis")?;
    let user_id = parse_id(form.user_id.as_deref(), "Membre du personnel requis")?;
    let starts_at = parse_datetime(form.starts_at.as_deref(), "Début de garde invalide")?;
    let ends_at = parse_datetime(form.ends_at.as_deref(), "Fin de garde invalide")?;
    if ends_at <= starts_at {
        return Err(ActionError::validation("La fin doit être postérieure au début"));
    }

    let profile = repo::get_profile(conn, &user_id)?
        .ok_or_else(|| ActionError::NotFound("Utilisateur introuvable".into()))?;
    if !profile.role.is_staff() {
        return Err(ActionError::validation("Seul le personnel peut être planifié"));
    }
    let role = optional_choice::<Role>(form.role.as_deref(), "Rôle")?.unwrap_or(profile.role);
    if role != profile.role {
        return Err(ActionError::validation(
            "Le rôle de la garde ne correspond pas au rôle de l'utilisateur",
        ));
    }

    let shift = Shift {
        id: Uuid::new_v4(),
        user_id,
        role,
        starts_at,
        ends_at,
        created_at: Utc::now(),
    };
    repo::insert_shift(conn, &shift)?;
    tracing::info!(actor = %actor.user_id, user = %user_id, shift = %shift.id, "Shift planned");
    Ok("Garde créée")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShiftIdForm {
    pub shift_id: Option<String>,
}

pub fn delete_shift(conn: &Connection, actor: &Actor, form: &ShiftIdForm) -> ActionResult {
    actor.require_admin("Accès refusé: admin requis")?;
    let id = parse_id(form.shift_id.as_deref(), "Garde ID manquante")?;
    repo::delete_shift(conn, &id)?;
    Ok("Garde supprimée")
}

/// Admin sees every shift, other staff their own.
pub fn list_shifts(conn: &Connection, actor: &Actor) -> ActionResult<Vec<ShiftListing>> {
    actor.require_staff()?;
    let user = (actor.role != Role::Admin).then_some(&actor.user_id);
    Ok(repo::list_shifts(conn, user, LIST_LIMIT)?)
}
