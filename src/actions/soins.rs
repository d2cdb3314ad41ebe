use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository as repo;
use crate::models::enums::{Role, SoinStatus};
use crate::models::{Soin, SoinListing};
use crate::stay::select_for_care;
use crate::validation::{
    optional, optional_choice, optional_id, parse_choice, parse_datetime, parse_id, required,
};

pub const LIST_LIMIT: usize = 200;

const NOT_HOSPITALIZED: &str = "Le patient n'est pas hospitalisé à la date prévue";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoinForm {
    pub patient_id: Option<String>,
    pub type_soin: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<String>,
    pub assigned_to_nurse_id: Option<String>,
    pub status: Option<String>,
}

/// Care type falls back to the title, then to "Autre".
fn type_soin_or_default(type_soin: Option<&str>, title: &str) -> String {
    optional(type_soin)
        .or_else(|| optional(Some(title)))
        .unwrap_or_else(|| "Autre".to_string())
}

/// Staff: schedule a care task inside the patient's current stay.
///
/// The task is attached to the most recently admitted active stay, from
/// either schema, whose window contains the scheduled time.
pub fn create_soin(conn: &Connection, actor: &Actor, form: &SoinForm) -> ActionResult {
    actor.require_staff()?;
    let patient_id = parse_id(form.patient_id.as_deref(), "Patient requis")?;
    let title = required(form.title.as_deref(), "Le titre est requis")?;
    let scheduled_at = parse_datetime(form.scheduled_at.as_deref(), "Date/heure planifiées invalides")?;
    let status = optional_choice::<SoinStatus>(form.status.as_deref(), "Statut")?
        .unwrap_or(SoinStatus::Scheduled);

    let nurse = optional_id(form.assigned_to_nurse_id.as_deref())?;
    if let Some(nurse_id) = nurse {
        let is_nurse = repo::get_profile(conn, &nurse_id)?
            .is_some_and(|p| p.role == Role::Infirmiere);
        if !is_nurse {
            return Err(ActionError::validation("Infirmière introuvable"));
        }
    }

    let stays = repo::stays_for_patient(conn, &patient_id)?;
    let stay = select_for_care(&stays, &scheduled_at)
        .ok_or_else(|| ActionError::validation(NOT_HOSPITALIZED))?;

    let soin = Soin {
        id: Uuid::new_v4(),
        patient_id,
        hospitalisation_id: Some(stay.id),
        type_soin: type_soin_or_default(form.type_soin.as_deref(), &title),
        title,
        description: optional(form.description.as_deref()),
        scheduled_at,
        assigned_to_nurse_id: nurse,
        status,
        created_at: Utc::now(),
        updated_at: None,
    };
    repo::insert_soin(conn, &soin)?;
    tracing::info!(
        actor = %actor.user_id,
        soin = %soin.id,
        stay = %stay.id,
        source = ?stay.source,
        "Soin scheduled"
    );
    Ok("Soin créé")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SoinStatusForm {
    pub soin_id: Option<String>,
    pub status: Option<String>,
}

pub fn update_soin_status(conn: &Connection, actor: &Actor, form: &SoinStatusForm) -> ActionResult {
    actor.require_staff()?;
    let id = parse_id(form.soin_id.as_deref(), "ID ou statut manquant")?;
    let status: SoinStatus = parse_choice(form.status.as_deref(), "Statut")?;
    repo::update_soin_status(conn, &id, status)?;
    Ok("Statut du soin mis à jour")
}

pub fn delete_soin(conn: &Connection, actor: &Actor, form: &SoinStatusForm) -> ActionResult {
    actor.require_admin("Accès refusé: admin requis pour supprimer")?;
    let id = parse_id(form.soin_id.as_deref(), "Soin ID manquant")?;
    repo::delete_soin(conn, &id)?;
    Ok("Soin supprimé")
}

/// Nurses see the tasks assigned to them; other staff see every task.
pub fn list_soins(conn: &Connection, actor: &Actor) -> ActionResult<Vec<SoinListing>> {
    actor.require_staff()?;
    let nurse = (actor.role == Role::Infirmiere).then_some(&actor.user_id);
    Ok(repo::list_soins(conn, nurse, LIST_LIMIT)?)
}
