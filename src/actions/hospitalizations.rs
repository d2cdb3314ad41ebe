use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository::{self as repo, NewLegacyStay};
use crate::models::enums::HospitalizationStatus;
use crate::stay::{Stay, StayListing, StayStatus};
use crate::validation::{
    optional, optional_choice, optional_datetime, parse_datetime, parse_id,
    ValidationError,
};

pub const LIST_LIMIT: usize = 200;

const DISCHARGE_DATE_REQUIRED: &str =
    "La date de sortie est requise lorsque le statut est 'discharged'";
const DISCHARGE_BEFORE_ADMISSION: &str =
    "La date de sortie ne peut pas précéder la date d'admission";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HospitalizationForm {
    pub id: Option<String>,
    pub patient_id: Option<String>,
    pub ward: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub admitted_at: Option<String>,
    pub discharged_at: Option<String>,
    pub status: Option<String>,
}

fn check_window(
    admitted_at: &DateTime<Utc>,
    discharged_at: Option<&DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match discharged_at {
        Some(end) if end < admitted_at => Err(ValidationError::new(DISCHARGE_BEFORE_ADMISSION)),
        _ => Ok(()),
    }
}

fn locate(conn: &Connection, form_id: Option<&str>) -> ActionResult<Stay> {
    let id = parse_id(form_id, "Hospitalisation ID manquant")?;
    repo::locate_stay(conn, &id)?
        .ok_or_else(|| ActionError::NotFound("Hospitalisation introuvable".into()))
}

/// Staff: open a stay. New stays are written to the legacy table.
pub fn create_hospitalization(
    conn: &Connection,
    actor: &Actor,
    form: &HospitalizationForm,
) -> ActionResult {
    actor.require_staff()?;
    let patient_id = parse_id(form.patient_id.as_deref(), "Patient requis")?;
    let admitted_at = parse_datetime(form.admitted_at.as_deref(), "Date d'admission invalide")?;
    let discharged_at = optional_datetime(form.discharged_at.as_deref(), "Date de sortie invalide")?;
    let status = optional_choice::<HospitalizationStatus>(form.status.as_deref(), "Statut")?
        .unwrap_or(HospitalizationStatus::Active);

    if status == HospitalizationStatus::Discharged && discharged_at.is_none() {
        return Err(ActionError::validation(DISCHARGE_DATE_REQUIRED));
    }
    check_window(&admitted_at, discharged_at.as_ref())?;

    if repo::get_patient(conn, &patient_id)?.is_none() {
        return Err(ActionError::NotFound("Patient introuvable".into()));
    }

    let id = repo::insert_legacy_stay(
        conn,
        &NewLegacyStay {
            patient_id,
            ward: optional(form.ward.as_deref()),
            room: optional(form.room.as_deref()),
            bed: optional(form.bed.as_deref()),
            admitted_at,
            discharged_at,
            status,
        },
    )?;
    tracing::info!(actor = %actor.user_id, stay = %id, patient = %patient_id, "Hospitalization created");
    Ok("Hospitalisation créée")
}

/// Staff: partial update. Only the fields present in the form change.
pub fn update_hospitalization(
    conn: &Connection,
    actor: &Actor,
    form: &HospitalizationForm,
) -> ActionResult {
    actor.require_staff()?;
    let mut stay = locate(conn, form.id.as_deref())?;

    let status: Option<HospitalizationStatus> = optional_choice(form.status.as_deref(), "Statut")?;
    let discharged_at = optional_datetime(form.discharged_at.as_deref(), "Date de sortie invalide")?;
    if status == Some(HospitalizationStatus::Discharged) && discharged_at.is_none() {
        return Err(ActionError::validation(DISCHARGE_DATE_REQUIRED));
    }

    if let Some(ward) = optional(form.ward.as_deref()) {
        stay.ward = Some(ward);
    }
    if let Some(room) = optional(form.room.as_deref()) {
        stay.room = Some(room);
    }
    if let Some(bed) = optional(form.bed.as_deref()) {
        stay.bed = Some(bed);
    }
    if let Some(admitted_at) =
        optional_datetime(form.admitted_at.as_deref(), "Date d'admission invalide")?
    {
        stay.admitted_at = admitted_at;
    }
    if let Some(end) = discharged_at {
        stay.discharged_at = Some(end);
    }
    if let Some(status) = status {
        stay.status = status.into();
    }
    check_window(&stay.admitted_at, stay.discharged_at.as_ref())?;

    repo::save_stay(conn, &stay)?;
    Ok("Hospitalisation mise à jour")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HospitalizationIdForm {
    pub id: Option<String>,
}

/// Staff: close a stay now.
pub fn discharge_hospitalization(
    conn: &Connection,
    actor: &Actor,
    form: &HospitalizationIdForm,
) -> ActionResult {
    actor.require_staff()?;
    let mut stay = locate(conn, form.id.as_deref())?;
    let now = Utc::now();
    stay.status = StayStatus::Discharged;
    stay.discharged_at = Some(now.max(stay.admitted_at));
    repo::save_stay(conn, &stay)?;
    tracing::info!(actor = %actor.user_id, stay = %stay.id, source = ?stay.source, "Patient discharged");
    Ok("Patient sorti")
}

/// Admin: delete a stay from whichever table holds it.
pub fn delete_hospitalization(
    conn: &Connection,
    actor: &Actor,
    form: &HospitalizationIdForm,
) -> ActionResult {
    actor.require_admin("Suppression réservée aux administrateurs")?;
    let stay = locate(conn, form.id.as_deref())?;
    repo::delete_stay(conn, stay.source, &stay.id)?;
    Ok("Hospitalisation supprimée")
}

/// Staff: every stay from both tables, newest admission first.
pub fn list_hospitalizations(conn: &Connection, actor: &Actor) -> ActionResult<Vec<StayListing>> {
    actor.require_staff()?;
    Ok(repo::list_stays(conn, LIST_LIMIT)?)
}

/// Staff: one stay, for the edit form.
pub fn get_hospitalization(conn: &Connection, actor: &Actor, id: &str) -> ActionResult<Stay> {
    actor.require_staff()?;
    locate(conn, Some(id))
}
