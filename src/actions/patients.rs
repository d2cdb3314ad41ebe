use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository::{self as repo, PatientKey};
use crate::db::DatabaseError;
use crate::models::enums::{BloodType, Gender};
use crate::models::{Patient, PatientFields, Soin};
use crate::stay::Stay;
use crate::validation::{
    optional, optional_choice, optional_date, optional_email, optional_id, parse_choice, parse_id,
    required, Validated,
};

pub const SEARCH_LIMIT: usize = 50;
pub const SUGGEST_LIMIT: usize = 8;
pub const PICKER_LIMIT: usize = 2_000;

/// Dossier form shared by the staff create/link, staff edit and self-service pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    /// Account to link the dossier to (staff create/link only).
    #[serde(rename = "user_id")]
    pub user_id: Option<String>,
    #[serde(rename = "patient_id")]
    pub patient_id: Option<String>,
}

impl PatientForm {
    pub fn fields(&self) -> Validated<PatientFields> {
        Ok(PatientFields {
            first_name: required(self.first_name.as_deref(), "Le prénom est requis")?,
            last_name: required(self.last_name.as_deref(), "Le nom est requis")?,
            email: optional_email(self.email.as_deref())?,
            phone: optional(self.phone.as_deref()),
            dob: optional_date(self.dob.as_deref())?,
            gender: parse_choice::<Gender>(self.gender.as_deref(), "Genre")?,
            blood_type: optional_choice::<BloodType>(self.blood_type.as_deref(), "Groupe sanguin")?,
        })
    }
}

/// Staff: create a dossier, or link/merge one into a user account.
///
/// With an account selected, the dossier already bound to that account wins,
/// then the one matching the email, then the one matching the phone; a new
/// linked dossier is created otherwise. Without an account, the row is upserted
/// on email, else phone, else inserted.
pub fn create_or_link_patient(conn: &Connection, actor: &Actor, form: &PatientForm) -> ActionResult {
    actor.require_staff()?;
    let fields = form.fields()?;
    let selected = optional_id(form.user_id.as_deref())?;

    let Some(user_id) = selected else {
        match (&fields.email, &fields.phone) {
            (Some(_), _) => repo::upsert_patient(conn, &fields, PatientKey::Email, None, true)?,
            (None, Some(_)) => repo::upsert_patient(conn, &fields, PatientKey::Phone, None, true)?,
            (None, None) => repo::create_patient(conn, &fields, None, true)?,
        };
        tracing::info!(actor = %actor.user_id, "Patient dossier saved without account");
        return Ok("Dossier créé (sans compte)");
    };

    if repo::get_profile(conn, &user_id)?.is_none() {
        return Err(ActionError::NotFound("Compte utilisateur introuvable".into()));
    }

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    if let Some(existing) = repo::find_patient_by_user(&tx, &user_id)? {
        repo::update_patient_fields(&tx, &existing.id, &fields, Some(user_id), true)?;
        tx.commit().map_err(DatabaseError::from)?;
        return Ok("Dossier lié et mis à jour");
    }

    let by_email = match &fields.email {
        Some(email) => repo::find_patient_by_email(&tx, email)?,
        None => None,
    };
    let by_phone = match &fields.phone {
        Some(phone) => repo::find_patient_by_phone(&tx, phone)?,
        None => None,
    };

    let target = match (by_email, by_phone) {
        (Some(e), Some(p)) if e.id != p.id => {
            return Err(ActionError::Conflict(
                "Conflit: email et téléphone appartiennent à deux dossiers différents.".into(),
            ));
        }
        (Some(e), _) => Some(e.id),
        (None, Some(p)) => Some(p.id),
        (None, None) => None,
    };

    let message = match target {
        Some(id) => {
            repo::update_patient_fields(&tx, &id, &fields, Some(user_id), true)?;
            "Dossier lié au compte utilisateur"
        }
        None => {
            repo::create_patient(&tx, &fields, Some(user_id), true)?;
            "Dossier créé et lié au compte utilisateur"
        }
    };
    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(actor = %actor.user_id, user = %user_id, "Patient dossier linked");
    Ok(message)
}

/// Patient: create or update their own dossier.
pub fn upsert_self_patient(conn: &Connection, actor: &Actor, form: &PatientForm) -> ActionResult {
    if let Some(existing) = repo::find_patient_by_user(conn, &actor.user_id)? {
        if existing.managed_by_staff {
            return Err(ActionError::Conflict(
                "Votre dossier est géré par l'équipe médicale et ne peut pas être modifié.".into(),
            ));
        }
    }

    let fields = form.fields()?;
    let linked_elsewhere = |p: Option<Patient>| {
        p.and_then(|p| p.user_id)
            .is_some_and(|owner| owner != actor.user_id)
    };
    if let Some(email) = &fields.email {
        if linked_elsewhere(repo::find_patient_by_email(conn, email)?) {
            return Err(ActionError::Conflict(
                "Un dossier existe déjà pour cet email. Contactez le support.".into(),
            ));
        }
    }
    if let Some(phone) = &fields.phone {
        if linked_elsewhere(repo::find_patient_by_phone(conn, phone)?) {
            return Err(ActionError::Conflict(
                "Un dossier existe déjà pour ce numéro de téléphone. Contactez le support.".into(),
            ));
        }
    }

    repo::upsert_patient(conn, &fields, PatientKey::UserId, Some(actor.user_id), false)?;
    Ok("Dossier enregistré")
}

/// Staff: edit an existing dossier. Returns the dossier id for the redirect.
pub fn update_patient(conn: &Connection, actor: &Actor, form: &PatientForm) -> ActionResult<Uuid> {
    actor.require_staff()?;
    let id = parse_id(form.patient_id.as_deref(), "Patient ID manquant")?;
    let fields = form.fields()?;
    repo::update_patient_fields(conn, &id, &fields, None, false)?;
    Ok(id)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientIdForm {
    pub patient_id: Option<String>,
}

/// Admin: delete a dossier and, through cascades, its stays and care tasks.
pub fn delete_patient(conn: &Connection, actor: &Actor, form: &PatientIdForm) -> ActionResult {
    actor.require_admin("Suppression réservée aux administrateurs")?;
    let id = parse_id(form.patient_id.as_deref(), "Patient ID manquant")?;
    repo::delete_patient(conn, &id)?;
    tracing::info!(actor = %actor.user_id, patient = %id, "Patient dossier deleted");
    Ok("Dossier supprimé")
}

/// Staff patient list, filtered by `query` when given.
pub fn search_patients(conn: &Connection, actor: &Actor, query: Option<&str>) -> ActionResult<Vec<Patient>> {
    actor.require_staff()?;
    Ok(repo::search_patients(conn, query, SEARCH_LIMIT)?)
}

/// Every dossier, alphabetical, for the patient select boxes on staff forms.
pub fn patient_choices(conn: &Connection, actor: &Actor) -> ActionResult<Vec<Patient>> {
    actor.require_staff()?;
    Ok(repo::list_patients_by_name(conn, PICKER_LIMIT)?)
}

/// Autocomplete suggestions for patient pickers.
pub fn suggest_patients(conn: &Connection, actor: &Actor, query: &str) -> ActionResult<Vec<Patient>> {
    actor.require_staff()?;
    Ok(repo::suggest_patients(conn, query, SUGGEST_LIMIT)?)
}

/// The signed-in patient's own dossier, if any.
pub fn own_dossier(conn: &Connection, actor: &Actor) -> ActionResult<Option<Patient>> {
    Ok(repo::find_patient_by_user(conn, &actor.user_id)?)
}

/// Stays and care tasks of the signed-in patient's dossier.
pub fn own_care(conn: &Connection, actor: &Actor) -> ActionResult<(Vec<Stay>, Vec<Soin>)> {
    match repo::find_patient_by_user(conn, &actor.user_id)? {
        Some(dossier) => Ok((
            repo::stays_for_patient(conn, &dossier.id)?,
            repo::list_soins_for_patient(conn, &dossier.id)?,
        )),
        None => Ok((Vec::new(), Vec::new())),
    }
}

/// Staff: one dossier, for the edit form.
pub fn get_patient(conn: &Connection, actor: &Actor, id: &Uuid) -> ActionResult<Patient> {
    actor.require_staff()?;
    repo::get_patient(conn, id)?.ok_or_else(|| ActionError::NotFound("Patient introuvable".into()))
}
