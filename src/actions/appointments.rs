use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::db::repository::{self as repo, AppointmentScope};
use crate::models::enums::{AppointmentStatus, Role};
use crate::models::{Appointment, AppointmentListing};
use crate::validation::{
    optional, optional_choice, optional_datetime, optional_id, parse_choice, parse_datetime,
    parse_id,
};

pub const LIST_LIMIT: usize = 200;

const BOOKING_ROLES: &[Role] = &[Role::Admin, Role::Medecin];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentForm {
    pub patient_id: Option<String>,
    pub medecin_id: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
}

/// Admin or physician: book an appointment. A physician books for themself;
/// leaving the physician blank defaults to the acting physician.
pub fn create_appointment(conn: &Connection, actor: &Actor, form: &AppointmentForm) -> ActionResult {
    actor.require(BOOKING_ROLES, "Accès refusé: rôle médecin ou admin requis")?;
    let patient_id = parse_id(form.patient_id.as_deref(), "Patient requis")?;

    let medecin_id = match (optional_id(form.medecin_id.as_deref())?, actor.role) {
        (Some(id), _) => id,
        (None, Role::Medecin) => actor.user_id,
        (None, _) => return Err(ActionError::validation("Médecin requis")),
    };
    if actor.role == Role::Medecin && medecin_id != actor.user_id {
        return Err(ActionError::validation(
            "Un médecin ne peut réserver que ses propres rendez-vous",
        ));
    }
    let is_medecin = repo::get_profile(conn, &medecin_id)?.is_some_and(|p| p.role == Role::Medecin);
    if !is_medecin {
        return Err(ActionError::validation("Médecin introuvable"));
    }

    let starts_at = parse_datetime(form.starts_at.as_deref(), "Date de début invalide")?;
    let ends_at = optional_datetime(form.ends_at.as_deref(), "Date de fin invalide")?;
    if ends_at.is_some_and(|end| end <= starts_at) {
        return Err(ActionError::validation("La fin doit être postérieure au début"));
    }
    let status = optional_choice::<AppointmentStatus>(form.status.as_deref(), "Statut")?
        .unwrap_or(AppointmentStatus::Booked);

    if repo::get_patient(conn, &patient_id)?.is_none() {
        return Err(ActionError::NotFound("Patient introuvable".into()));
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id,
        medecin_id,
        starts_at,
        ends_at,
        location: optional(form.location.as_deref()),
        status,
        reason: optional(form.reason.as_deref()),
        created_at: Utc::now(),
    };
    repo::insert_appointment(conn, &appointment)?;
    tracing::info!(actor = %actor.user_id, appointment = %appointment.id, "Appointment booked");
    Ok("Rendez-vous créé")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentStatusForm {
    pub appointment_id: Option<String>,
    pub status: Option<String>,
}

/// Admin, or the physician owning the appointment.
pub fn update_appointment_status(
    conn: &Connection,
    actor: &Actor,
    form: &AppointmentStatusForm,
) -> ActionResult {
    actor.require(BOOKING_ROLES, "Accès refusé: rôle médecin ou admin requis")?;
    let id = parse_id(form.appointment_id.as_deref(), "Rendez-vous ID manquant")?;
    let status: AppointmentStatus = parse_choice(form.status.as_deref(), "Statut")?;
    let appointment = repo::get_appointment(conn, &id)?
        .ok_or_else(|| ActionError::NotFound("Rendez-vous introuvable".into()))?;
    if actor.role == Role::Medecin && appointment.medecin_id != actor.user_id {
        return Err(ActionError::Forbidden {
            message: "Ce rendez-vous ne vous est pas attribué".into(),
            redirect: actor.role.section_path("appointments"),
        });
    }
    repo::update_appointment_status(conn, &id, status)?;
    Ok("Statut du rendez-vous mis à jour")
}

/// Admin and nurses see everything, a physician their own agenda, a patient
/// the appointments of their dossier.
pub fn list_appointments(conn: &Connection, actor: &Actor) -> ActionResult<Vec<AppointmentListing>> {
    let scope = match actor.role {
        Role::Admin | Role::Infirmiere => AppointmentScope::All,
        Role::Medecin => AppointmentScope::Medecin(actor.user_id),
        Role::Patient => match repo::find_patient_by_user(conn, &actor.user_id)? {
            Some(dossier) => AppointmentScope::Patient(dossier.id),
            None => return Ok(Vec::new()),
        },
    };
    Ok(repo::list_appointments(conn, scope, LIST_LIMIT)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::actor;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn form(patient: Uuid, medecin: Option<Uuid>) -> AppointmentForm {
        AppointmentForm {
            patient_id: Some(patient.to_string()),
            medecin_id: medecin.map(|m| m.to_string()),
            starts_at: Some("2024-06-01T09:00".into()),
            ends_at: Some("2024-06-01T09:30".into()),
            ..Default::default()
        }
    }

    #[test]
    fn medecin_defaults_to_self_and_cannot_book_for_others() {
        let conn = open_memory_database().unwrap();
        let doc = actor(&conn, Role::Medecin);
        let other = actor(&conn, Role::Medecin);
        let p = fixtures::patient(&conn, "Fantine", "Thenard");

        create_appointment(&conn, &doc, &form(p, None)).unwrap();
        let err = create_appointment(&conn, &doc, &form(p, Some(other.user_id))).unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));

        let mine = list_appointments(&conn, &doc).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].appointment.medecin_id, doc.user_id);
        assert!(list_appointments(&conn, &other).unwrap().is_empty());
    }

    #[test]
    fn admin_must_pick_a_real_physician() {
        let conn = open_memory_database().unwrap();
        let admin = actor(&conn, Role::Admin);
        let nurse = actor(&conn, Role::Infirmiere);
        let p = fixtures::patient(&conn, "Fantine", "Thenard");
        assert_eq!(
            create_appointment(&conn, &admin, &form(p, None)).unwrap_err().user_message(),
            "Médecin requis"
        );
        assert_eq!(
            create_appointment(&conn, &admin, &form(p, Some(nurse.user_id)))
                .unwrap_err()
                .user_message(),
            "Médecin introuvable"
        );
    }

    #[test]
    fn end_must_follow_start() {
        let conn = open_memory_database().unwrap();
        let doc = actor(&conn, Role::Medecin);
        let p = fixtures::patient(&conn, "Fantine", "Thenard");
        let f = AppointmentForm {
            ends_at: Some("2024-06-01T08:00".into()),
            ..form(p, None)
        };
        assert!(create_appointment(&conn, &doc, &f).is_err());
    }

    #[test]
    fn nurses_and_patients_cannot_book() {
        let conn = open_memory_database().unwrap();
        let nurse = actor(&conn, Role::Infirmiere);
        let p = fixtures::patient(&conn, "Fantine", "Thenard");
        assert!(matches!(
            create_appointment(&conn, &nurse, &form(p, None)),
            Err(ActionError::Forbidden { .. })
        ));
    }

    #[test]
    fn patient_sees_appointments_of_own_dossier() {
        let conn = open_memory_database().unwrap();
        let doc = actor(&conn, Role::Medecin);
        let me = actor(&conn, Role::Patient);
        assert!(list_appointments(&conn, &me).unwrap().is_empty());

        let fields = crate::models::PatientFields {
            first_name: "Cosette".into(),
            last_name: "Fauchelevent".into(),
            email: None,
            phone: None,
            dob: None,
            gender: crate::models::enums::Gender::Female,
            blood_type: None,
        };
        let dossier = repo::create_patient(&conn, &fields, Some(me.user_id), false).unwrap();
        let stranger = fixtures::patient(&conn, "Autre", "Patient");
        create_appointment(&conn, &doc, &form(dossier, None)).unwrap();
        create_appointment(&conn, &doc, &form(stranger, None)).unwrap();

        let mine = list_appointments(&conn, &me).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].appointment.patient_id, dossier);
    }

    #[test]
    fn only_owner_physician_changes_status() {
        let conn = open_memory_database().unwrap();
        let doc = actor(&conn, Role::Medecin);
        let other = actor(&conn, Role::Medecin);
        let admin = actor(&conn, Role::Admin);
        let p = fixtures::patient(&conn, "Fantine", "Thenard");
        create_appointment(&conn, &doc, &form(p, None)).unwrap();
        let id = list_appointments(&conn, &doc).unwrap()[0].appointment.id;

        let f = AppointmentStatusForm {
            appointment_id: Some(id.to_string()),
            status: Some("completed".into()),
        };
        assert!(matches!(
            update_appointment_status(&conn, &other, &f),
            Err(ActionError::Forbidden { .. })
        ));
        update_appointment_status(&conn, &doc, &f).unwrap();
        let f = AppointmentStatusForm {
            status: Some("cancelled".into()),
            ..f
        };
        update_appointment_status(&conn, &admin, &f).unwrap();
        assert_eq!(
            repo::get_appointment(&conn, &id).unwrap().unwrap().status,
            AppointmentStatus::Cancelled
        );
    }
}
