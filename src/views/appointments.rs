use super::hospitalizations::patient_options;
use super::{choice_options, escape_opt, hidden, options};
use crate::actions::Actor;
use crate::datetime::{display, display_opt};
use crate::models::enums::{AppointmentStatus, Role};
use crate::models::{AppointmentListing, Patient, Profile};

fn status_values() -> Vec<&'static str> {
    AppointmentStatus::ALL.iter().map(|s| s.as_str()).collect()
}

fn can_update(viewer: &Actor, listing: &AppointmentListing) -> bool {
    match viewer.role {
        Role::Admin => true,
        Role::Medecin => listing.appointment.medecin_id == viewer.user_id,
        _ => false,
    }
}

fn row(viewer: &Actor, listing: &AppointmentListing) -> String {
    let appt = &listing.appointment;
    let status_form = if can_update(viewer, listing) {
        format!(
            r#"<form method="post" action="/actions/appointments/status" class="inline">{id}<select name="status">{statuses}</select><button type="submit" class="secondary">OK</button></form>"#,
            id = hidden("appointment_id", &appt.id),
            statuses = choice_options(&status_values(), Some(appt.status.as_str())),
        )
    } else {
        String::new()
    };
    format!(
        r#"<tr><td>{start}</td><td>{end}</td><td>{patient}</td><td>{medecin}</td><td>{location}</td><td>{reason}</td><td>{label}</td><td>{status_form}</td></tr>"#,
        start = display(&appt.starts_at),
        end = display_opt(appt.ends_at.as_ref()),
        patient = escape_opt(listing.patient_name.as_deref()),
        medecin = escape_opt(listing.medecin_name.as_deref()),
        location = escape_opt(appt.location.as_deref()),
        reason = escape_opt(appt.reason.as_deref()),
        label = appt.status.label(),
    )
}

fn booking_form(viewer: &Actor, patients: &[Patient], medecins: &[Profile]) -> String {
    // a physician always books for themself
    let medecin_field = if viewer.role == Role::Medecin {
        String::new()
    } else {
        format!(
            r#"<label>Médecin<select name="medecinId" required><option value="">—</option>{}</select></label>"#,
            options(medecins.iter().map(|m| (m.id.to_string(), m.display_name())), None)
        )
    };
    format!(
        r#"<h2>Nouveau rendez-vous</h2>
<form method="post" action="/actions/appointments" class="card">
<label>Patient<select name="patientId" required><option value="">—</option>{patients}</select></label>
{medecin_field}
<label>Début<input type="datetime-local" name="startsAt" required></label>
<label>Fin<input type="datetime-local" name="endsAt"></label>
<label>Lieu<input name="location"></label>
<label>Motif<input name="reason"></label>
<button type="submit">Réserver</button>
</form>"#,
        patients = patient_options(patients, None),
    )
}

pub fn page(
    viewer: &Actor,
    appointments: &[AppointmentListing],
    patients: &[Patient],
    medecins: &[Profile],
) -> String {
    let form = match viewer.role {
        Role::Admin | Role::Medecin => booking_form(viewer, patients, medecins),
        _ => String::new(),
    };
    let rows: String = appointments.iter().map(|a| row(viewer, a)).collect();
    format!(
        r#"<h1>Rendez-vous</h1>
{form}
<table><thead><tr><th>Début</th><th>Fin</th><th>Patient</th><th>Médecin</th><th>Lieu</th><th>Motif</th><th>Statut</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::Appointment;

    fn viewer(role: Role) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            email: None,
            role,
        }
    }

    fn listing(medecin_id: Uuid) -> AppointmentListing {
        AppointmentListing {
            appointment: Appointment {
                id: Uuid::new_v4(),
                patient_id: Uuid::new_v4(),
                medecin_id,
                starts_at: Utc::now(),
                ends_at: None,
                location: Some("Salle 3".into()),
                status: AppointmentStatus::Booked,
                reason: None,
                created_at: Utc::now(),
            },
            patient_name: Some("Jean Valjean".into()),
            medecin_name: Some("Bernard Myriel".into()),
        }
    }

    #[test]
    fn physician_updates_only_own_rows() {
        let doc = viewer(Role::Medecin);
        let html = page(&doc, &[listing(doc.user_id)], &[], &[]);
        assert!(html.contains("/actions/appointments/status"));
        assert!(!html.contains(r#"name="medecinId""#));

        let html = page(&doc, &[listing(Uuid::new_v4())], &[], &[]);
        assert!(!html.contains("/actions/appointments/status"));
    }

    #[test]
    fn patients_get_a_read_only_list() {
        let html = page(&viewer(Role::Patient), &[listing(Uuid::new_v4())], &[], &[]);
        assert!(!html.contains("/actions/appointments"));
        assert!(html.contains("Salle 3"));
    }
}
