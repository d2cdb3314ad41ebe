use super::{button_form, choice_options, escape, escape_opt, hidden, options};
use crate::datetime::{display, display_opt, to_input_value};
use crate::models::enums::{HospitalizationStatus, Role};
use crate::models::Patient;
use crate::stay::{Stay, StayListing, StaySource, StayStatus};

pub(crate) fn patient_options(patients: &[Patient], selected: Option<&str>) -> String {
    options(
        patients.iter().map(|p| (p.id.to_string(), p.full_name())),
        selected,
    )
}

fn status_values() -> Vec<&'static str> {
    HospitalizationStatus::ALL.iter().map(|s| s.as_str()).collect()
}

fn source_label(source: StaySource) -> &'static str {
    match source {
        StaySource::Legacy => "historique",
        StaySource::Current => "actuel",
    }
}

fn row(role: Role, listing: &StayListing) -> String {
    let stay = &listing.stay;
    let id_field = hidden("id", &stay.id);
    let mut actions = format!(
        r#"<a href="{}">Modifier</a> "#,
        role.section_path(&format!("hospitalizations?edit={}", stay.id))
    );
    if stay.status != StayStatus::Discharged {
        actions.push_str(&button_form(
            "/actions/hospitalizations/discharge",
            &id_field,
            "Sortie",
            "secondary",
        ));
    }
    if role == Role::Admin {
        actions.push_str(&button_form(
            "/actions/hospitalizations/delete",
            &id_field,
            "Supprimer",
            "danger",
        ));
    }
    let place = [stay.ward.as_deref(), stay.room.as_deref(), stay.bed.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" / ");
    format!(
        r#"<tr><td>{patient}</td><td>{place}</td><td>{admitted}</td><td>{discharged}</td><td>{status}</td><td class="muted">{source}</td><td>{actions}</td></tr>"#,
        patient = escape_opt(listing.patient_name.as_deref()),
        place = escape(&place),
        admitted = display(&stay.admitted_at),
        discharged = display_opt(stay.discharged_at.as_ref()),
        status = stay.status.label(),
        source = source_label(stay.source),
    )
}

fn edit_form(stay: &Stay) -> String {
    let discharged = stay
        .discharged_at
        .as_ref()
        .map(to_input_value)
        .unwrap_or_default();
    format!(
        r#"<h2>Modifier l'hospitalisation</h2>
<form method="post" action="/actions/hospitalizations/update" class="card">
{id}
<label>Service<input name="ward" value="{ward}"></label>
<label>Chambre<input name="room" value="{room}"></label>
<label>Lit<input name="bed" value="{bed}"></label>
<label>Admission<input type="datetime-local" name="admittedAt" value="{admitted}"></label>
<label>Sortie<input type="datetime-local" name="dischargedAt" value="{discharged}"></label>
<label>Statut<select name="status"><option value="">Inchangé</option>{statuses}</select></label>
<button type="submit">Enregistrer</button>
</form>"#,
        id = hidden("id", &stay.id),
        ward = escape_opt(stay.ward.as_deref()),
        room = escape_opt(stay.room.as_deref()),
        bed = escape_opt(stay.bed.as_deref()),
        admitted = to_input_value(&stay.admitted_at),
        statuses = choice_options(&status_values(), None),
    )
}

/// Stays from both schemas, the admission form and an optional edit form.
pub fn page(role: Role, stays: &[StayListing], patients: &[Patient], editing: Option<&Stay>) -> String {
    let rows: String = stays.iter().map(|s| row(role, s)).collect();
    format!(
        r#"<h1>Hospitalisations</h1>
{edit}
<h2>Nouvelle admission</h2>
<form method="post" action="/actions/hospitalizations" class="card">
<label>Patient<select name="patientId" required><option value="">—</option>{patients}</select></label>
<label>Service<input name="ward"></label>
<label>Chambre<input name="room"></label>
<label>Lit<input name="bed"></label>
<label>Admission<input type="datetime-local" name="admittedAt" required></label>
<label>Sortie<input type="datetime-local" name="dischargedAt"></label>
<label>Statut<select name="status">{statuses}</select></label>
<button type="submit">Admettre</button>
</form>
<table><thead><tr><th>Patient</th><th>Lieu</th><th>Admission</th><th>Sortie</th><th>Statut</th><th>Schéma</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#,
        edit = editing.map(edit_form).unwrap_or_default(),
        patients = patient_options(patients, None),
        statuses = choice_options(&status_values(), Some("active")),
    )
}
