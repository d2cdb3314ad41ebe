use super::hospitalizations::patient_options;
use super::{button_form, choice_options, escape, escape_opt, hidden, options};
use crate::datetime::display;
use crate::models::enums::{Role, SoinStatus};
use crate::models::{Patient, Profile, SoinListing};

fn status_values() -> Vec<&'static str> {
    SoinStatus::ALL.iter().map(|s| s.as_str()).collect()
}

fn nurse_options(nurses: &[Profile]) -> String {
    options(nurses.iter().map(|n| (n.id.to_string(), n.display_name())), None)
}

fn row(role: Role, listing: &SoinListing, nurses: &[Profile]) -> String {
    let soin = &listing.soin;
    let nurse = soin
        .assigned_to_nurse_id
        .and_then(|id| nurses.iter().find(|n| n.id == id))
        .map(|n| escape(&n.display_name()))
        .unwrap_or_else(|| "—".to_string());
    let status_form = format!(
        r#"<form method="post" action="/actions/soins/status" class="inline">{id}<select name="status">{statuses}</select><button type="submit" class="secondary">OK</button></form>"#,
        id = hidden("soin_id", &soin.id),
        statuses = choice_options(&status_values(), Some(soin.status.as_str())),
    );
    let delete = if role == Role::Admin {
        button_form("/actions/soins/delete", &hidden("soin_id", &soin.id), "Supprimer", "danger")
    } else {
        String::new()
    };
    format!(
        r#"<tr><td>{when}</td><td>{patient}</td><td>{title}<div class="muted">{kind}</div></td><td>{desc}</td><td>{nurse}</td><td>{label}</td><td>{status_form} {delete}</td></tr>"#,
        when = display(&soin.scheduled_at),
        patient = escape_opt(listing.patient_name.as_deref()),
        title = escape(&soin.title),
        kind = escape(&soin.type_soin),
        desc = escape_opt(soin.description.as_deref()),
        label = soin.status.label(),
    )
}

fn export_form(nurses: &[Profile]) -> String {
    format!(
        r#"<h2>Export CSV</h2>
<form method="get" action="/admin/soins/export" class="card">
<label>Jour<input type="date" name="date" required></label>
<label>Infirmière<select name="nurse_id"><option value="">Toutes</option>{nurses}</select></label>
<button type="submit" class="secondary">Télécharger</button>
</form>"#,
        nurses = nurse_options(nurses),
    )
}

/// Care tasks in schedule order. Nurses only receive their own rows.
pub fn page(role: Role, soins: &[SoinListing], patients: &[Patient], nurses: &[Profile]) -> String {
    let rows: String = soins.iter().map(|s| row(role, s, nurses)).collect();
    let export = if role == Role::Admin {
        export_form(nurses)
    } else {
        String::new()
    };
    format!(
        r#"<h1>Soins</h1>
<h2>Planifier un soin</h2>
<form method="post" action="/actions/soins" class="card">
<label>Patient<select name="patientId" required><option value="">—</option>{patients}</select></label>
<label>Titre<input name="title" required></label>
<label>Type de soin<input name="typeSoin" placeholder="Injection, pansement..."></label>
<label>Prévu le<input type="datetime-local" name="scheduledAt" required></label>
<label>Infirmière<select name="assignedToNurseId"><option value="">Non assigné</option>{nurses}</select></label>
<label>Description<textarea name="description" rows="2"></textarea></label>
<button type="submit">Planifier</button>
</form>
{export}
<table><thead><tr><th>Prévu le</th><th>Patient</th><th>Soin</th><th>Description</th><th>Infirmière</th><th>Statut</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#,
        patients = patient_options(patients, None),
        nurses = nurse_options(nurses),
    )
}
