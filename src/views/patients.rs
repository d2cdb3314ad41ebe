use super::{button_form, choice_options, escape, escape_opt, hidden, options};
use crate::datetime::display;
use crate::models::enums::{BloodType, Gender, Role};
use crate::models::{Patient, Profile, Soin};
use crate::stay::Stay;

fn values<T: Copy>(all: &[T], as_str: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(as_str).collect()
}

/// The dossier inputs shared by the staff and self-service forms.
fn dossier_fields(patient: Option<&Patient>) -> String {
    let gender = patient.and_then(|p| p.gender).map(|g| g.as_str());
    let blood = patient.and_then(|p| p.blood_type).map(|b| b.as_str());
    let dob = patient
        .and_then(|p| p.dob)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        r#"<label>Prénom<input name="firstName" required value="{first}"></label>
<label>Nom<input name="lastName" required value="{last}"></label>
<label>Email<input name="email" type="email" value="{email}"></label>
<label>Téléphone<input name="phone" value="{phone}"></label>
<label>Date de naissance<input name="dob" type="date" value="{dob}"></label>
<label>Genre<select name="gender" required><option value="">—</option>{genders}</select></label>
<label>Groupe sanguin<select name="bloodType"><option value="">—</option>{bloods}</select></label>"#,
        first = escape_opt(patient.map(|p| p.first_name.as_str())),
        last = escape_opt(patient.map(|p| p.last_name.as_str())),
        email = escape_opt(patient.and_then(|p| p.email.as_deref())),
        phone = escape_opt(patient.and_then(|p| p.phone.as_deref())),
        genders = choice_options(&values(Gender::ALL, Gender::as_str), gender),
        bloods = choice_options(&values(BloodType::ALL, BloodType::as_str), blood),
    )
}

fn row(role: Role, p: &Patient) -> String {
    let id_field = hidden("patient_id", &p.id);
    let delete = if role == Role::Admin {
        button_form("/actions/patients/delete", &id_field, "Supprimer", "danger")
    } else {
        String::new()
    };
    format!(
        r#"<tr><td>{name}</td><td>{email}</td><td>{phone}</td><td>{linked}</td><td><a href="{edit}">Modifier</a> {delete}</td></tr>"#,
        name = escape(&p.full_name()),
        email = escape_opt(p.email.as_deref()),
        phone = escape_opt(p.phone.as_deref()),
        linked = if p.user_id.is_some() { "Compte lié" } else { "—" },
        edit = role.section_path(&format!("patients?edit={}", p.id)),
    )
}

/// Staff patient list with search, the create/link form and, when
/// `editing` is set, the edit form for that dossier.
pub fn page(
    role: Role,
    patients: &[Patient],
    query: Option<&str>,
    accounts: &[Profile],
    editing: Option<&Patient>,
) -> String {
    let rows: String = patients.iter().map(|p| row(role, p)).collect();
    let account_options = options(
        accounts
            .iter()
            .map(|a| (a.id.to_string(), a.email.as_deref().unwrap_or("sans email"))),
        None,
    );
    let edit_form = editing
        .map(|p| {
            format!(
                r#"<h2>Modifier {name}</h2>
<form method="post" action="/actions/patients/update" class="card">{id}{fields}<button type="submit">Enregistrer</button></form>"#,
                name = escape(&p.full_name()),
                id = hidden("patient_id", &p.id),
                fields = dossier_fields(Some(p)),
            )
        })
        .unwrap_or_default();
    format!(
        r#"<h1>Patients</h1>
<form method="get" action="{search}" class="card">
<label>Recherche<input name="q" value="{q}" placeholder="Nom, email ou téléphone"></label>
<button type="submit" class="secondary">Rechercher</button>
</form>
{edit_form}
<h2>Nouveau dossier</h2>
<form method="post" action="/actions/patients" class="card">
{fields}
<label>Lier au compte<select name="user_id"><option value="">Aucun</option>{account_options}</select></label>
<button type="submit">Créer ou lier</button>
</form>
<table><thead><tr><th>Patient</th><th>Email</th><th>Téléphone</th><th>Compte</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#,
        search = role.section_path("patients"),
        q = escape_opt(query),
        fields = dossier_fields(None),
    )
}

/// Self-service dossier for the patient role.
pub fn dossier(patient: Option<&Patient>, stays: &[Stay], soins: &[Soin]) -> String {
    let notice = match patient {
        Some(p) if p.managed_by_staff => {
            r#"<p class="muted">Ce dossier est géré par l'équipe soignante; contactez-la pour le modifier.</p>"#
        }
        Some(_) => "",
        None => r#"<p class="muted">Vous n'avez pas encore de dossier. Complétez le formulaire ci-dessous.</p>"#,
    };
    let stay_rows: String = stays
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_opt(s.ward.as_deref()),
                display(&s.admitted_at),
                s.status.label()
            )
        })
        .collect();
    let soin_rows: String = soins
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&s.title),
                display(&s.scheduled_at),
                s.status.label()
            )
        })
        .collect();
    format!(
        r#"<h1>Mon dossier</h1>
{notice}
<form method="post" action="/actions/patients/self" class="card">{fields}<button type="submit">Enregistrer</button></form>
<h2>Hospitalisations</h2>
<table><thead><tr><th>Service</th><th>Admission</th><th>Statut</th></tr></thead><tbody>{stay_rows}</tbody></table>
<h2>Soins</h2>
<table><thead><tr><th>Soin</th><th>Prévu le</th><th>Statut</th></tr></thead><tbody>{soin_rows}</tbody></table>"#,
        fields = dossier_fields(patient),
    )
}
