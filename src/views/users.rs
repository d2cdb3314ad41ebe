use uuid::Uuid;

use super::{choice_options, escape_opt, hidden};
use crate::models::enums::Role;
use crate::models::Profile;

fn role_values() -> Vec<&'static str> {
    Role::ALL.iter().map(|r| r.as_str()).collect()
}

/// Admin user directory with the role editor. The admin's own row is read-only.
pub fn page(viewer: &Uuid, profiles: &[Profile]) -> String {
    let rows: String = profiles
        .iter()
        .map(|p| {
            let editor = if p.id == *viewer {
                r#"<span class="muted">vous</span>"#.to_string()
            } else {
                format!(
                    r#"<form method="post" action="/actions/users/role" class="inline">{id}<select name="role">{roles}</select><button type="submit" class="secondary">Changer</button></form>"#,
                    id = hidden("userId", &p.id),
                    roles = choice_options(&role_values(), Some(p.role.as_str())),
                )
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{editor}</td></tr>",
                escape_opt(Some(&p.display_name())),
                escape_opt(p.email.as_deref()),
                escape_opt(p.telephone.as_deref()),
                p.role.label(),
                escape_opt(p.service.as_deref()),
            )
        })
        .collect();
    format!(
        r#"<h1>Utilisateurs</h1>
<table><thead><tr><th>Nom</th><th>Email</th><th>Téléphone</th><th>Rôle</th><th>Service</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

/// Staff preferences: speciality and service.
pub fn preferences(profile: Option<&Profile>) -> String {
    format!(
        r#"<h1>Préférences</h1>
<form method="post" action="/actions/preferences" class="card">
<label>Spécialité<input name="specialite" value="{specialite}"></label>
<label>Service<input name="service" value="{service}"></label>
<button type="submit">Enregistrer</button>
</form>"#,
        specialite = escape_opt(profile.and_then(|p| p.specialite.as_deref())),
        service = escape_opt(profile.and_then(|p| p.service.as_deref())),
    )
}
