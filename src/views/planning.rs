use super::{button_form, escape_opt, hidden, options};
use crate::datetime::display;
use crate::models::enums::Role;
use crate::models::{Profile, ShiftListing};

pub fn page(role: Role, shifts: &[ShiftListing], staff: &[Profile]) -> String {
    let admin = role == Role::Admin;
    let rows: String = shifts
        .iter()
        .map(|s| {
            let delete = if admin {
                button_form(
                    "/actions/planning/delete",
                    &hidden("shift_id", &s.shift.id),
                    "Supprimer",
                    "danger",
                )
            } else {
                String::new()
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{delete}</td></tr>",
                escape_opt(s.user_name.as_deref()),
                s.shift.role.label(),
                display(&s.shift.starts_at),
                display(&s.shift.ends_at),
            )
        })
        .collect();
    let form = if admin {
        format!(
            r#"<h2>Nouvelle garde</h2>
<form method="post" action="/actions/planning" class="card">
<label>Membre du personnel<select name="userId" required><option value="">—</option>{staff}</select></label>
<label>Début<input type="datetime-local" name="startsAt" required></label>
<label>Fin<input type="datetime-local" name="endsAt" required></label>
<button type="submit">Planifier</button>
</form>"#,
            staff = options(
                staff
                    .iter()
                    .filter(|p| p.role.is_staff())
                    .map(|p| (p.id.to_string(), format!("{} ({})", p.display_name(), p.role.label()))),
                None,
            ),
        )
    } else {
        String::new()
    };
    format!(
        r#"<h1>Planning</h1>
{form}
<table><thead><tr><th>Personnel</th><th>Rôle</th><th>Début</th><th>Fin</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}
