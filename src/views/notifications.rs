use uuid::Uuid;

use super::{button_form, choice_options, escape, hidden, options};
use crate::datetime::{display, display_opt};
use crate::models::enums::{NotificationType, Role};
use crate::models::{Notification, Profile};

fn row(viewer: &Uuid, n: &Notification) -> String {
    let action = if n.user_id == *viewer && n.read_at.is_none() {
        button_form(
            "/actions/notifications/read",
            &hidden("notification_id", &n.id),
            "Lu",
            "secondary",
        )
    } else {
        String::new()
    };
    format!(
        r#"<tr><td>{when}</td><td>{kind}</td><td><b>{title}</b><div>{message}</div></td><td>{read}</td><td>{action}</td></tr>"#,
        when = display(&n.created_at),
        kind = n.kind.as_str(),
        title = escape(&n.title),
        message = escape(&n.message),
        read = display_opt(n.read_at.as_ref()),
    )
}

pub fn page(role: Role, viewer: &Uuid, list: &[Notification], users: &[Profile]) -> String {
    let form = if role == Role::Admin {
        let kinds: Vec<&'static str> = NotificationType::ALL.iter().map(|k| k.as_str()).collect();
        format!(
            r#"<h2>Nouvelle notification</h2>
<form method="post" action="/actions/notifications" class="card">
<label>Utilisateur<select name="userId" required><option value="">—</option>{users}</select></label>
<label>Canal<select name="type">{kinds}</select></label>
<label>Titre<input name="title" required></label>
<label>Message<textarea name="message" rows="2" required></textarea></label>
<button type="submit">Envoyer</button>
</form>"#,
            users = options(users.iter().map(|u| (u.id.to_string(), u.display_name())), None),
            kinds = choice_options(&kinds, Some("in_app")),
        )
    } else {
        String::new()
    };
    let rows: String = list.iter().map(|n| row(viewer, n)).collect();
    format!(
        r#"<h1>Notifications</h1>
{form}
<table><thead><tr><th>Date</th><th>Canal</th><th>Contenu</th><th>Lue le</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}
