//! Server-rendered HTML.
//!
//! Pages are plain `format!` templates. Every value coming from the database
//! or the query string goes through [`escape`] before it reaches the markup.

pub mod appointments;
pub mod auth;
pub mod hospitalizations;
pub mod landing;
pub mod messages;
pub mod notifications;
pub mod patients;
pub mod planning;
pub mod soins;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

use crate::actions::Actor;
use crate::models::enums::Role;

/// `?success=` / `?error=` banner state carried by redirects.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(message.into()),
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn escape_opt(raw: Option<&str>) -> String {
    raw.map(escape).unwrap_or_default()
}

/// `<option>` list; `selected` is compared against each value.
pub(crate) fn options<I, L>(items: I, selected: Option<&str>) -> String
where
    I: IntoIterator<Item = (String, L)>,
    L: AsRef<str>,
{
    items
        .into_iter()
        .map(|(value, label)| {
            let mark = if selected == Some(value.as_str()) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{mark}>{}</option>"#,
                escape(&value),
                escape(label.as_ref())
            )
        })
        .collect()
}

/// Options for a vocabulary enum, labelled by its stored value.
pub(crate) fn choice_options(values: &[&'static str], selected: Option<&str>) -> String {
    options(values.iter().map(|v| (v.to_string(), *v)), selected)
}

/// Hidden form field.
pub(crate) fn hidden(name: &str, value: &Uuid) -> String {
    format!(r#"<input type="hidden" name="{name}" value="{value}">"#)
}

/// A one-button POST form, used for row actions.
pub(crate) fn button_form(action: &str, fields: &str, label: &str, class: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="inline">{fields}<button type="submit" class="{class}">{label}</button></form>"#
    )
}

fn nav_links(role: Role) -> Vec<(&'static str, &'static str)> {
    let mut links = vec![("", "Accueil")];
    match role {
        Role::Patient => links.extend([
            ("dossier", "Mon dossier"),
            ("appointments", "Rendez-vous"),
        ]),
        staff => {
            links.extend([
                ("patients", "Patients"),
                ("hospitalizations", "Hospitalisations"),
                ("soins", "Soins"),
                ("appointments", "Rendez-vous"),
                ("planning", "Planning"),
            ]);
            if staff == Role::Admin {
                links.push(("users", "Utilisateurs"));
            } else {
                links.push(("preferences", "Préférences"));
            }
        }
    }
    links.extend([("messages", "Messages"), ("notifications", "Notifications")]);
    links
}

fn navigation(viewer: Option<&Actor>) -> String {
    let Some(actor) = viewer else {
        return r#"<nav><a href="/">Docta</a><span class="spacer"></span><a href="/auth/login">Connexion</a><a href="/auth/register">Inscription</a></nav>"#.to_string();
    };
    let links: String = nav_links(actor.role)
        .into_iter()
        .map(|(page, label)| {
            let href = if page.is_empty() {
                actor.role.home_path()
            } else {
                actor.role.section_path(page)
            };
            format!(r#"<a href="{href}">{label}</a>"#)
        })
        .collect();
    format!(
        r#"<nav><a href="/">Docta</a>{links}<span class="spacer"></span><span class="who">{who} · {role}</span><a href="/profile/setup">Profil</a><form method="post" action="/auth/logout" class="inline"><button type="submit" class="link">Déconnexion</button></form></nav>"#,
        who = escape_opt(actor.email.as_deref()),
        role = actor.role.label(),
    )
}

fn banner(flash: &Flash) -> String {
    let mut out = String::new();
    if let Some(msg) = flash.success.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(&format!(r#"<div class="flash success">{}</div>"#, escape(msg)));
    }
    if let Some(msg) = flash.error.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(&format!(r#"<div class="flash error">{}</div>"#, escape(msg)));
    }
    out
}

/// Wrap a page body with the document shell, navigation and banner.
pub fn layout(title: &str, viewer: Option<&Actor>, flash: &Flash, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Docta</title>
<style>
*,*::before,*::after{{box-sizing:border-box}}
body{{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f8fafc;color:#0f172a}}
nav{{display:flex;gap:16px;align-items:center;padding:12px 24px;background:#0f766e;flex-wrap:wrap}}
nav a,nav .who,nav button.link{{color:#fff;text-decoration:none;font-size:.9rem}}
nav .spacer{{flex:1}}
main{{max-width:1100px;margin:0 auto;padding:24px}}
h1{{font-size:1.5rem;margin:0 0 16px}}
h2{{font-size:1.1rem;margin:24px 0 8px}}
table{{width:100%;border-collapse:collapse;background:#fff;font-size:.9rem}}
th,td{{padding:8px;border-bottom:1px solid #e2e8f0;text-align:left;vertical-align:top}}
form.card{{background:#fff;border-radius:12px;padding:16px;display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:12px;margin-bottom:16px}}
form.inline{{display:inline}}
label{{display:flex;flex-direction:column;font-size:.8rem;color:#475569;gap:4px}}
input,select,textarea{{padding:8px;border:1px solid #cbd5e1;border-radius:8px;font-size:.9rem}}
button{{padding:8px 14px;border:none;border-radius:8px;background:#0f766e;color:#fff;cursor:pointer}}
button.danger{{background:#b91c1c}}
button.secondary{{background:#e2e8f0;color:#0f172a}}
button.link{{background:none;padding:0}}
.flash{{padding:12px 16px;border-radius:8px;margin-bottom:16px}}
.flash.success{{background:#dcfce7;color:#166534}}
.flash.error{{background:#fee2e2;color:#991b1b}}
.stats{{display:grid;grid-template-columns:repeat(auto-fill,minmax(160px,1fr));gap:12px}}
.stat{{background:#fff;border-radius:12px;padding:16px}}
.stat b{{display:block;font-size:1.6rem}}
.muted{{color:#64748b}}
</style>
</head>
<body>
{nav}
<main>
{banner}
{body}
</main>
</body>
</html>"##,
        title = escape(title),
        nav = navigation(viewer),
        banner = banner(flash),
    )
}

/// Full page for a failure that cannot be redirected anywhere useful.
pub fn error_page(viewer: Option<&Actor>, message: &str) -> String {
    layout(
        "Erreur",
        viewer,
        &Flash::error(message),
        r#"<p><a href="/">Retour à l'accueil</a></p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("l'hôpital"), "l&#39;hôpital");
    }

    #[test]
    fn layout_shows_escaped_banner() {
        let flash = Flash {
            success: Some("<b>ok</b>".into()),
            error: None,
        };
        let html = layout("Patients", None, &flash, "<p>corps</p>");
        assert!(html.contains("&lt;b&gt;ok&lt;/b&gt;"));
        assert!(html.contains("<p>corps</p>"));
        assert!(html.contains("/auth/login"));
    }

    #[test]
    fn navigation_follows_role() {
        let admin = Actor {
            user_id: Uuid::new_v4(),
            email: Some("admin@docta.test".into()),
            role: Role::Admin,
        };
        let html = layout("Accueil", Some(&admin), &Flash::default(), "");
        assert!(html.contains(r#"href="/admin/users""#));
        assert!(!html.contains("/admin/dossier"));

        let patient = Actor {
            role: Role::Patient,
            ..admin
        };
        let html = layout("Accueil", Some(&patient), &Flash::default(), "");
        assert!(html.contains(r#"href="/patient/dossier""#));
        assert!(!html.contains("/patient/soins"));
    }

    #[test]
    fn options_mark_selected() {
        let html = choice_options(&["active", "planned"], Some("planned"));
        assert!(html.contains(r#"<option value="planned" selected>"#));
        assert!(html.contains(r#"<option value="active">"#));
    }
}
