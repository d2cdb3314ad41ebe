use crate::db::repository::LandingStats;
use crate::models::enums::Role;

fn stats_grid(stats: &LandingStats) -> String {
    let tiles = [
        ("Patients", stats.patients),
        ("Hospitalisations", stats.stays),
        ("Soins", stats.soins),
        ("Rendez-vous", stats.appointments),
        ("Notifications", stats.notifications),
    ];
    let inner: String = tiles
        .iter()
        .map(|(label, n)| format!(r#"<div class="stat"><b>{n}</b>{label}</div>"#))
        .collect();
    format!(r#"<div class="stats">{inner}</div>"#)
}

fn quick_links(role: Role) -> Vec<(&'static str, &'static str)> {
    match role {
        Role::Admin => vec![
            ("users", "Gérer les utilisateurs"),
            ("patients", "Créer un dossier patient"),
            ("soins", "Exporter les soins du jour"),
            ("planning", "Planifier une garde"),
        ],
        Role::Medecin => vec![
            ("appointments", "Mon agenda"),
            ("hospitalizations", "Patients hospitalisés"),
            ("soins", "Prescrire un soin"),
        ],
        Role::Infirmiere => vec![
            ("soins", "Mes soins"),
            ("hospitalizations", "Hospitalisations en cours"),
            ("planning", "Mes gardes"),
        ],
        Role::Patient => vec![
            ("dossier", "Compléter mon dossier"),
            ("appointments", "Mes rendez-vous"),
            ("messages", "Écrire à l'équipe soignante"),
        ],
    }
}

/// Public front page.
pub fn public(stats: &LandingStats) -> String {
    format!(
        r#"<h1>Docta</h1>
<p class="muted">Gestion hospitalière: dossiers patients, hospitalisations, soins, rendez-vous et planning des équipes.</p>
{grid}
<p><a href="/auth/login">Se connecter</a> · <a href="/auth/register">Créer un compte</a></p>"#,
        grid = stats_grid(stats),
    )
}

/// Home section of a signed-in role.
pub fn home(role: Role, stats: &LandingStats) -> String {
    let links: String = quick_links(role)
        .into_iter()
        .map(|(page, label)| format!(r#"<li><a href="{}">{label}</a></li>"#, role.section_path(page)))
        .collect();
    format!(
        r#"<h1>Espace {label}</h1>
{grid}
<h2>Accès rapides</h2>
<ul>{links}</ul>"#,
        label = role.label(),
        grid = stats_grid(stats),
    )
}
