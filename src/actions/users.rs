use rusqlite::Connection;
use serde::Deserialize;

use super::{ActionError, ActionResult, Actor};
use crate::auth::AuthUser;
use crate::db::repository::{self as repo, LandingStats};
use crate::models::enums::Role;
use crate::models::{Profile, ProfileDraft};
use crate::validation::{e164_phone, optional, parse_choice, parse_id, required};

pub const PROFILE_SETUP_PATH: &str = "/profile/setup";
pub const POST_LOGIN_PATH: &str = "/post-login";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleForm {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

/// Admin: change another user's role.
pub fn update_user_role(conn: &Connection, actor: &Actor, form: &RoleForm) -> ActionResult {
    if actor.role != Role::Admin {
        return Err(ActionError::Forbidden {
            message: "Accès refusé: admin requis".into(),
            redirect: POST_LOGIN_PATH.into(),
        });
    }
    let user_id = parse_id(form.user_id.as_deref(), "Utilisateur requis")?;
    let role: Role = parse_choice(form.role.as_deref(), "Rôle")?;
    if user_id == actor.user_id {
        return Err(ActionError::validation(
            "Vous ne pouvez pas modifier votre propre rôle",
        ));
    }
    repo::update_role(conn, &user_id, role)?;
    tracing::info!(actor = %actor.user_id, user = %user_id, role = role.as_str(), "Role changed");
    Ok("Rôle mis à jour")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub country_code: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
}

/// First-time setup or edit of the signed-in user's own profile.
///
/// New profiles start as patients; an existing role is preserved. Returns
/// the stored profile so the caller can route to its home section.
pub fn upsert_profile(conn: &Connection, user: &AuthUser, form: &ProfileForm) -> ActionResult<Profile> {
    let nom = required(form.nom.as_deref(), "Le nom est requis")?;
    let prenom = required(form.prenom.as_deref(), "Le prénom est requis")?;
    // a blank phone keeps the stored one
    let telephone = match e164_phone(form.country_code.as_deref(), form.phone_number.as_deref())? {
        Some(phone) => Some(phone),
        None => repo::get_profile(conn, &user.id)?.and_then(|p| p.telephone),
    };
    let draft = ProfileDraft {
        id: user.id,
        email: user.email.clone(),
        nom,
        prenom,
        telephone,
        avatar_url: optional(form.avatar_url.as_deref()),
    };
    let profile = repo::upsert_profile(conn, &draft)?;
    tracing::info!(user = %user.id, role = profile.role.as_str(), "Profile saved");
    Ok(profile)
}

/// Where a freshly signed-in user lands: profile setup until both names are
/// filled in, then their role's home section.
pub fn post_login(conn: &Connection, user: &AuthUser) -> ActionResult<String> {
    let path = match repo::get_profile(conn, &user.id)? {
        Some(profile) if profile.is_complete() => profile.role.home_path(),
        _ => PROFILE_SETUP_PATH.to_string(),
    };
    Ok(path)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesForm {
    pub specialite: Option<String>,
    pub service: Option<String>,
}

/// Staff: speciality and service shown on the staff directory.
pub fn update_preferences(conn: &Connection, actor: &Actor, form: &PreferencesForm) -> ActionResult {
    actor.require_staff()?;
    let specialite = optional(form.specialite.as_deref());
    let service = optional(form.service.as_deref());
    repo::update_preferences(conn, &actor.user_id, specialite.as_deref(), service.as_deref())?;
    Ok("Préférences enregistrées")
}

pub fn list_users(conn: &Connection, actor: &Actor) -> ActionResult<Vec<Profile>> {
    actor.require_admin("Accès refusé: admin requis")?;
    Ok(repo::list_profiles(conn)?)
}

/// Profiles the actor may write to. Patients only reach staff.
pub fn message_recipients(conn: &Connection, actor: &Actor) -> ActionResult<Vec<Profile>> {
    let profiles = repo::list_profiles(conn)?
        .into_iter()
        .filter(|p| p.id != actor.user_id)
        .filter(|p| actor.role.is_staff() || p.role.is_staff())
        .collect();
    Ok(profiles)
}

pub fn profiles_with_role(conn: &Connection, actor: &Actor, role: Role) -> ActionResult<Vec<Profile>> {
    actor.require_staff()?;
    Ok(repo::list_profiles_by_role(conn, role)?)
}

pub fn landing(conn: &Connection) -> ActionResult<LandingStats> {
    Ok(repo::landing_stats(conn)?)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::actions::testing::actor;
    use crate::db::sqlite::open_memory_database;

    fn auth_user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: Some("lea@docta.test".into()),
        }
    }

    fn profile_form() -> ProfileForm {
        ProfileForm {
            nom: Some("Martin".into()),
            prenom: Some("Léa".into()),
            country_code: Some("+33".into()),
            phone_number: Some("6 12 34 56 78".into()),
            avatar_url: None,
        }
    }

    #[test]
    fn setup_then_home() {
        let conn = open_memory_database().unwrap();
        let user = auth_user();
        assert_eq!(post_login(&conn, &user).unwrap(), PROFILE_SETUP_PATH);

        let profile = upsert_profile(&conn, &user, &profile_form()).unwrap();
        assert_eq!(profile.role, Role::Patient);
        assert_eq!(profile.telephone.as_deref(), Some("+33612345678"));
        assert_eq!(post_login(&conn, &user).unwrap(), "/patient");
    }

    #[test]
    fn profile_requires_names_and_valid_phone() {
        let conn = open_memory_database().unwrap();
        let user = auth_user();
        let form = ProfileForm {
            prenom: None,
            ..profile_form()
        };
        assert_eq!(
            upsert_profile(&conn, &user, &form).unwrap_err().user_message(),
            "Le prénom est requis"
        );
        let form = ProfileForm {
            phone_number: Some("12".into()),
            ..profile_form()
        };
        assert_eq!(
            upsert_profile(&conn, &user, &form).unwrap_err().user_message(),
            "Numéro de téléphone invalide"
        );
    }

    #[test]
    fn resubmitting_setup_keeps_an_assigned_role() {
        let conn = open_memory_database().unwrap();
        let admin = actor(&conn, Role::Admin);
        let user = auth_user();
        upsert_profile(&conn, &user, &profile_form()).unwrap();
        let form = RoleForm {
            user_id: Some(user.id.to_string()),
            role: Some("medecin".into()),
        };
        assert_eq!(update_user_role(&conn, &admin, &form).unwrap(), "Rôle mis à jour");
        let profile = upsert_profile(&conn, &user, &profile_form()).unwrap();
        assert_eq!(profile.role, Role::Medecin);
        assert_eq!(post_login(&conn, &user).unwrap(), "/medecin");
    }

    #[test]
    fn role_changes_are_admin_only_and_not_on_self() {
        let conn = open_memory_database().unwrap();
        let admin = actor(&conn, Role::Admin);
        let doc = actor(&conn, Role::Medecin);
        let form = RoleForm {
            user_id: Some(doc.user_id.to_string()),
            role: Some("admin".into()),
        };
        match update_user_role(&conn, &doc, &form) {
            Err(ActionError::Forbidden { redirect, .. }) => assert_eq!(redirect, POST_LOGIN_PATH),
            other => panic!("expected forbidden, got {other:?}"),
        }
        let own = RoleForm {
            user_id: Some(admin.user_id.to_string()),
            role: Some("patient".into()),
        };
        assert!(update_user_role(&conn, &admin, &own).is_err());
    }

    #[test]
    fn preferences_are_staff_only() {
        let conn = open_memory_database().unwrap();
        let doc = actor(&conn, Role::Medecin);
        let me = actor(&conn, Role::Patient);
        let form = PreferencesForm {
            specialite: Some("Cardiologie".into()),
            service: Some("  ".into()),
        };
        update_preferences(&conn, &doc, &form).unwrap();
        let profile = repo::get_profile(&conn, &doc.user_id).unwrap().unwrap();
        assert_eq!(profile.specialite.as_deref(), Some("Cardiologie"));
        assert_eq!(profile.service, None);
        assert!(matches!(
            update_preferences(&conn, &me, &form),
            Err(ActionError::Forbidden { .. })
        ));
    }

    #[test]
    fn patients_only_message_staff() {
        let conn = open_memory_database().unwrap();
        let me = actor(&conn, Role::Patient);
        let other = actor(&conn, Role::Patient);
        let doc = actor(&conn, Role::Medecin);
        let ids: Vec<Uuid> = message_recipients(&conn, &me).unwrap().iter().map(|p| p.id).collect();
        assert!(ids.contains(&doc.user_id));
        assert!(!ids.contains(&other.user_id));
        assert!(!ids.contains(&me.user_id));
    }
}
