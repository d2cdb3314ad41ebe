//! Role lookup and role-scoped paths.
//!
//! Roles live in `profiles.role`. Every role owns a top-level section
//! (`/admin`, `/medecin`, `/infirmiere`, `/patient`); the section guard only
//! lets a user into the section matching their profile role.

use std::str::FromStr;

use crate::models::enums::Role;

/// Roles allowed to manage patients, stays and care tasks.
pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Medecin, Role::Infirmiere];

pub fn has_role(role: Option<Role>, allowed: &[Role]) -> bool {
    role.is_some_and(|r| allowed.contains(&r))
}

/// Resolve a stored role string. Case-insensitive; unknown or missing
/// values fall back to the least privileged role.
pub fn role_from_profile(raw: Option<&str>) -> Role {
    raw.map(|r| r.trim().to_lowercase())
        .and_then(|r| Role::from_str(&r).ok())
        .unwrap_or(Role::Patient)
}

impl Role {
    pub fn is_staff(&self) -> bool {
        STAFF_ROLES.contains(self)
    }

    /// Home section of the role, e.g. `/medecin`.
    pub fn home_path(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// Path of a page inside the role's section.
    pub fn section_path(&self, page: &str) -> String {
        format!("/{}/{}", self.as_str(), page.trim_start_matches('/'))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrateur",
            Role::Medecin => "Médecin",
            Role::Infirmiere => "Infirmière",
            Role::Patient => "Patient",
        }
    }
}

/// The protected section a request path belongs to, if any.
///
/// Matches `/{role}` and `/{role}/...` only; `/administration` is not `/admin`.
pub fn section_of(path: &str) -> Option<Role> {
    let first = path.trim_start_matches('/').split('/').next()?;
    Role::from_str(first).ok()
}
