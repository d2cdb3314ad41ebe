use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// A row of the `profiles` table, keyed by the auth service's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub telephone: Option<String>,
    pub avatar_url: Option<String>,
    pub specialite: Option<String>,
    pub service: Option<String>,
    pub actif: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// "Nom Prénom", falling back to the email, then the id.
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.nom.as_deref().unwrap_or(""),
            self.prenom.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// Setup is complete once both names are filled in.
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.nom) && filled(&self.prenom)
    }
}

/// Fields written by the profile setup form.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub id: Uuid,
    pub email: Option<String>,
    pub nom: String,
    pub prenom: String,
    pub telephone: Option<String>,
    pub avatar_url: Option<String>,
}
