//! Form actions.
//!
//! Each action takes the acting user, checks the role, validates the submitted
//! form and performs the write. Success returns the banner message; the web
//! layer turns the outcome into a redirect with `?success=` or `?error=`.

pub mod appointments;
pub mod export;
pub mod hospitalizations;
pub mod messages;
pub mod notifications;
pub mod patients;
pub mod planning;
pub mod soins;
pub mod users;

use rusqlite::ErrorCode;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::rbac::{has_role, STAFF_ROLES};
use crate::validation::ValidationError;

/// The signed-in user performing an action, with the role read from `profiles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl Actor {
    /// Reject unless the actor holds one of `allowed`; the user is sent back
    /// to their own section.
    pub fn require(&self, allowed: &[Role], message: &str) -> Result<(), ActionError> {
        if has_role(Some(self.role), allowed) {
            Ok(())
        } else {
            Err(ActionError::Forbidden {
                message: message.to_string(),
                redirect: self.role.home_path(),
            })
        }
    }

    pub fn require_staff(&self) -> Result<(), ActionError> {
        self.require(STAFF_ROLES, "Accès refusé: rôle staff requis")
    }

    pub fn require_admin(&self, message: &str) -> Result<(), ActionError> {
        self.require(&[Role::Admin], message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{message}")]
    Forbidden { message: String, redirect: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ActionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(message))
    }

    /// Text for the error banner. Storage details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(DatabaseError::NotFound { .. }) => "Élément introuvable".to_string(),
            Self::Database(DatabaseError::ConstraintViolation(msg)) => msg.clone(),
            Self::Database(DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                "Conflit avec un enregistrement existant (email ou téléphone déjà utilisé ?)"
                    .to_string()
            }
            Self::Database(_) => "Erreur de base de données, réessayez.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type ActionResult<T = &'static str> = Result<T, ActionError>;

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::Connection;

    use super::Actor;
    use crate::db::repository::fixtures;
    use crate::models::enums::Role;

    /// A profile row plus the matching actor.
    pub fn actor(conn: &Connection, role: Role) -> Actor {
        let nom = format!("{}{}", role.label(), uuid::Uuid::new_v4().simple());
        let id = fixtures::profile(conn, role, &nom, "Test");
        Actor {
            user_id: id,
            email: None,
            role,
        }
    }
}
