//! Identity provider access.
//!
//! Sessions and credentials belong to an external GoTrue-compatible service.
//! [`AuthBackend::Local`] is an in-process stand-in used for development and
//! tests; it speaks the same operations.

pub mod local;
pub mod remote;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use local::LocalAuth;
pub use remote::RemoteAuth;

/// The signed-in identity as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identifiants invalides")]
    InvalidCredentials,

    #[error("Un compte existe déjà pour cet email")]
    EmailTaken,

    #[error("Mot de passe trop court (6 caractères minimum)")]
    WeakPassword,

    #[error("Auth service rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Auth service unreachable: {0}")]
    Transport(String),
}

/// Outcome of a registration: the remote service may require email
/// confirmation, in which case no session is opened yet.
#[derive(Debug, Clone)]
pub enum SignUp {
    SignedIn(Session),
    ConfirmationRequired(AuthUser),
}

/// Run a password operation (PBKDF2) off the async workers.
async fn blocking<T, F>(local: &LocalAuth, op: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce(&LocalAuth) -> Result<T, AuthError> + Send + 'static,
{
    let auth = local.clone();
    tokio::task::spawn_blocking(move || op(&auth))
        .await
        .map_err(|e| AuthError::Transport(format!("password task: {e}")))?
}

pub enum AuthBackend {
    Remote(RemoteAuth),
    Local(LocalAuth),
}

impl AuthBackend {
    /// Resolve an access token. `Ok(None)` means the token is unknown or expired.
    pub async fn user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        match self {
            Self::Remote(remote) => remote.user(access_token).await,
            Self::Local(local) => Ok(local.user(access_token)),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self {
            Self::Remote(remote) => remote.sign_in(email, password).await,
            Self::Local(local) => {
                let (email, password) = (email.to_string(), password.to_string());
                blocking(local, move |auth| auth.sign_in(&email, &password)).await
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        match self {
            Self::Remote(remote) => remote.sign_up(email, password).await,
            Self::Local(local) => {
                let (email, password) = (email.to_string(), password.to_string());
                blocking(local, move |auth| auth.sign_up(&email, &password))
                    .await
                    .map(SignUp::SignedIn)
            }
        }
    }

    pub async fn sign_out(&self, access_token: &str) {
        match self {
            Self::Remote(remote) => remote.sign_out(access_token).await,
            Self::Local(local) => local.sign_out(access_token),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_backend_hashes_on_blocking_pool() {
        let backend = AuthBackend::Local(LocalAuth::with_iterations(1_000));
        let created = match backend.sign_up("lea@docta.test", "secret1").await.unwrap() {
            SignUp::SignedIn(session) => session,
            SignUp::ConfirmationRequired(_) => panic!("local sign-up opens a session"),
        };
        let session = backend.sign_in("LEA@docta.test", "secret1").await.unwrap();
        assert_eq!(created.user.id, session.user.id);
        assert_eq!(backend.user(&session.access_token).await.unwrap(), Some(session.user));
        assert!(matches!(
            backend.sign_in("lea@docta.test", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
