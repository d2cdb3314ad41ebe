use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{AuthError, AuthUser, Session};

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    id: Uuid,
    email: String,
    salt: [u8; SALT_LENGTH],
    password_hash: [u8; 32],
}

/// In-process identity provider.
///
/// Accounts and sessions live in memory and are lost on restart. Passwords
/// are stored as salted PBKDF2-SHA256; session tokens only as SHA-256 hashes.
/// Clones share the same stores. Key derivation runs outside the locks.
#[derive(Clone)]
pub struct LocalAuth {
    iterations: u32,
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    sessions: Arc<RwLock<HashMap<[u8; 32], Uuid>>>,
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::with_iterations(PBKDF2_ITERATIONS)
    }

    /// Lower work factors are only meant for tests.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            accounts: Arc::default(),
            sessions: Arc::default(),
        }
    }

    fn derive(&self, password: &str, salt: &[u8; SALT_LENGTH]) -> [u8; 32] {
        let mut out = [0u8; 32];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut out);
        out
    }

    fn open_session(&self, user: AuthUser) -> Result<Session, AuthError> {
        let token = generate_token();
        self.sessions
            .write()
            .map_err(|_| AuthError::Transport("session lock".into()))?
            .insert(hash_token(&token), user.id);
        Ok(Session {
            access_token: token,
            user,
        })
    }

    fn account_exists(&self, key: &str) -> Result<bool, AuthError> {
        Ok(self
            .accounts
            .read()
            .map_err(|_| AuthError::Transport("account lock".into()))?
            .contains_key(key))
    }

    pub fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        let key = normalize_email(email);
        if self.account_exists(&key)? {
            return Err(AuthError::EmailTaken);
        }

        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let account = Account {
            id: Uuid::new_v4(),
            email: key.clone(),
            salt,
            password_hash: self.derive(password, &salt),
        };
        let user = AuthUser {
            id: account.id,
            email: Some(account.email.clone()),
        };

        {
            let mut accounts = self
                .accounts
                .write()
                .map_err(|_| AuthError::Transport("account lock".into()))?;
            // a concurrent registration may have won while the hash was derived
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailTaken);
            }
            accounts.insert(key, account);
        }
        tracing::info!(user_id = %user.id, "Local account created");
        self.open_session(user)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let (user, salt, expected) = {
            let accounts = self
                .accounts
                .read()
                .map_err(|_| AuthError::Transport("account lock".into()))?;
            let account = accounts
                .get(&normalize_email(email))
                .ok_or(AuthError::InvalidCredentials)?;
            let user = AuthUser {
                id: account.id,
                email: Some(account.email.clone()),
            };
            (user, account.salt, account.password_hash)
        };
        let candidate = self.derive(password, &salt);
        if candidate.ct_eq(&expected).unwrap_u8() == 0 {
            return Err(AuthError::InvalidCredentials);
        }
        self.open_session(user)
    }

    pub fn user(&self, access_token: &str) -> Option<AuthUser> {
        let id = *self.sessions.read().ok()?.get(&hash_token(access_token))?;
        let accounts = self.accounts.read().ok()?;
        accounts
            .values()
            .find(|a| a.id == id)
            .map(|a| AuthUser {
                id: a.id,
                email: Some(a.email.clone()),
            })
    }

    pub fn sign_out(&self, access_token: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(&hash_token(access_token));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> LocalAuth {
        LocalAuth::with_iterations(1_000)
    }

    #[test]
    fn sign_up_then_sign_in() {
        let auth = auth();
        let created = auth.sign_up("Lea@Docta.test", "secret1").unwrap();
        let session = auth.sign_in("lea@docta.test", "secret1").unwrap();
        assert_eq!(created.user.id, session.user.id);
        assert_ne!(created.access_token, session.access_token);
        assert_eq!(auth.user(&session.access_token).unwrap().email.as_deref(), Some("lea@docta.test"));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let auth = auth();
        auth.sign_up("lea@docta.test", "secret1").unwrap();
        assert!(matches!(auth.sign_in("lea@docta.test", "nope"), Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.sign_in("bob@docta.test", "secret1"), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn duplicate_and_weak_registrations_fail() {
        let auth = auth();
        auth.sign_up("lea@docta.test", "secret1").unwrap();
        assert!(matches!(auth.sign_up("LEA@docta.test", "secret2"), Err(AuthError::EmailTaken)));
        assert!(matches!(auth.sign_up("bob@docta.test", "123"), Err(AuthError::WeakPassword)));
    }

    #[test]
    fn sign_out_revokes_token() {
        let auth = auth();
        let session = auth.sign_up("lea@docta.test", "secret1").unwrap();
        auth.sign_out(&session.access_token);
        assert!(auth.user(&session.access_token).is_none());
        assert!(auth.user("garbage").is_none());
    }

    #[test]
    fn token_hash_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(generate_token().len(), 43);
    }

    #[test]
    fn clones_share_accounts_and_sessions() {
        let auth = auth();
        let other = auth.clone();
        let session = auth.sign_up("lea@docta.test", "secret1").unwrap();
        assert!(other.user(&session.access_token).is_some());
        assert!(matches!(other.sign_up("lea@docta.test", "secret2"), Err(AuthError::EmailTaken)));
    }
}
