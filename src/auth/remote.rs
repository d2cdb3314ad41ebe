use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, AuthUser, Session, SignUp};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for a GoTrue-compatible auth service (`/auth/v1/*`).
pub struct RemoteAuth {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct UserBody {
    id: Uuid,
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
    user: UserBody,
}

/// `/signup` answers with a session when auto-confirm is on, a bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(TokenBody),
    User(UserBody),
}

impl From<UserBody> for AuthUser {
    fn from(body: UserBody) -> Self {
        AuthUser {
            id: body.id,
            email: body.email,
        }
    }
}

impl From<TokenBody> for Session {
    fn from(body: TokenBody) -> Self {
        Session {
            access_token: body.access_token,
            user: body.user.into(),
        }
    }
}

impl RemoteAuth {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn transport(&self, e: reqwest::Error) -> AuthError {
        if e.is_connect() {
            AuthError::Transport(self.base_url.clone())
        } else {
            AuthError::Transport(e.to_string())
        }
    }

    pub async fn user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s if s.is_success() => {
                let body: UserBody = response.json().await.map_err(|e| self.transport(e))?;
                Ok(Some(body.into()))
            }
            s => Err(AuthError::Rejected {
                status: s.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.url("token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            s if s.is_success() => {
                let body: TokenBody = response.json().await.map_err(|e| self.transport(e))?;
                Ok(body.into())
            }
            s => Err(AuthError::Rejected {
                status: s.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let response = self
            .client
            .post(self.url("signup"))
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("already") {
                return Err(AuthError::EmailTaken);
            }
            if body.contains("password") {
                return Err(AuthError::WeakPassword);
            }
            return Err(AuthError::Rejected { status: status.as_u16(), body });
        }
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: SignUpBody = response.json().await.map_err(|e| self.transport(e))?;
        Ok(match body {
            SignUpBody::Session(token) => SignUp::SignedIn(token.into()),
            SignUpBody::User(user) => SignUp::ConfirmationRequired(user.into()),
        })
    }

    /// Revoke the session server-side. Failures are logged; the cookie is
    /// cleared regardless.
    pub async fn sign_out(&self, access_token: &str) {
        let result = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Auth service logout failed");
        }
    }
}
