//! Cookie session: the access token issued by the auth service plus a
//! cached role cookie for the navigation shell.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};

use super::error::WebError;
use super::state::AppState;
use crate::actions::Actor;
use crate::auth::AuthUser;
use crate::db::repository as repo;
use crate::models::enums::Role;

pub const ACCESS_COOKIE: &str = "access_token";
pub const ROLE_COOKIE: &str = "role";
pub const LOGIN_PATH: &str = "/auth/login";

/// Value of cookie `name`, across every `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Access token from `Authorization: Bearer` or the session cookie.
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| cookie_value(headers, ACCESS_COOKIE))
}

pub fn set_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// A resolved session. The role always comes from `profiles`, never from
/// the role cookie.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: AuthUser,
    pub actor: Actor,
    pub token: String,
}

/// Look up the request's token with the auth service and attach the stored
/// role. A user without a profile row is treated as a patient.
pub async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Option<Authenticated>, WebError> {
    let Some(token) = access_token(headers) else {
        return Ok(None);
    };
    let user = match state.auth.user(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed");
            return Ok(None);
        }
    };
    let conn = state.open_db()?;
    let role = repo::get_profile(&conn, &user.id)?.map_or(Role::Patient, |p| p.role);
    Ok(Some(Authenticated {
        actor: Actor {
            user_id: user.id,
            email: user.email.clone(),
            role,
        },
        user,
        token: token.to_string(),
    }))
}

/// Reads the session the guard middleware attached. Pages bounce to the
/// login form; `/api/` routes answer 401.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<Authenticated>() {
            return Ok(auth.clone());
        }
        let api = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path())
            .unwrap_or_else(|| parts.uri.path())
            .starts_with("/api/");
        if api {
            Err(WebError::Unauthorized.into_response())
        } else {
            Err(Redirect::to(LOGIN_PATH).into_response())
        }
    }
}
