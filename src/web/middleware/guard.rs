//! Session resolution and section gating.
//!
//! Every request outside [`SESSIONLESS`] gets its session resolved once and
//! attached as [`Authenticated`]. Requests under `/{role}` additionally need
//! a session whose stored role matches the section; anyone else is sent home.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::rbac::section_of;
use crate::web::session::{self, Authenticated, LOGIN_PATH};
use crate::web::state::AppState;

/// Routes that never read a session. Their `Authorization` header, if any,
/// carries no access token and is never forwarded to the auth service.
pub const SESSIONLESS: &[&str] = &["/health", "/api/messages/cleanup", "/auth/login", "/auth/register"];

pub fn needs_session(path: &str) -> bool {
    !SESSIONLESS.contains(&path.trim_end_matches('/'))
}

pub async fn guard(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if !needs_session(req.uri().path()) {
        return next.run(req).await;
    }

    let session = match session::resolve(&state, req.headers()).await {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    if let Some(section) = section_of(req.uri().path()) {
        match &session {
            None => return Redirect::to(LOGIN_PATH).into_response(),
            Some(Authenticated { actor, .. }) if actor.role != section => {
                tracing::info!(
                    user = %actor.user_id,
                    role = actor.role.as_str(),
                    section = section.as_str(),
                    "Section access redirected"
                );
                return Redirect::to(&actor.role.home_path()).into_response();
            }
            Some(_) => {}
        }
    }

    if let Some(auth) = session {
        req.extensions_mut().insert(auth);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_endpoints_skip_session_lookup() {
        assert!(!needs_session("/health"));
        assert!(!needs_session("/api/messages/cleanup"));
        assert!(!needs_session("/auth/login"));
        assert!(!needs_session("/auth/register/"));
    }

    #[test]
    fn pages_actions_and_api_resolve_sessions() {
        assert!(needs_session("/"));
        assert!(needs_session("/admin"));
        assert!(needs_session("/actions/patients"));
        assert!(needs_session("/api/hospitalizations"));
        assert!(needs_session("/auth/logout"));
        assert!(needs_session("/post-login"));
    }
}
