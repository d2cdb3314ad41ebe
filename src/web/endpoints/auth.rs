//! Sign-in, registration, sign-out and profile setup.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::actions::ActionError;
use crate::actions::users::{self, ProfileForm, POST_LOGIN_PATH, PROFILE_SETUP_PATH};
use crate::auth::{AuthError, Session, SignUp};
use crate::db::repository as repo;
use crate::views::{self, Flash};
use crate::web::redirect::{failure, with_flash};
use crate::web::session::{clear_cookie, set_cookie, Authenticated, ACCESS_COOKIE, LOGIN_PATH, ROLE_COOKIE};
use crate::web::state::AppState;

const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Banner text for an auth failure. Service faults are logged, not shown.
fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::Rejected { .. } | AuthError::Transport(_) => {
            tracing::error!(error = %err, "Auth service call failed");
            "Service d'authentification indisponible, réessayez.".to_string()
        }
        other => other.to_string(),
    }
}

fn signed_in(session: &Session) -> Response {
    tracing::info!(user = %session.user.id, "User signed in");
    (
        AppendHeaders([(SET_COOKIE, set_cookie(ACCESS_COOKIE, &session.access_token))]),
        Redirect::to(POST_LOGIN_PATH),
    )
        .into_response()
}

pub async fn login_page(Query(flash): Query<Flash>) -> Html<String> {
    Html(views::layout("Connexion", None, &flash, &views::auth::login()))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Redirect::to(&with_flash(LOGIN_PATH, "error", "Email et mot de passe requis")).into_response();
    }
    match state.auth.sign_in(email, &form.password).await {
        Ok(session) => signed_in(&session),
        Err(err) => Redirect::to(&with_flash(LOGIN_PATH, "error", &auth_message(&err))).into_response(),
    }
}

pub async fn register_page(Query(flash): Query<Flash>) -> Html<String> {
    Html(views::layout("Inscription", None, &flash, &views::auth::register()))
}

pub async fn register(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Redirect::to(&with_flash(REGISTER_PATH, "error", "Email et mot de passe requis")).into_response();
    }
    match state.auth.sign_up(email, &form.password).await {
        Ok(SignUp::SignedIn(session)) => signed_in(&session),
        Ok(SignUp::ConfirmationRequired(user)) => {
            tracing::info!(user = %user.id, "Registration awaiting email confirmation");
            Redirect::to(&with_flash(
                LOGIN_PATH,
                "success",
                "Compte créé. Confirmez votre email puis connectez-vous.",
            ))
            .into_response()
        }
        Err(err) => Redirect::to(&with_flash(REGISTER_PATH, "error", &auth_message(&err))).into_response(),
    }
}

pub async fn logout(State(state): State<AppState>, auth: Option<Authenticated>) -> Response {
    if let Some(auth) = auth {
        state.auth.sign_out(&auth.token).await;
        tracing::info!(user = %auth.user.id, "User signed out");
    }
    (
        AppendHeaders([
            (SET_COOKIE, clear_cookie(ACCESS_COOKIE)),
            (SET_COOKIE, clear_cookie(ROLE_COOKIE)),
        ]),
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

/// Route a fresh session to profile setup or to its home section.
pub async fn post_login(State(state): State<AppState>, auth: Authenticated) -> Response {
    let target = state
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| users::post_login(&conn, &auth.user));
    match target {
        Ok(path) => Redirect::to(&path).into_response(),
        Err(err) => failure(LOGIN_PATH, err).into_response(),
    }
}

pub async fn profile_page(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
) -> Response {
    let profile = state
        .open_db()
        .and_then(|conn| repo::get_profile(&conn, &auth.user.id));
    match profile {
        Ok(profile) => Html(views::layout(
            "Mon profil",
            Some(&auth.actor),
            &flash,
            &views::auth::profile_setup(profile.as_ref()),
        ))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Profile load failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::error_page(Some(&auth.actor), "Profil indisponible")),
            )
                .into_response()
        }
    }
}

/// Save the profile, refresh the role cookie and go home.
pub async fn save_profile(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<ProfileForm>,
) -> Response {
    let saved = state
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| users::upsert_profile(&conn, &auth.user, &form));
    match saved {
        Ok(profile) => (
            AppendHeaders([(SET_COOKIE, set_cookie(ROLE_COOKIE, profile.role.as_str()))]),
            Redirect::to(&with_flash(&profile.role.home_path(), "success", "Profil enregistré")),
        )
            .into_response(),
        Err(err) => failure(PROFILE_SETUP_PATH, err).into_response(),
    }
}
