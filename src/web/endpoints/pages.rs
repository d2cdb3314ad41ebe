//! Server-rendered pages. The same router is mounted under every role
//! section; the guard has already checked the section against the role.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::actions::{
    appointments, hospitalizations, messages, notifications, patients, planning, soins, users,
    ActionError, ActionResult, Actor,
};
use crate::db::repository as repo;
use crate::models::enums::Role;
use crate::views::{self, Flash};
use crate::web::redirect::failure;
use crate::web::session::Authenticated;
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientsQuery {
    pub q: Option<String>,
    pub edit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditQuery {
    pub edit: Option<String>,
}

/// Build a page body with a fresh connection and wrap it in the layout.
/// Refusals redirect home with a banner; anything else renders an error page.
fn render<F>(state: &AppState, auth: &Authenticated, flash: &Flash, title: &str, build: F) -> Response
where
    F: FnOnce(&Connection, &Actor) -> ActionResult<String>,
{
    let body = state
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| build(&conn, &auth.actor));
    match body {
        Ok(body) => Html(views::layout(title, Some(&auth.actor), flash, &body)).into_response(),
        Err(err @ ActionError::Forbidden { .. }) => {
            failure(&auth.actor.role.home_path(), err).into_response()
        }
        Err(err) => {
            let status = match err {
                ActionError::NotFound(_) => StatusCode::NOT_FOUND,
                ActionError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => {
                    tracing::error!(error = %err, title, "Page failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let page = views::error_page(Some(&auth.actor), &err.user_message());
            (status, Html(page)).into_response()
        }
    }
}

/// Public front page; signed-in users go to their section.
pub async fn landing(State(state): State<AppState>, auth: Option<Authenticated>) -> Response {
    if let Some(auth) = auth {
        return Redirect::to(&auth.actor.role.home_path()).into_response();
    }
    let stats = state
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| users::landing(&conn));
    match stats {
        Ok(stats) => Html(views::layout("Accueil", None, &Flash::default(), &views::landing::public(&stats)))
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Landing stats failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error_page(None, &err.user_message()))).into_response()
        }
    }
}

pub async fn home(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, auth.actor.role.label(), |conn, actor| {
        Ok(views::landing::home(actor.role, &users::landing(conn)?))
    })
}

pub async fn patients(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
    Query(query): Query<PatientsQuery>,
) -> Response {
    render(&state, &auth, &flash, "Patients", |conn, actor| {
        let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let list = patients::search_patients(conn, actor, q)?;
        let accounts = users::profiles_with_role(conn, actor, Role::Patient)?;
        let editing = match query.edit.as_deref().map(Uuid::parse_str) {
            Some(Ok(id)) => Some(patients::get_patient(conn, actor, &id)?),
            Some(Err(_)) => return Err(ActionError::validation("Patient ID invalide")),
            None => None,
        };
        Ok(views::patients::page(actor.role, &list, q, &accounts, editing.as_ref()))
    })
}

pub async fn dossier(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, "Mon dossier", |conn, actor| {
        let patient = patients::own_dossier(conn, actor)?;
        let (stays, soins) = patients::own_care(conn, actor)?;
        Ok(views::patients::dossier(patient.as_ref(), &stays, &soins))
    })
}

pub async fn hospitalizations(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
    Query(query): Query<EditQuery>,
) -> Response {
    render(&state, &auth, &flash, "Hospitalisations", |conn, actor| {
        let stays = hospitalizations::list_hospitalizations(conn, actor)?;
        let patient_list = patients::patient_choices(conn, actor)?;
        let editing = match query.edit.as_deref() {
            Some(id) => Some(hospitalizations::get_hospitalization(conn, actor, id)?),
            None => None,
        };
        Ok(views::hospitalizations::page(actor.role, &stays, &patient_list, editing.as_ref()))
    })
}

pub async fn soins(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, "Soins", |conn, actor| {
        let list = soins::list_soins(conn, actor)?;
        let patient_list = patients::patient_choices(conn, actor)?;
        let nurses = users::profiles_with_role(conn, actor, Role::Infirmiere)?;
        Ok(views::soins::page(actor.role, &list, &patient_list, &nurses))
    })
}

pub async fn appointments(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
) -> Response {
    render(&state, &auth, &flash, "Rendez-vous", |conn, actor| {
        let list = appointments::list_appointments(conn, actor)?;
        let (patient_list, medecins) = match actor.role {
            Role::Admin | Role::Medecin => (
                patients::patient_choices(conn, actor)?,
                users::profiles_with_role(conn, actor, Role::Medecin)?,
            ),
            _ => (Vec::new(), Vec::new()),
        };
        Ok(views::appointments::page(actor, &list, &patient_list, &medecins))
    })
}

pub async fn messages(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, "Messages", |conn, actor| {
        let inbox = messages::list_inbox(conn, actor)?;
        let recipients = users::message_recipients(conn, actor)?;
        Ok(views::messages::page(&actor.user_id, &inbox, &recipients))
    })
}

pub async fn notifications(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
) -> Response {
    render(&state, &auth, &flash, "Notifications", |conn, actor| {
        let list = notifications::list_notifications(conn, actor)?;
        let targets = if actor.role == Role::Admin {
            users::list_users(conn, actor)?
        } else {
            Vec::new()
        };
        Ok(views::notifications::page(actor.role, &actor.user_id, &list, &targets))
    })
}

pub async fn planning(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, "Planning", |conn, actor| {
        let shifts = planning::list_shifts(conn, actor)?;
        let staff = if actor.role == Role::Admin {
            users::list_users(conn, actor)?
        } else {
            Vec::new()
        };
        Ok(views::planning::page(actor.role, &shifts, &staff))
    })
}

pub async fn preferences(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(flash): Query<Flash>,
) -> Response {
    render(&state, &auth, &flash, "Préférences", |conn, actor| {
        actor.require_staff()?;
        let profile = repo::get_profile(conn, &actor.user_id)?;
        Ok(views::users::preferences(profile.as_ref()))
    })
}

pub async fn users(State(state): State<AppState>, auth: Authenticated, Query(flash): Query<Flash>) -> Response {
    render(&state, &auth, &flash, "Utilisateurs", |conn, actor| {
        let profiles = users::list_users(conn, actor)?;
        Ok(views::users::page(&actor.user_id, &profiles))
    })
}
