//! `POST /actions/*`: form submissions, answered with a redirect back to the
//! page carrying a success or error banner.

use axum::extract::State;
use axum::response::Redirect;
use axum::Form;
use rusqlite::Connection;

use crate::actions::appointments::{self, AppointmentForm, AppointmentStatusForm};
use crate::actions::hospitalizations::{self, HospitalizationForm, HospitalizationIdForm};
use crate::actions::messages::{self, MessageForm, MessageIdForm};
use crate::actions::notifications::{self, NotificationForm, NotificationIdForm};
use crate::actions::patients::{self, PatientForm, PatientIdForm};
use crate::actions::planning::{self, ShiftForm, ShiftIdForm};
use crate::actions::soins::{self, SoinForm, SoinStatusForm};
use crate::actions::users::{self, PreferencesForm, RoleForm};
use crate::actions::{ActionError, ActionResult, Actor};
use crate::web::redirect::outcome;
use crate::web::session::Authenticated;
use crate::web::state::AppState;

type Action<F> = fn(&Connection, &Actor, &F) -> ActionResult;

/// Run `action` on a fresh connection and redirect to the actor's `page`.
fn submit<F>(state: &AppState, auth: &Authenticated, page: &str, form: &F, action: Action<F>) -> Redirect {
    let result = state
        .open_db()
        .map_err(ActionError::from)
        .and_then(|conn| action(&conn, &auth.actor, form));
    outcome(&auth.actor.role.section_path(page), result)
}

fn update_patient_dossier(conn: &Connection, actor: &Actor, form: &PatientForm) -> ActionResult {
    patients::update_patient(conn, actor, form).map(|_| "Patient mis à jour")
}

pub async fn create_patient(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<PatientForm>,
) -> Redirect {
    submit(&state, &auth, "patients", &form, patients::create_or_link_patient)
}

pub async fn update_patient(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<PatientForm>,
) -> Redirect {
    submit(&state, &auth, "patients", &form, update_patient_dossier)
}

pub async fn delete_patient(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<PatientIdForm>,
) -> Redirect {
    submit(&state, &auth, "patients", &form, patients::delete_patient)
}

pub async fn upsert_self_patient(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<PatientForm>,
) -> Redirect {
    submit(&state, &auth, "dossier", &form, patients::upsert_self_patient)
}

pub async fn create_hospitalization(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<HospitalizationForm>,
) -> Redirect {
    submit(&state, &auth, "hospitalizations", &form, hospitalizations::create_hospitalization)
}

pub async fn update_hospitalization(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<HospitalizationForm>,
) -> Redirect {
    submit(&state, &auth, "hospitalizations", &form, hospitalizations::update_hospitalization)
}

pub async fn discharge_hospitalization(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<HospitalizationIdForm>,
) -> Redirect {
    submit(&state, &auth, "hospitalizations", &form, hospitalizations::discharge_hospitalization)
}

pub async fn delete_hospitalization(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<HospitalizationIdForm>,
) -> Redirect {
    submit(&state, &auth, "hospitalizations", &form, hospitalizations::delete_hospitalization)
}

pub async fn create_soin(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<SoinForm>,
) -> Redirect {
    submit(&state, &auth, "soins", &form, soins::create_soin)
}

pub async fn update_soin_status(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<SoinStatusForm>,
) -> Redirect {
    submit(&state, &auth, "soins", &form, soins::update_soin_status)
}

pub async fn delete_soin(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<SoinStatusForm>,
) -> Redirect {
    submit(&state, &auth, "soins", &form, soins::delete_soin)
}

pub async fn create_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<AppointmentForm>,
) -> Redirect {
    submit(&state, &auth, "appointments", &form, appointments::create_appointment)
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<AppointmentStatusForm>,
) -> Redirect {
    submit(&state, &auth, "appointments", &form, appointments::update_appointment_status)
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<MessageForm>,
) -> Redirect {
    submit(&state, &auth, "messages", &form, messages::send_message)
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<MessageIdForm>,
) -> Redirect {
    submit(&state, &auth, "messages", &form, messages::mark_message_read)
}

pub async fn create_notification(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<NotificationForm>,
) -> Redirect {
    submit(&state, &auth, "notifications", &form, notifications::create_notification)
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<NotificationIdForm>,
) -> Redirect {
    submit(&state, &auth, "notifications", &form, notifications::mark_notification_read)
}

pub async fn create_shift(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<ShiftForm>,
) -> Redirect {
    submit(&state, &auth, "planning", &form, planning::create_shift)
}

pub async fn delete_shift(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<ShiftIdForm>,
) -> Redirect {
    submit(&state, &auth, "planning", &form, planning::delete_shift)
}

pub async fn update_user_role(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<RoleForm>,
) -> Redirect {
    submit(&state, &auth, "users", &form, users::update_user_role)
}

pub async fn update_preferences(
    State(state): State<AppState>,
    auth: Authenticated,
    Form(form): Form<PreferencesForm>,
) -> Redirect {
    submit(&state, &auth, "preferences", &form, users::update_preferences)
}
