//! JSON endpoints, the care-task CSV download and the message purge hook.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::actions::export::{self, ExportQuery};
use crate::actions::{hospitalizations, messages, patients};
use crate::models::Patient;
use crate::stay::StayListing;
use crate::web::error::WebError;
use crate::web::session::{bearer_token, Authenticated};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub auth: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        auth: state.auth.mode(),
    })
}

/// Staff: stays from both tables as JSON.
pub async fn hospitalizations(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<Vec<StayListing>>, WebError> {
    let conn = state.open_db()?;
    Ok(Json(hospitalizations::list_hospitalizations(&conn, &auth.actor)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SuggestQuery {
    pub q: String,
}

/// Staff: patient picker autocomplete.
pub async fn suggest_patients(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<Vec<Patient>>, WebError> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let conn = state.open_db()?;
    Ok(Json(patients::suggest_patients(&conn, &auth.actor, query.q.trim())?))
}

/// Admin: download the day's scheduled care tasks.
pub async fn export_soins(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ExportQuery>,
) -> Result<Response, WebError> {
    let conn = state.open_db()?;
    let csv = export::export_soins_csv(&conn, &auth.actor, &query)?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", csv.filename)),
        ],
        csv.body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub deleted: usize,
}

/// Scheduler hook: purge old read messages. Requires `Bearer $CRON_SECRET`;
/// without a configured secret every call is refused.
pub async fn cleanup_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>, WebError> {
    let expected = state.config.cron_secret.as_deref().ok_or(WebError::Unauthorized)?;
    let presented = bearer_token(&headers).ok_or(WebError::Unauthorized)?;
    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Message cleanup called with a wrong secret");
        return Err(WebError::Unauthorized);
    }
    let conn = state.open_db()?;
    let deleted = messages::cleanup_messages(
        &conn,
        state.config.message_retention_days,
        chrono::Utc::now(),
    )?;
    Ok(Json(CleanupResponse { deleted }))
}
