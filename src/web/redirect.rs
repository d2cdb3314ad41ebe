//! Post/redirect/get: form outcomes become `?success=` / `?error=` banners.

use axum::response::Redirect;
use reqwest::Url;

use crate::actions::{ActionError, ActionResult};

/// `path` with `key=message` appended to its query string.
pub fn with_flash(path: &str, key: &str, message: &str) -> String {
    let Ok(mut url) = Url::parse("http://docta.local").and_then(|base| base.join(path)) else {
        return path.to_string();
    };
    url.query_pairs_mut().append_pair(key, message);
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Redirect after a form action: back to the page with the banner message,
/// or wherever a refusal says to go.
pub fn outcome(back: &str, result: ActionResult) -> Redirect {
    match result {
        Ok(message) => Redirect::to(&with_flash(back, "success", message)),
        Err(err) => failure(back, err),
    }
}

pub fn failure(back: &str, err: ActionError) -> Redirect {
    match err {
        ActionError::Forbidden { message, redirect } => {
            tracing::warn!(%message, %redirect, "Action refused");
            Redirect::to(&with_flash(&redirect, "error", &message))
        }
        err @ ActionError::Database(_) => {
            tracing::error!(error = %err, back, "Action failed");
            Redirect::to(&with_flash(back, "error", &err.user_message()))
        }
        err => {
            tracing::debug!(error = %err, back, "Action rejected");
            Redirect::to(&with_flash(back, "error", &err.user_message()))
        }
    }
}
