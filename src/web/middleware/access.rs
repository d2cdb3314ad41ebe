//! Access logging. Runs innermost, after the guard attached the session.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::web::session::Authenticated;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<Authenticated>()
        .map(|auth| auth.actor.user_id.to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    match user {
        Some(user) => tracing::info!(%method, %path, %user, status, "Request served"),
        None => tracing::info!(%method, %path, status, "Request served"),
    }
    response
}
