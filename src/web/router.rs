//! Route table.
//!
//! Role sections (`/admin`, `/medecin`, `/infirmiere`, `/patient`) share one
//! set of page routes; the guard decides who may enter which section and the
//! actions re-check the role on every write.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::http::header::{CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::models::enums::Role;
use crate::web::endpoints::{api, auth, forms, pages};
use crate::web::middleware;
use crate::web::state::AppState;

fn section_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/patients", get(pages::patients))
        .route("/dossier", get(pages::dossier))
        .route("/hospitalizations", get(pages::hospitalizations))
        .route("/soins", get(pages::soins))
        .route("/appointments", get(pages::appointments))
        .route("/messages", get(pages::messages))
        .route("/notifications", get(pages::notifications))
        .route("/planning", get(pages::planning))
        .route("/preferences", get(pages::preferences))
        .route("/users", get(pages::users))
}

fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/patients", post(forms::create_patient))
        .route("/patients/update", post(forms::update_patient))
        .route("/patients/delete", post(forms::delete_patient))
        .route("/patients/self", post(forms::upsert_self_patient))
        .route("/hospitalizations", post(forms::create_hospitalization))
        .route("/hospitalizations/update", post(forms::update_hospitalization))
        .route("/hospitalizations/discharge", post(forms::discharge_hospitalization))
        .route("/hospitalizations/delete", post(forms::delete_hospitalization))
        .route("/soins", post(forms::create_soin))
        .route("/soins/status", post(forms::update_soin_status))
        .route("/soins/delete", post(forms::delete_soin))
        .route("/appointments", post(forms::create_appointment))
        .route("/appointments/status", post(forms::update_appointment_status))
        .route("/messages", post(forms::send_message))
        .route("/messages/read", post(forms::mark_message_read))
        .route("/notifications", post(forms::create_notification))
        .route("/notifications/read", post(forms::mark_notification_read))
        .route("/planning", post(forms::create_shift))
        .route("/planning/delete", post(forms::delete_shift))
        .route("/users/role", post(forms::update_user_role))
        .route("/preferences", post(forms::update_preferences))
}

/// Build the application router.
///
/// Layers are applied from bottom (innermost) to top (outermost):
///   Response headers → Guard → Access log → Handler
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(pages::landing))
        .route("/health", get(api::health))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/register", get(auth::register_page).post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/post-login", get(auth::post_login))
        .route("/profile/setup", get(auth::profile_page).post(auth::save_profile))
        .route("/admin/soins/export", get(api::export_soins))
        .route("/api/hospitalizations", get(api::hospitalizations))
        .route("/api/patients/suggest", get(api::suggest_patients))
        .route("/api/messages/cleanup", get(api::cleanup_messages))
        .nest("/actions", action_routes());

    for role in Role::ALL {
        app = app.nest(&role.home_path(), section_routes());
    }

    app.layer(axum::middleware::from_fn(middleware::access::log_access))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::guard::guard,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{AuthBackend, LocalAuth, RemoteAuth, SignUp};
    use crate::config::AppConfig;
    use crate::db::repository::{self as repo, fixtures};
    use crate::models::enums::HospitalizationStatus;
    use crate::models::ProfileDraft;

    struct Harness {
        state: AppState,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(cron_secret: Option<&str>) -> Self {
            Self::with_auth(cron_secret, AuthBackend::Local(LocalAuth::with_iterations(1_000)))
        }

        fn with_auth(cron_secret: Option<&str>, auth: AuthBackend) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = AppConfig::from_lookup(|_| None).unwrap();
            config.database_path = dir.path().join("docta.db");
            config.cron_secret = cron_secret.map(String::from);
            let state = AppState::new(config, auth);
            Self { state, _dir: dir }
        }

        async fn send(&self, req: Request<Body>) -> Response {
            build_router(self.state.clone()).oneshot(req).await.unwrap()
        }

        /// A signed-up account with a complete profile in `role`; returns its token.
        async fn user(&self, role: Role) -> String {
            let email = format!("{}@docta.test", Uuid::new_v4().simple());
            let session = match self.state.auth.sign_up(&email, "secret-pass").await.unwrap() {
                SignUp::SignedIn(session) => session,
                SignUp::ConfirmationRequired(_) => panic!("local sign-up opens a session"),
            };
            let conn = self.state.open_db().unwrap();
            repo::upsert_profile(
                &conn,
                &ProfileDraft {
                    id: session.user.id,
                    email: Some(email),
                    nom: "Test".into(),
                    prenom: role.label().into(),
                    telephone: None,
                    avatar_url: None,
                },
            )
            .unwrap();
            repo::update_role(&conn, &session.user.id, role).unwrap();
            session.access_token
        }
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("access_token={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("access_token={token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn location(response: &Response) -> String {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = Harness::new(None);
        let response = h.send(get("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["auth"], "local");
    }

    #[tokio::test]
    async fn landing_is_public_and_sends_users_home() {
        let h = Harness::new(None);
        let response = h.send(get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Se connecter"));

        let token = h.user(Role::Medecin).await;
        let response = h.send(get("/", Some(&token))).await;
        assert_eq!(location(&response), "/medecin");
    }

    #[tokio::test]
    async fn sections_require_a_session() {
        let h = Harness::new(None);
        let response = h.send(get("/admin/patients", None)).await;
        assert_eq!(location(&response), "/auth/login");

        let response = h.send(get("/admin", Some("forged-token"))).await;
        assert_eq!(location(&response), "/auth/login");
    }

    #[tokio::test]
    async fn wrong_section_redirects_to_own_home() {
        let h = Harness::new(None);
        let token = h.user(Role::Medecin).await;
        let response = h.send(get("/admin/patients", Some(&token))).await;
        assert_eq!(location(&response), "/medecin");

        let response = h.send(get("/medecin/patients", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<h1>Patients</h1>"));
    }

    #[tokio::test]
    async fn staff_only_page_sends_patient_home_with_banner() {
        let h = Harness::new(None);
        let token = h.user(Role::Patient).await;
        let response = h.send(get("/patient/soins", Some(&token))).await;
        assert!(location(&response).starts_with("/patient?error="));
    }

    #[tokio::test]
    async fn nurse_creates_a_dossier() {
        let h = Harness::new(None);
        let token = h.user(Role::Infirmiere).await;
        let response = h
            .send(post_form(
                "/actions/patients",
                Some(&token),
                "firstName=Jean&lastName=Valjean&gender=male&email=jean%40docta.test",
            ))
            .await;
        assert!(location(&response).starts_with("/infirmiere/patients?success="));

        let conn = h.state.open_db().unwrap();
        let found = repo::find_patient_by_email(&conn, "jean@docta.test").unwrap().unwrap();
        assert_eq!(found.last_name, "Valjean");
    }

    #[tokio::test]
    async fn invalid_form_goes_back_with_error() {
        let h = Harness::new(None);
        let token = h.user(Role::Infirmiere).await;
        let response = h
            .send(post_form("/actions/patients", Some(&token), "firstName=Jean"))
            .await;
        assert!(location(&response).starts_with("/infirmiere/patients?error="));
    }

    #[tokio::test]
    async fn soin_needs_an_active_stay() {
        let h = Harness::new(None);
        let token = h.user(Role::Medecin).await;
        let patient = {
            let conn = h.state.open_db().unwrap();
            fixtures::patient(&conn, "Fantine", "Thenardier")
        };
        let body = format!("patientId={patient}&title=Pansement&scheduledAt=2026-03-01T10%3A00");
        let response = h.send(post_form("/actions/soins", Some(&token), &body)).await;
        assert!(location(&response).starts_with("/medecin/soins?error="));

        {
            let conn = h.state.open_db().unwrap();
            fixtures::legacy_stay(
                &conn,
                patient,
                "2026-02-28T08:00:00Z",
                None,
                HospitalizationStatus::Active,
            );
        }
        let response = h.send(post_form("/actions/soins", Some(&token), &body)).await;
        assert!(location(&response).starts_with("/medecin/soins?success="));
    }

    #[tokio::test]
    async fn stay_form_offers_every_patient() {
        let h = Harness::new(None);
        let token = h.user(Role::Infirmiere).await;
        let oldest = {
            let conn = h.state.open_db().unwrap();
            let oldest = fixtures::patient(&conn, "Fantine", "Abeille");
            for i in 0..60 {
                fixtures::patient(&conn, "Patient", &format!("Zola{i:03}"));
            }
            oldest
        };
        let response = h.send(get("/infirmiere/hospitalizations", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(&format!(r#"value="{oldest}""#)));
        assert!(html.contains("Zola059"));
    }

    #[tokio::test]
    async fn admin_only_action_refuses_nurse() {
        let h = Harness::new(None);
        let token = h.user(Role::Infirmiere).await;
        let body = format!("userId={}&role=admin", Uuid::new_v4());
        let response = h.send(post_form("/actions/users/role", Some(&token), &body)).await;
        assert!(location(&response).starts_with("/post-login?error="));
    }

    #[tokio::test]
    async fn action_without_session_goes_to_login() {
        let h = Harness::new(None);
        let response = h
            .send(post_form("/actions/messages", None, "recipientId=x&body=hello"))
            .await;
        assert_eq!(location(&response), "/auth/login");
    }

    #[tokio::test]
    async fn json_api_answers_401_and_403() {
        let h = Harness::new(None);
        let response = h.send(get("/api/hospitalizations", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "AUTH_REQUIRED");

        let token = h.user(Role::Patient).await;
        let response = h.send(get("/api/hospitalizations", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let token = h.user(Role::Infirmiere).await;
        let response = h.send(get("/api/hospitalizations", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bearer_header_is_accepted_for_api() {
        let h = Harness::new(None);
        let token = h.user(Role::Admin).await;
        {
            let conn = h.state.open_db().unwrap();
            fixtures::patient(&conn, "Cosette", "Fauchelevent");
        }
        let req = Request::builder()
            .uri("/api/patients/suggest?q=cos")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = h.send(req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["first_name"], "Cosette");
    }

    #[tokio::test]
    async fn message_cleanup_requires_the_cron_secret() {
        let h = Harness::new(None);
        let req = Request::builder()
            .uri("/api/messages/cleanup")
            .header("Authorization", "Bearer anything")
            .body(Body::empty())
            .unwrap();
        assert_eq!(h.send(req).await.status(), StatusCode::UNAUTHORIZED);

        let h = Harness::new(Some("s3cret"));
        let wrong = Request::builder()
            .uri("/api/messages/cleanup")
            .header("Authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(h.send(wrong).await.status(), StatusCode::UNAUTHORIZED);

        let right = Request::builder()
            .uri("/api/messages/cleanup")
            .header("Authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let response = h.send(right).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], 0);
    }

    /// Stand-in GoTrue `/auth/v1/user` that rejects every token and records
    /// the `Authorization` headers it saw.
    async fn recording_auth_service() -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/auth/v1/user",
            axum::routing::get(move |headers: axum::http::HeaderMap| {
                let recorder = recorder.clone();
                async move {
                    let value = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    recorder.lock().unwrap().push(value);
                    StatusCode::UNAUTHORIZED
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn cron_secret_never_reaches_the_auth_service() {
        let (base_url, seen) = recording_auth_service().await;
        let remote = RemoteAuth::new(&base_url, "anon-key").unwrap();
        let h = Harness::with_auth(Some("cron-s3cret"), AuthBackend::Remote(remote));

        let cleanup = Request::builder()
            .uri("/api/messages/cleanup")
            .header("Authorization", "Bearer cron-s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(h.send(cleanup).await.status(), StatusCode::OK);
        let health = Request::builder()
            .uri("/health")
            .header("Authorization", "Bearer cron-s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(h.send(health).await.status(), StatusCode::OK);
        assert!(seen.lock().unwrap().is_empty());

        // session routes still consult the service
        let api = Request::builder()
            .uri("/api/hospitalizations")
            .header("Authorization", "Bearer user-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(h.send(api).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(*seen.lock().unwrap(), vec!["Bearer user-token".to_string()]);
    }

    #[tokio::test]
    async fn admin_downloads_soins_csv() {
        let h = Harness::new(None);
        let token = h.user(Role::Admin).await;
        let response = h
            .send(get("/admin/soins/export?date=2026-03-01", Some(&token)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"soins_2026-03-01.csv\""
        );
        assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
        assert!(body_text(response).await.starts_with("patient_name,title"));

        let response = h.send(get("/admin/soins/export", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_then_profile_setup_lands_in_patient_section() {
        let h = Harness::new(None);
        h.state.auth.sign_up("marius@docta.test", "barricade").await.unwrap();

        let response = h
            .send(post_form("/auth/login", None, "email=marius%40docta.test&password=wrong"))
            .await;
        assert!(location(&response).starts_with("/auth/login?error="));

        let response = h
            .send(post_form("/auth/login", None, "email=marius%40docta.test&password=barricade"))
            .await;
        assert_eq!(location(&response), "/post-login");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        let token = cookie
            .strip_prefix("access_token=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_string();

        let response = h.send(get("/post-login", Some(&token))).await;
        assert_eq!(location(&response), "/profile/setup");

        let response = h
            .send(post_form("/profile/setup", Some(&token), "nom=Pontmercy&prenom=Marius"))
            .await;
        assert!(location(&response).starts_with("/patient?success="));
        let role_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(role_cookie.starts_with("role=patient"));

        let response = h.send(get("/post-login", Some(&token))).await;
        assert_eq!(location(&response), "/patient");
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let h = Harness::new(None);
        let token = h.user(Role::Patient).await;
        let response = h.send(post_form("/auth/logout", Some(&token), "")).await;
        assert_eq!(location(&response), "/auth/login");
        let cleared: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cleared.len(), 2);

        let response = h.send(get("/patient", Some(&token))).await;
        assert_eq!(location(&response), "/auth/login");
    }
}
