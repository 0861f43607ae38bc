use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{accounts, activity_logs, applications, auth, mfa, recruitment};
use crate::app_state::AppState;

/// Room for the text fields of a multipart application around the resume.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = state.settings.max_resume_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        // public intake; both spellings are in use by existing forms
        .route("/api/Applications", post(applications::submit_application))
        .route("/api/applications", post(applications::submit_application))
        // auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/role", get(auth::role))
        .route("/api/auth/password", put(auth::change_password))
        // accounts
        .route(
            "/api/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/api/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        // recruitment
        .route("/api/recruitment", get(recruitment::list_recruits))
        .route(
            "/api/recruitment/{id}",
            get(recruitment::get_recruit)
                .put(recruitment::update_recruit)
                .delete(recruitment::delete_recruit),
        )
        .route("/api/recruitment/{id}/resume", get(recruitment::download_resume))
        // activity
        .route(
            "/api/activity-logs",
            get(activity_logs::list_logs).post(activity_logs::create_log),
        )
        .route("/api/activity-logs/export", get(activity_logs::export_logs))
        .route("/api/activity-logs/{id}", delete(activity_logs::delete_log))
        // mfa
        .route("/api/mfa/enroll", post(mfa::enroll))
        .route("/api/mfa/verify", post(mfa::verify))
        .route("/api/mfa/status", get(mfa::status))
        .route("/api/mfa/disable", delete(mfa::disable))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": { "status": "ok" } }))
}
