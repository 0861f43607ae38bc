use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::activity::{self, actions, order_newest_first, Actor};
use crate::api::{listed, ok_with, parse_record_id, ApiJson, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::auth_session::CurrentUser;
use crate::csv_export::{activity_csv, export_file_name};
use crate::listing::{self, ListQuery};
use crate::records::ActivityLog;
use crate::role::Page;

#[derive(Deserialize)]
pub struct NewActivityRequest {
    action: String,
    #[serde(default)]
    details: Option<String>,
}

fn newest_first(st: &AppState) -> Result<Vec<ActivityLog>, AppError> {
    let mut logs = st.store.list_activity()?;
    order_newest_first(&mut logs);
    Ok(logs)
}

pub async fn list_logs(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Envelope<Vec<ActivityLog>>>, AppError> {
    user.require_page(Page::ActivityLogs)?;
    let query = ListQuery::from_params(&params)?;
    Ok(listed(listing::apply(&newest_first(&st)?, &query)))
}

/// Any signed-in user may record their own activity.
pub async fn create_log(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<NewActivityRequest>,
) -> Result<(StatusCode, Json<Envelope<ActivityLog>>), AppError> {
    let log = activity::append(
        st.store.as_ref(),
        &Actor::user(&user.user_id, &user.email),
        &req.action,
        req.details,
    )?;
    Ok((StatusCode::CREATED, ok_with("Activity recorded", log)))
}

pub async fn delete_log(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    user.require_page(Page::ActivityLogs)?;
    let id = parse_record_id(&id, "activity log")?;
    let store = st.store.as_ref();
    if !store.delete_activity(id)? {
        return Err(AppError::not_found("activity log not found"));
    }
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::ACTIVITY_LOG_DELETE,
        Some(format!("#{id}")),
    );
    Ok(ok_with("Activity log deleted", ()))
}

/// CSV of every log matching the search and filters. Paging is ignored.
pub async fn export_logs(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    user.require_page(Page::ActivityLogs)?;
    let mut query = ListQuery::from_params(&params)?;
    query.page = 1;
    query.page_size = None;
    let selected = listing::apply(&newest_first(&st)?, &query).items;
    let body = activity_csv(&selected)?;
    tracing::info!(user_id = %user.user_id, rows = selected.len(), "activity logs exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_file_name(Utc::now())),
            ),
        ],
        body,
    )
        .into_response())
}
