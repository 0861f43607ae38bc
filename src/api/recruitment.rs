use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::activity::{self, actions, Actor};
use crate::api::{listed, ok, ok_with, parse_record_id, ApiJson, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::auth_session::CurrentUser;
use crate::errors::CrmError;
use crate::input_validator::{self, MAX_NAME_LEN};
use crate::listing::{self, ListQuery};
use crate::records::{Recruit, RecruitStatus};
use crate::role::Page;
use crate::visibility::{can_view, resolve_viewer_role, visible_recruits};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecruitRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    contact_number: Option<String>,
    #[serde(default)]
    referral_name: Option<String>,
    #[serde(default)]
    position_applied_for: Option<String>,
}

/// Loads a recruit the caller may manage. Hidden records read as missing.
fn load_visible(st: &AppState, user: &CurrentUser, raw_id: &str) -> Result<Recruit, AppError> {
    user.require_page(Page::Recruitment)?;
    let id = parse_record_id(raw_id, "recruit")?;
    match st.store.get_recruit(id)? {
        Some(recruit) if can_view(user.role, &recruit) => Ok(recruit),
        Some(_) => {
            tracing::info!(user_id = %user.user_id, recruit_id = id, "recruit outside viewer visibility");
            Err(AppError::not_found("recruit not found"))
        }
        None => Err(AppError::not_found("recruit not found")),
    }
}

/// Any signed-in user may call this; the result is filtered by the role
/// stored on their profile, so a Financial Advisor gets an empty list.
pub async fn list_recruits(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Envelope<Vec<Recruit>>>, AppError> {
    let query = ListQuery::from_params(&params)?;
    let store = st.store.as_ref();
    let role = resolve_viewer_role(store, &user.user_id);
    let visible = visible_recruits(role, store.list_recruits()?);
    tracing::debug!(user_id = %user.user_id, %role, count = visible.len(), "recruit listing");
    Ok(listed(listing::apply(&visible, &query)))
}

pub async fn get_recruit(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Recruit>>, AppError> {
    Ok(ok(load_visible(&st, &user, &id)?))
}

pub async fn update_recruit(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateRecruitRequest>,
) -> Result<Json<Envelope<Recruit>>, AppError> {
    let mut recruit = load_visible(&st, &user, &id)?;

    if let Some(raw) = req.status.as_deref() {
        recruit.status = RecruitStatus::from_str(raw)
            .map_err(|_| AppError::bad_request(format!("status: unknown status '{raw}'")))?;
    }
    if let Some(notes) = req.notes.as_deref() {
        recruit.notes = input_validator::optional_text("notes", Some(notes))?;
    }
    if let Some(name) = req.full_name.as_deref() {
        recruit.full_name = input_validator::required("fullName", name, MAX_NAME_LEN)?;
    }
    if let Some(number) = req.contact_number.as_deref() {
        recruit.contact_number = input_validator::contact_number("contactNumber", number)?;
    }
    if let Some(referral) = req.referral_name.as_deref() {
        recruit.referral_name = input_validator::required("referralName", referral, MAX_NAME_LEN)?;
    }
    if let Some(raw) = req.position_applied_for.as_deref() {
        let position = input_validator::position("positionAppliedFor", raw)?;
        recruit.position_applied_for = position.as_str().to_string();
        if !can_view(user.role, &recruit) {
            return Err(CrmError::validation(
                "positionAppliedFor",
                "is outside the positions you manage",
            )
            .into());
        }
    }
    recruit.updated_at = Utc::now();

    let store = st.store.as_ref();
    store.put_recruit(&recruit)?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::RECRUIT_UPDATE,
        Some(format!("#{} {}", recruit.id, recruit.status.as_str())),
    );
    Ok(ok_with("Recruit updated", recruit))
}

pub async fn delete_recruit(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    let recruit = load_visible(&st, &user, &id)?;
    let store = st.store.as_ref();
    store.delete_recruit(recruit.id)?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::RECRUIT_DELETE,
        Some(format!("#{} {}", recruit.id, recruit.full_name)),
    );
    Ok(ok_with("Recruit deleted", ()))
}

pub async fn download_resume(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let recruit = load_visible(&st, &user, &id)?;
    let info = recruit
        .resume
        .ok_or_else(|| AppError::not_found("resume not found"))?;
    let bytes = st
        .store
        .get_resume(recruit.id)?
        .ok_or_else(|| AppError::not_found("resume not found"))?;

    let file_name: String = info
        .file_name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();
    Ok((
        [
            (header::CONTENT_TYPE, info.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
