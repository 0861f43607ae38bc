use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::accounts::{self, AccountChanges, NewAccount};
use crate::activity::{self, actions, Actor};
use crate::api::{listed, ok, ok_with, ApiJson, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::auth_session::CurrentUser;
use crate::listing::{self, ListQuery};
use crate::records::{AccountStatus, Profile};
use crate::role::{Page, Role};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    email: String,
    password: String,
    full_name: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    Role::from_str(raw).map_err(|_| AppError::bad_request(format!("role: unknown role '{raw}'")))
}

fn parse_status(raw: &str) -> Result<AccountStatus, AppError> {
    AccountStatus::from_str(raw)
        .map_err(|_| AppError::bad_request(format!("status: unknown status '{raw}'")))
}

/// Only a `Sys Admin` may create, edit or delete a `Sys Admin`.
fn guard_sys_admin(user: &CurrentUser, target: Role) -> Result<(), AppError> {
    if target == Role::SysAdmin && user.role != Role::SysAdmin {
        tracing::warn!(user_id = %user.user_id, role = %user.role, "Sys Admin account change refused");
        return Err(AppError::forbidden("only a Sys Admin may manage Sys Admin accounts"));
    }
    Ok(())
}

fn existing(st: &AppState, id: &str) -> Result<Profile, AppError> {
    st.store
        .get_profile(id)?
        .ok_or_else(|| AppError::not_found("account not found"))
}

pub async fn list_accounts(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Envelope<Vec<Profile>>>, AppError> {
    user.require_page(Page::Accounts)?;
    let query = ListQuery::from_params(&params)?;
    let mut profiles = st.store.list_profiles()?;
    profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    Ok(listed(listing::apply(&profiles, &query)))
}

pub async fn create_account(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Envelope<Profile>>), AppError> {
    user.require_page(Page::Accounts)?;
    let role = match req.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::FinancialAdvisor,
    };
    guard_sys_admin(&user, role)?;
    let store = st.store.as_ref();
    let profile = accounts::create_account(
        store,
        NewAccount {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role,
        },
    )?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::ACCOUNT_CREATE,
        Some(format!("{} as {}", profile.email, profile.role)),
    );
    Ok((StatusCode::CREATED, ok_with("Account created", profile)))
}

pub async fn get_account(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Profile>>, AppError> {
    user.require_page(Page::Accounts)?;
    Ok(ok(existing(&st, &id)?))
}

pub async fn update_account(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> Result<Json<Envelope<Profile>>, AppError> {
    user.require_page(Page::Accounts)?;
    guard_sys_admin(&user, existing(&st, &id)?.role)?;
    let changes = AccountChanges {
        full_name: req.full_name,
        role: req.role.as_deref().map(parse_role).transpose()?,
        status: req.status.as_deref().map(parse_status).transpose()?,
        password: req.password,
    };
    if let Some(role) = changes.role {
        guard_sys_admin(&user, role)?;
    }
    let store = st.store.as_ref();
    let profile = accounts::update_account(store, &id, changes)?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::ACCOUNT_UPDATE,
        Some(format!("{} now {} ({})", profile.email, profile.role, profile.status.as_str())),
    );
    Ok(ok_with("Account updated", profile))
}

pub async fn delete_account(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    user.require_page(Page::Accounts)?;
    if id == user.user_id {
        return Err(AppError::bad_request("you cannot delete your own account"));
    }
    guard_sys_admin(&user, existing(&st, &id)?.role)?;
    let store = st.store.as_ref();
    let removed = accounts::delete_account(store, &id)?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::ACCOUNT_DELETE,
        Some(removed.email),
    );
    Ok(ok_with("Account deleted", ()))
}
