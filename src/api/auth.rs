use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::access_policy::Capabilities;
use crate::accounts::{self, NewAccount};
use crate::activity::{self, actions, Actor};
use crate::api::{ok, ok_with, ApiJson, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::auth_session::{issue_session, CurrentUser};
use crate::errors::CrmError;
use crate::records::Profile;
use crate::role::Role;
use crate::totp;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    email: String,
    password: String,
    full_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    email: String,
    password: String,
    #[serde(default)]
    mfa_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Profile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user: Profile,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    current_password: String,
    new_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChanged {
    revoked_sessions: usize,
}

/// Self-registration always yields a Financial Advisor account.
pub async fn signup(
    State(st): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<SessionPayload>>), AppError> {
    let store = st.store.as_ref();
    let profile = accounts::create_account(
        store,
        NewAccount {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            role: Role::FinancialAdvisor,
        },
    )?;
    let session = issue_session(store, &profile.id, st.settings.session_ttl_secs)?;
    activity::record(store, &Actor::user(&profile.id, &profile.email), actions::SIGNUP, None);

    Ok((
        StatusCode::CREATED,
        ok_with(
            "Account created",
            SessionPayload {
                access_token: session.access_token,
                expires_at: session.expires_at,
                user: profile,
            },
        ),
    ))
}

fn check_mfa(st: &AppState, profile: &Profile, code: Option<&str>) -> Result<(), CrmError> {
    let record = match st.store.get_mfa(&profile.id)? {
        Some(record) if record.enabled => record,
        _ => return Ok(()),
    };
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CrmError::auth("MFA code required"))?;
    let secret = String::from_utf8(st.sealer.open(&record.sealed_secret)?)
        .map_err(|_| CrmError::crypto("sealed MFA secret is not UTF-8"))?;
    let now = Utc::now().timestamp().max(0) as u64;
    if !totp::verify_code(&secret, code, now)? {
        return Err(CrmError::auth("invalid MFA code"));
    }
    Ok(())
}

pub async fn signin(
    State(st): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<Json<Envelope<SessionPayload>>, AppError> {
    st.signin_limiter.check(&req.email).await?;

    let store = st.store.as_ref();
    let mut profile = accounts::verify_credentials(store, &req.email, &req.password)?;
    check_mfa(&st, &profile, req.mfa_code.as_deref())?;
    st.signin_limiter.reset(&req.email).await;

    profile.last_sign_in = Some(Utc::now());
    store.put_profile(&profile)?;
    let session = issue_session(store, &profile.id, st.settings.session_ttl_secs)?;
    tracing::info!(user_id = %profile.id, role = %profile.role, "signed in");
    activity::record(store, &Actor::user(&profile.id, &profile.email), actions::SIGNIN, None);

    Ok(ok(SessionPayload {
        access_token: session.access_token,
        expires_at: session.expires_at,
        user: profile,
    }))
}

pub async fn signout(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Envelope<()>>, AppError> {
    let store = st.store.as_ref();
    store.delete_session(&user.token_digest)?;
    activity::record(store, &Actor::user(&user.user_id, &user.email), actions::SIGNOUT, None);
    Ok(ok_with("Signed out", ()))
}

pub async fn session(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Envelope<SessionInfo>>, AppError> {
    let profile = st
        .store
        .get_profile(&user.user_id)?
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;
    Ok(ok(SessionInfo {
        user: profile,
        expires_at: user.expires_at,
    }))
}

/// The caller's role plus the pages and positions it unlocks.
pub async fn role(user: CurrentUser) -> Json<Envelope<Capabilities>> {
    ok(Capabilities::for_user(&user.user_id, user.role))
}

pub async fn change_password(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<PasswordChangeRequest>,
) -> Result<Json<Envelope<PasswordChanged>>, AppError> {
    let store = st.store.as_ref();
    let profile = store
        .get_profile(&user.user_id)?
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;
    let revoked = accounts::change_password(
        store,
        &profile,
        &req.current_password,
        &req.new_password,
        &user.token_digest,
    )?;
    activity::record(
        store,
        &Actor::user(&user.user_id, &user.email),
        actions::PASSWORD_CHANGE,
        None,
    );
    Ok(ok_with(
        "Password updated",
        PasswordChanged {
            revoked_sessions: revoked,
        },
    ))
}
