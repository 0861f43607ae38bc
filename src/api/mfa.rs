use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::activity::{self, actions, Actor};
use crate::api::{ok, ok_with, ApiJson, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::auth_session::CurrentUser;
use crate::errors::CrmError;
use crate::records::MfaRecord;
use crate::totp;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    secret: String,
    otpauth_url: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    code: String,
}

#[derive(Debug, Serialize)]
pub struct MfaStatus {
    enabled: bool,
    pending: bool,
}

impl From<Option<&MfaRecord>> for MfaStatus {
    fn from(record: Option<&MfaRecord>) -> Self {
        Self {
            enabled: record.is_some_and(|r| r.enabled),
            pending: record.is_some_and(|r| !r.enabled),
        }
    }
}

/// Starts (or restarts) enrollment. The secret is returned once and stored
/// sealed; it only takes effect after a successful verify.
pub async fn enroll(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Envelope<Enrollment>>, AppError> {
    let store = st.store.as_ref();
    if store.get_mfa(&user.user_id)?.is_some_and(|r| r.enabled) {
        return Err(AppError::conflict("MFA is already enabled"));
    }

    let secret = totp::generate_secret();
    store.put_mfa(&MfaRecord {
        user_id: user.user_id.clone(),
        sealed_secret: st.sealer.seal(secret.as_bytes())?,
        enabled: false,
        enrolled_at: Utc::now(),
        verified_at: None,
    })?;
    activity::record(store, &Actor::user(&user.user_id, &user.email), actions::MFA_ENROLL, None);

    let otpauth_url = totp::otpauth_url(&st.settings.mfa_issuer, &user.email, &secret);
    Ok(ok(Enrollment {
        secret,
        otpauth_url,
    }))
}

pub async fn verify(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<Json<Envelope<MfaStatus>>, AppError> {
    let store = st.store.as_ref();
    let mut record = store
        .get_mfa(&user.user_id)?
        .ok_or_else(|| AppError::not_found("no MFA enrollment in progress"))?;

    let secret = String::from_utf8(st.sealer.open(&record.sealed_secret)?)
        .map_err(|_| CrmError::crypto("sealed MFA secret is not UTF-8"))?;
    let now = Utc::now().timestamp().max(0) as u64;
    if !totp::verify_code(&secret, &req.code, now)? {
        return Err(AppError::bad_request("code: invalid MFA code"));
    }

    if !record.enabled {
        record.enabled = true;
        record.verified_at = Some(Utc::now());
        store.put_mfa(&record)?;
        tracing::info!(user_id = %user.user_id, "MFA enabled");
    }
    activity::record(store, &Actor::user(&user.user_id, &user.email), actions::MFA_VERIFY, None);
    Ok(ok_with("MFA verified", MfaStatus::from(Some(&record))))
}

pub async fn status(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Envelope<MfaStatus>>, AppError> {
    let record = st.store.get_mfa(&user.user_id)?;
    Ok(ok(MfaStatus::from(record.as_ref())))
}

pub async fn disable(
    State(st): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Envelope<MfaStatus>>, AppError> {
    let store = st.store.as_ref();
    if store.delete_mfa(&user.user_id)? {
        activity::record(store, &Actor::user(&user.user_id, &user.email), actions::MFA_DISABLE, None);
    }
    Ok(ok_with("MFA disabled", MfaStatus::from(None)))
}
