//! Bearer sessions.
//!
//! A session token is 32 random bytes, base64url encoded, handed to the client
//! once. Only its SHA-256 digest is stored, so a leaked database does not
//! yield usable tokens.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::access_policy::can_access;
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::crm_store::CrmStore;
use crate::errors::{CrmError, CrmResult};
use crate::records::{AccountStatus, Profile, SessionRecord};
use crate::role::{Page, Role};
use crate::visibility::resolve_viewer_role;

const TOKEN_BYTES: usize = 32;
const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn digest_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub fn issue_session(store: &dyn CrmStore, user_id: &str, ttl_secs: u64) -> CrmResult<IssuedSession> {
    let mut raw = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut raw);
    let token = URL_SAFE_NO_PAD.encode(raw);

    let now = Utc::now();
    let expires_at = now + Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64);
    store.put_session(
        &digest_token(&token),
        &SessionRecord {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at,
        },
    )?;
    tracing::debug!(%user_id, %expires_at, "session issued");
    Ok(IssuedSession {
        access_token: token,
        expires_at,
    })
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    pub fn require_page(&self, page: Page) -> CrmResult<()> {
        if can_access(self.role, page) {
            Ok(())
        } else {
            Err(CrmError::page_denied(self.role, page))
        }
    }
}

/// Resolves a raw token to its user. Expired sessions are removed on sight.
pub fn authenticate(store: &dyn CrmStore, token: &str) -> CrmResult<(CurrentUser, Profile)> {
    let token_digest = digest_token(token);
    let session = store
        .get_session(&token_digest)?
        .ok_or_else(|| CrmError::auth("invalid or expired session"))?;

    if session.is_expired(Utc::now()) {
        if let Err(err) = store.delete_session(&token_digest) {
            tracing::warn!(user_id = %session.user_id, error = %err, "could not remove expired session");
        }
        return Err(CrmError::auth("invalid or expired session"));
    }

    let profile = store
        .get_profile(&session.user_id)?
        .ok_or_else(|| CrmError::auth("account no longer exists"))?;
    if profile.status == AccountStatus::Inactive {
        return Err(CrmError::auth("account is inactive"));
    }

    let user = CurrentUser {
        role: resolve_viewer_role(store, &profile.id),
        user_id: profile.id.clone(),
        email: profile.email.clone(),
        token_digest,
        expires_at: session.expires_at,
    };
    Ok((user, profile))
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
        let (user, _) = authenticate(state.store.as_ref(), token)?;
        Ok(user)
    }
}
