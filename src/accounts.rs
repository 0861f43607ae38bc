//! Account lifecycle shared by signup, admin management and bootstrap.

use chrono::Utc;
use uuid::Uuid;

use crate::crm_store::CrmStore;
use crate::errors::{CrmError, CrmResult};
use crate::input_validator;
use crate::passwords::{check_strength, hash_password, verify_password};
use crate::records::{AccountStatus, Credential, Profile};
use crate::role::Role;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub password: Option<String>,
}

pub fn create_account(store: &dyn CrmStore, new: NewAccount) -> CrmResult<Profile> {
    let email = input_validator::email("email", &new.email)?;
    let full_name = input_validator::required("fullName", &new.full_name, input_validator::MAX_NAME_LEN)?;
    if !new.role.is_known() {
        return Err(CrmError::validation("role", "unknown role"));
    }
    check_strength(&new.password)?;

    let user_id = Uuid::new_v4().to_string();
    let credential = Credential {
        user_id: user_id.clone(),
        password_hash: hash_password(&new.password)?,
    };
    if !store.insert_credential(&email, &credential)? {
        return Err(CrmError::conflict("an account with this email already exists"));
    }

    let now = Utc::now();
    let profile = Profile {
        id: user_id,
        email,
        full_name,
        role: new.role,
        status: AccountStatus::Active,
        created_at: now,
        updated_at: now,
        last_sign_in: None,
    };
    if let Err(err) = store.put_profile(&profile) {
        // Leave no credential without a profile behind.
        let _ = store.delete_credential(&profile.email);
        return Err(err);
    }
    tracing::info!(user_id = %profile.id, role = %profile.role, "account created");
    Ok(profile)
}

/// Checks the password and returns the profile it belongs to.
pub fn verify_credentials(store: &dyn CrmStore, email: &str, password: &str) -> CrmResult<Profile> {
    let invalid = || CrmError::auth("invalid email or password");
    let credential = store.get_credential(email)?.ok_or_else(invalid)?;
    if !verify_password(password, &credential.password_hash)? {
        return Err(invalid());
    }
    let profile = store.get_profile(&credential.user_id)?.ok_or_else(invalid)?;
    if profile.status == AccountStatus::Inactive {
        return Err(CrmError::auth("account is inactive"));
    }
    Ok(profile)
}

pub fn update_account(store: &dyn CrmStore, user_id: &str, changes: AccountChanges) -> CrmResult<Profile> {
    let mut profile = store
        .get_profile(user_id)?
        .ok_or_else(|| CrmError::not_found("account", user_id))?;

    if let Some(name) = changes.full_name {
        profile.full_name = input_validator::required("fullName", &name, input_validator::MAX_NAME_LEN)?;
    }
    if let Some(role) = changes.role {
        if !role.is_known() {
            return Err(CrmError::validation("role", "unknown role"));
        }
        profile.role = role;
    }
    if let Some(status) = changes.status {
        profile.status = status;
    }
    let password_reset = changes.password.is_some();
    if let Some(password) = changes.password {
        set_password(store, &profile, &password)?;
    }
    profile.updated_at = Utc::now();
    store.put_profile(&profile)?;

    if password_reset || profile.status == AccountStatus::Inactive {
        let revoked = store.delete_sessions_for(&profile.id, None)?;
        tracing::info!(user_id = %profile.id, revoked, password_reset, "account sessions revoked");
    }
    Ok(profile)
}

fn set_password(store: &dyn CrmStore, profile: &Profile, password: &str) -> CrmResult<()> {
    check_strength(password)?;
    store.put_credential(
        &profile.email,
        &Credential {
            user_id: profile.id.clone(),
            password_hash: hash_password(password)?,
        },
    )
}

/// Self-service change. Other sessions of the user are revoked.
pub fn change_password(
    store: &dyn CrmStore,
    profile: &Profile,
    current: &str,
    new_password: &str,
    keep_session: &str,
) -> CrmResult<usize> {
    verify_credentials(store, &profile.email, current)
        .map_err(|_| CrmError::auth("current password is incorrect"))?;
    set_password(store, profile, new_password)?;
    store.delete_sessions_for(&profile.id, Some(keep_session))
}

/// Removes profile, credential, sessions and MFA enrollment.
pub fn delete_account(store: &dyn CrmStore, user_id: &str) -> CrmResult<Profile> {
    let profile = store
        .get_profile(user_id)?
        .ok_or_else(|| CrmError::not_found("account", user_id))?;
    store.delete_sessions_for(user_id, None)?;
    store.delete_mfa(user_id)?;
    store.delete_credential(&profile.email)?;
    store.delete_profile(user_id)?;
    tracing::info!(%user_id, "account deleted");
    Ok(profile)
}

/// Seeds a `Sys Admin` unless an account with the email already exists.
pub fn ensure_bootstrap_admin(store: &dyn CrmStore, email: &str, password: &str) -> CrmResult<bool> {
    if store.get_credential(email)?.is_some() {
        return Ok(false);
    }
    create_account(
        store,
        NewAccount {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "System Administrator".to_string(),
            role: Role::SysAdmin,
        },
    )?;
    tracing::warn!(%email, "bootstrap Sys Admin account created");
    Ok(true)
}
