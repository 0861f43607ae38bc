use chrono::Utc;

use crate::crm_store::CrmStore;
use crate::errors::CrmResult;
use crate::input_validator;
use crate::records::ActivityLog;

/// Actions the server records on its own behalf.
pub mod actions {
    pub const SIGNUP: &str = "signup";
    pub const SIGNIN: &str = "signin";
    pub const SIGNOUT: &str = "signout";
    pub const PASSWORD_CHANGE: &str = "password_change";
    pub const ACCOUNT_CREATE: &str = "account_create";
    pub const ACCOUNT_UPDATE: &str = "account_update";
    pub const ACCOUNT_DELETE: &str = "account_delete";
    pub const APPLICATION_SUBMITTED: &str = "application_submitted";
    pub const RECRUIT_UPDATE: &str = "recruit_update";
    pub const RECRUIT_DELETE: &str = "recruit_delete";
    pub const ACTIVITY_LOG_DELETE: &str = "activity_log_delete";
    pub const MFA_ENROLL: &str = "mfa_enroll";
    pub const MFA_VERIFY: &str = "mfa_verify";
    pub const MFA_DISABLE: &str = "mfa_disable";
}

#[derive(Debug, Clone, Default)]
pub struct Actor<'a> {
    pub user_id: Option<&'a str>,
    pub email: Option<&'a str>,
}

impl<'a> Actor<'a> {
    pub fn user(user_id: &'a str, email: &'a str) -> Self {
        Self {
            user_id: Some(user_id),
            email: Some(email),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

pub fn append(
    store: &dyn CrmStore,
    actor: &Actor<'_>,
    action: &str,
    details: Option<String>,
) -> CrmResult<ActivityLog> {
    let action = input_validator::action(action)?;
    let details = input_validator::optional_text("details", details.as_deref())?;
    let log = ActivityLog {
        id: store.next_id()?,
        user_id: actor.user_id.map(str::to_string),
        user_email: actor.email.map(str::to_string),
        action,
        details,
        created_at: Utc::now(),
    };
    store.put_activity(&log)?;
    Ok(log)
}

/// Best-effort variant for server-side events: failures are logged and
/// swallowed so they never fail the request that triggered them.
pub fn record(store: &dyn CrmStore, actor: &Actor<'_>, action: &str, details: Option<String>) {
    if let Err(err) = append(store, actor, action, details) {
        tracing::warn!(%action, error = %err, "failed to record activity");
    }
}

/// Newest first; ids break ties.
pub fn order_newest_first(logs: &mut [ActivityLog]) {
    logs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm_store_sled::CrmStoreSled;

    #[test]
    fn append_validates_and_persists() {
        let store = CrmStoreSled::temporary().unwrap();
        let log = append(
            &store,
            &Actor::user("u1", "u1@example.com"),
            actions::SIGNIN,
            Some("via password".into()),
        )
        .unwrap();
        assert!(log.id > 0);
        assert_eq!(store.list_activity().unwrap(), vec![log]);

        assert!(append(&store, &Actor::anonymous(), "Bad Action!", None).is_err());
    }

    #[test]
    fn record_swallows_failures() {
        let store = CrmStoreSled::temporary().unwrap();
        record(&store, &Actor::anonymous(), "NOT VALID", None);
        assert!(store.list_activity().unwrap().is_empty());
    }

    #[test]
    fn ordering_is_newest_first() {
        let store = CrmStoreSled::temporary().unwrap();
        for _ in 0..3 {
            append(&store, &Actor::anonymous(), actions::SIGNUP, None).unwrap();
        }
        let mut logs = store.list_activity().unwrap();
        order_newest_first(&mut logs);
        assert!(logs.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(logs[0].id > logs[2].id);
    }
}
