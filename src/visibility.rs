//! Server-side recruit visibility.
//!
//! The viewer's role is always looked up from the profile store, never taken
//! from the request. Any failure to resolve it collapses to `Role::Unknown`,
//! which sees nothing.

use crate::access_policy::visibility_for;
use crate::crm_store::CrmStore;
use crate::records::Recruit;
use crate::role::Role;

/// Resolve the role for a viewer. Total: every outcome maps to a role.
pub fn resolve_viewer_role(store: &dyn CrmStore, user_id: &str) -> Role {
    match store.get_profile(user_id) {
        Ok(Some(profile)) => {
            if !profile.role.is_known() {
                tracing::warn!(%user_id, "profile carries an unrecognized role");
            }
            profile.role
        }
        Ok(None) => {
            tracing::warn!(%user_id, "no profile for authenticated user; denying by default");
            Role::Unknown
        }
        Err(err) => {
            tracing::error!(%user_id, error = %err, "role lookup failed; denying by default");
            Role::Unknown
        }
    }
}

/// Newest first; equal timestamps fall back to the higher (later) id.
pub fn order_newest_first(records: &mut [Recruit]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// The subset of `records` a viewer with `role` may see, newest first.
pub fn visible_recruits(role: Role, records: Vec<Recruit>) -> Vec<Recruit> {
    let visibility = visibility_for(role);
    if visibility.is_empty() {
        return Vec::new();
    }
    let mut visible: Vec<Recruit> = records
        .into_iter()
        .filter(|r| visibility.admits(&r.position_applied_for))
        .collect();
    order_newest_first(&mut visible);
    visible
}

pub fn can_view(role: Role, recruit: &Recruit) -> bool {
    visibility_for(role).admits(&recruit.position_applied_for)
}
