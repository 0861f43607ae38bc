//! Client-side page gate.
//!
//! The role is fetched once per signed-in principal and kept in a
//! `SessionRoleCache` owned by the caller. Sign-out and a change of
//! authenticated user drop it. A role changed by an administrator is not
//! noticed until the cache is dropped.

use async_trait::async_trait;

use crate::access_policy;
use crate::errors::CrmResult;
use crate::role::{Page, Role};

#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Id of the signed-in user, `None` when there is no session.
    async fn current_user_id(&self) -> CrmResult<Option<String>>;

    async fn fetch_role(&self, user_id: &str) -> CrmResult<Role>;
}

#[derive(Debug, Default)]
pub struct SessionRoleCache {
    cached: Option<(String, Role)>,
}

impl SessionRoleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> Option<Role> {
        self.cached.as_ref().map(|(_, role)| *role)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Call on explicit sign-out.
    pub fn on_sign_out(&mut self) {
        tracing::debug!("session role cache cleared on sign-out");
        self.invalidate();
    }

    /// The caller's role, or the lowest privilege when it cannot be
    /// determined. Failures are never cached.
    pub async fn role(&mut self, source: &dyn RoleSource) -> Role {
        let user_id = match source.current_user_id().await {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.invalidate();
                return Role::FALLBACK;
            }
            Err(err) => {
                tracing::warn!(error = %err, "session lookup failed; using lowest privilege");
                return Role::FALLBACK;
            }
        };

        if let Some((cached_id, role)) = &self.cached {
            if *cached_id == user_id {
                return *role;
            }
            tracing::debug!(previous = %cached_id, current = %user_id, "principal changed; refetching role");
            self.invalidate();
        }

        match source.fetch_role(&user_id).await {
            Ok(role) => {
                self.cached = Some((user_id, role));
                role
            }
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "role fetch failed; using lowest privilege");
                Role::FALLBACK
            }
        }
    }

    pub async fn can_access(&mut self, source: &dyn RoleSource, page: Page) -> bool {
        access_policy::can_access(self.role(source).await, page)
    }

    /// Same as `can_access` for a raw page id; unknown ids deny.
    pub async fn can_access_page_id(&mut self, source: &dyn RoleSource, page_id: &str) -> bool {
        let role = self.role(source).await;
        access_policy::can_access_page_id(role, page_id)
    }
}
