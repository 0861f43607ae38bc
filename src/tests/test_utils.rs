// Shared fixtures for the in-crate tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::crm_store::CrmStore;
use crate::crm_store_sled::CrmStoreSled;
use crate::errors::{CrmError, CrmResult};
use crate::records::{
    ActivityLog, Credential, MfaRecord, Profile, Recruit, RecruitStatus, SessionRecord,
};
use crate::role::Role;
use crate::session_role::RoleSource;

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn recruit(id: u64, position: &str, minute: i64) -> Recruit {
    Recruit {
        id,
        full_name: format!("Applicant {id}"),
        email_address: format!("applicant{id}@example.com"),
        contact_number: "+63 917 000 0000".to_string(),
        position_applied_for: position.to_string(),
        referral_name: "Walk-in".to_string(),
        status: RecruitStatus::Pending,
        notes: None,
        resume: None,
        created_at: at_minute(minute),
        updated_at: at_minute(minute),
    }
}

/// Scripted role source that counts how often the role is fetched.
pub struct ScriptedSource {
    pub user: Mutex<Option<String>>,
    pub roles: Mutex<VecDeque<CrmResult<Role>>>,
    pub fetches: Mutex<usize>,
}

impl ScriptedSource {
    pub fn signed_in(user: &str, roles: Vec<CrmResult<Role>>) -> Self {
        Self {
            user: Mutex::new(Some(user.to_string())),
            roles: Mutex::new(roles.into()),
            fetches: Mutex::new(0),
        }
    }

    pub fn switch_user(&self, user: Option<&str>) {
        *self.user.lock().unwrap() = user.map(str::to_string);
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl RoleSource for ScriptedSource {
    async fn current_user_id(&self) -> CrmResult<Option<String>> {
        Ok(self.user.lock().unwrap().clone())
    }

    async fn fetch_role(&self, _user_id: &str) -> CrmResult<Role> {
        *self.fetches.lock().unwrap() += 1;
        self.roles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CrmError::internal("no scripted role left")))
    }
}

/// Sled store whose session deletes always fail.
pub struct StickySessions(pub CrmStoreSled);

impl CrmStore for StickySessions {
    fn next_id(&self) -> CrmResult<u64> {
        self.0.next_id()
    }
    fn get_profile(&self, user_id: &str) -> CrmResult<Option<Profile>> {
        self.0.get_profile(user_id)
    }
    fn put_profile(&self, profile: &Profile) -> CrmResult<()> {
        self.0.put_profile(profile)
    }
    fn delete_profile(&self, user_id: &str) -> CrmResult<bool> {
        self.0.delete_profile(user_id)
    }
    fn list_profiles(&self) -> CrmResult<Vec<Profile>> {
        self.0.list_profiles()
    }
    fn get_credential(&self, email: &str) -> CrmResult<Option<Credential>> {
        self.0.get_credential(email)
    }
    fn insert_credential(&self, email: &str, credential: &Credential) -> CrmResult<bool> {
        self.0.insert_credential(email, credential)
    }
    fn put_credential(&self, email: &str, credential: &Credential) -> CrmResult<()> {
        self.0.put_credential(email, credential)
    }
    fn delete_credential(&self, email: &str) -> CrmResult<()> {
        self.0.delete_credential(email)
    }
    fn get_session(&self, token_digest: &str) -> CrmResult<Option<SessionRecord>> {
        self.0.get_session(token_digest)
    }
    fn put_session(&self, token_digest: &str, session: &SessionRecord) -> CrmResult<()> {
        self.0.put_session(token_digest, session)
    }
    fn delete_session(&self, _token_digest: &str) -> CrmResult<()> {
        Err(CrmError::internal("session tree unavailable"))
    }
    fn delete_sessions_for(&self, _user_id: &str, _keep: Option<&str>) -> CrmResult<usize> {
        Err(CrmError::internal("session tree unavailable"))
    }
    fn get_recruit(&self, id: u64) -> CrmResult<Option<Recruit>> {
        self.0.get_recruit(id)
    }
    fn put_recruit(&self, recruit: &Recruit) -> CrmResult<()> {
        self.0.put_recruit(recruit)
    }
    fn delete_recruit(&self, id: u64) -> CrmResult<bool> {
        self.0.delete_recruit(id)
    }
    fn list_recruits(&self) -> CrmResult<Vec<Recruit>> {
        self.0.list_recruits()
    }
    fn put_resume(&self, recruit_id: u64, bytes: &[u8]) -> CrmResult<()> {
        self.0.put_resume(recruit_id, bytes)
    }
    fn get_resume(&self, recruit_id: u64) -> CrmResult<Option<Vec<u8>>> {
        self.0.get_resume(recruit_id)
    }
    fn put_activity(&self, log: &ActivityLog) -> CrmResult<()> {
        self.0.put_activity(log)
    }
    fn delete_activity(&self, id: u64) -> CrmResult<bool> {
        self.0.delete_activity(id)
    }
    fn list_activity(&self) -> CrmResult<Vec<ActivityLog>> {
        self.0.list_activity()
    }
    fn get_mfa(&self, user_id: &str) -> CrmResult<Option<MfaRecord>> {
        self.0.get_mfa(user_id)
    }
    fn put_mfa(&self, record: &MfaRecord) -> CrmResult<()> {
        self.0.put_mfa(record)
    }
    fn delete_mfa(&self, user_id: &str) -> CrmResult<bool> {
        self.0.delete_mfa(user_id)
    }
}
