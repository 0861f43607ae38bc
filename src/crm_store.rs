use crate::errors::CrmResult;
use crate::records::{ActivityLog, Credential, MfaRecord, Profile, Recruit, SessionRecord};

/// Persistence boundary for every record kind the service keeps.
///
/// Each method is a single-key read or write; nothing here coordinates across
/// calls, so concurrent edits of the same record are last-write-wins.
pub trait CrmStore: Send + Sync {
    fn next_id(&self) -> CrmResult<u64>;

    fn get_profile(&self, user_id: &str) -> CrmResult<Option<Profile>>;
    fn put_profile(&self, profile: &Profile) -> CrmResult<()>;
    fn delete_profile(&self, user_id: &str) -> CrmResult<bool>;
    fn list_profiles(&self) -> CrmResult<Vec<Profile>>;

    fn get_credential(&self, email: &str) -> CrmResult<Option<Credential>>;
    /// Inserts only if no credential exists for the email. Returns false on clash.
    fn insert_credential(&self, email: &str, credential: &Credential) -> CrmResult<bool>;
    fn put_credential(&self, email: &str, credential: &Credential) -> CrmResult<()>;
    fn delete_credential(&self, email: &str) -> CrmResult<()>;

    fn get_session(&self, token_digest: &str) -> CrmResult<Option<SessionRecord>>;
    fn put_session(&self, token_digest: &str, session: &SessionRecord) -> CrmResult<()>;
    fn delete_session(&self, token_digest: &str) -> CrmResult<()>;
    /// Drops every session of a user, optionally keeping one digest.
    fn delete_sessions_for(&self, user_id: &str, keep: Option<&str>) -> CrmResult<usize>;

    fn get_recruit(&self, id: u64) -> CrmResult<Option<Recruit>>;
    fn put_recruit(&self, recruit: &Recruit) -> CrmResult<()>;
    fn delete_recruit(&self, id: u64) -> CrmResult<bool>;
    fn list_recruits(&self) -> CrmResult<Vec<Recruit>>;

    fn put_resume(&self, recruit_id: u64, bytes: &[u8]) -> CrmResult<()>;
    fn get_resume(&self, recruit_id: u64) -> CrmResult<Option<Vec<u8>>>;

    fn put_activity(&self, log: &ActivityLog) -> CrmResult<()>;
    fn delete_activity(&self, id: u64) -> CrmResult<bool>;
    fn list_activity(&self) -> CrmResult<Vec<ActivityLog>>;

    fn get_mfa(&self, user_id: &str) -> CrmResult<Option<MfaRecord>>;
    fn put_mfa(&self, record: &MfaRecord) -> CrmResult<()>;
    fn delete_mfa(&self, user_id: &str) -> CrmResult<bool>;
}

/// Credential keys are case-insensitive emails.
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
