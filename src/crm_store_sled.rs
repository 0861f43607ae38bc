use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};
use std::path::Path;

use crate::crm_store::{email_key, CrmStore};
use crate::errors::{CrmError, CrmResult};
use crate::records::{ActivityLog, Credential, MfaRecord, Profile, Recruit, SessionRecord};

const PROFILES: &str = "profiles";
const CREDENTIALS: &str = "credentials";
const SESSIONS: &str = "sessions";
const RECRUITS: &str = "recruits";
const RESUMES: &str = "resumes";
const ACTIVITY: &str = "activity_logs";
const MFA: &str = "mfa";

/// A sled-backed implementation of CrmStore. One tree per record kind;
/// numeric ids are stored big-endian so tree order is id order.
pub struct CrmStoreSled {
    db: Db,
}

impl CrmStoreSled {
    pub fn open<P: AsRef<Path>>(path: P) -> CrmResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .map_err(|e| CrmError::database(format!("open {}", path.display()), e))?;
        Ok(Self { db })
    }

    /// In-memory database discarded on drop.
    pub fn temporary() -> CrmResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> CrmResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn tree(&self, name: &str) -> CrmResult<Tree> {
        self.db
            .open_tree(name)
            .map_err(|e| CrmError::database(format!("open tree {name}"), e))
    }

    fn encode<T: Serialize>(value: &T) -> CrmResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CrmError::serialization("encode record", e))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CrmResult<T> {
        serde_json::from_slice(bytes).map_err(|e| CrmError::serialization("decode record", e))
    }

    fn get<T: DeserializeOwned>(&self, tree: &str, key: &[u8]) -> CrmResult<Option<T>> {
        match self.tree(tree)?.get(key)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, tree: &str, key: &[u8], value: &T) -> CrmResult<()> {
        let bytes = Self::encode(value)?;
        self.tree(tree)?.insert(key, bytes)?;
        Ok(())
    }

    fn remove(&self, tree: &str, key: &[u8]) -> CrmResult<bool> {
        Ok(self.tree(tree)?.remove(key)?.is_some())
    }

    fn scan<T: DeserializeOwned>(&self, tree: &str) -> CrmResult<Vec<T>> {
        let mut out = Vec::new();
        for entry in self.tree(tree)?.iter() {
            let (_, bytes) = entry?;
            out.push(Self::decode(&bytes)?);
        }
        Ok(out)
    }
}

fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

impl CrmStore for CrmStoreSled {
    fn next_id(&self) -> CrmResult<u64> {
        // sled may hand out 0 first; keep ids strictly positive.
        Ok(self.db.generate_id()? + 1)
    }

    fn get_profile(&self, user_id: &str) -> CrmResult<Option<Profile>> {
        self.get(PROFILES, user_id.as_bytes())
    }

    fn put_profile(&self, profile: &Profile) -> CrmResult<()> {
        self.put(PROFILES, profile.id.as_bytes(), profile)
    }

    fn delete_profile(&self, user_id: &str) -> CrmResult<bool> {
        self.remove(PROFILES, user_id.as_bytes())
    }

    fn list_profiles(&self) -> CrmResult<Vec<Profile>> {
        self.scan(PROFILES)
    }

    fn get_credential(&self, email: &str) -> CrmResult<Option<Credential>> {
        self.get(CREDENTIALS, email_key(email).as_bytes())
    }

    fn insert_credential(&self, email: &str, credential: &Credential) -> CrmResult<bool> {
        let bytes = Self::encode(credential)?;
        let swapped = self.tree(CREDENTIALS)?.compare_and_swap(
            email_key(email).as_bytes(),
            None::<&[u8]>,
            Some(bytes),
        )?;
        Ok(swapped.is_ok())
    }

    fn put_credential(&self, email: &str, credential: &Credential) -> CrmResult<()> {
        self.put(CREDENTIALS, email_key(email).as_bytes(), credential)
    }

    fn delete_credential(&self, email: &str) -> CrmResult<()> {
        self.remove(CREDENTIALS, email_key(email).as_bytes())?;
        Ok(())
    }

    fn get_session(&self, token_digest: &str) -> CrmResult<Option<SessionRecord>> {
        self.get(SESSIONS, token_digest.as_bytes())
    }

    fn put_session(&self, token_digest: &str, session: &SessionRecord) -> CrmResult<()> {
        self.put(SESSIONS, token_digest.as_bytes(), session)
    }

    fn delete_session(&self, token_digest: &str) -> CrmResult<()> {
        self.remove(SESSIONS, token_digest.as_bytes())?;
        Ok(())
    }

    fn delete_sessions_for(&self, user_id: &str, keep: Option<&str>) -> CrmResult<usize> {
        let tree = self.tree(SESSIONS)?;
        let mut removed = 0;
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            let session: SessionRecord = Self::decode(&bytes)?;
            if session.user_id != user_id {
                continue;
            }
            if keep.is_some_and(|k| k.as_bytes() == &key[..]) {
                continue;
            }
            tree.remove(key)?;
            removed += 1;
        }
        Ok(removed)
    }

    fn get_recruit(&self, id: u64) -> CrmResult<Option<Recruit>> {
        self.get(RECRUITS, &id_key(id))
    }

    fn put_recruit(&self, recruit: &Recruit) -> CrmResult<()> {
        self.put(RECRUITS, &id_key(recruit.id), recruit)
    }

    fn delete_recruit(&self, id: u64) -> CrmResult<bool> {
        self.remove(RESUMES, &id_key(id))?;
        self.remove(RECRUITS, &id_key(id))
    }

    fn list_recruits(&self) -> CrmResult<Vec<Recruit>> {
        self.scan(RECRUITS)
    }

    fn put_resume(&self, recruit_id: u64, bytes: &[u8]) -> CrmResult<()> {
        self.tree(RESUMES)?.insert(id_key(recruit_id), bytes)?;
        Ok(())
    }

    fn get_resume(&self, recruit_id: u64) -> CrmResult<Option<Vec<u8>>> {
        Ok(self
            .tree(RESUMES)?
            .get(id_key(recruit_id))?
            .map(|bytes| bytes.to_vec()))
    }

    fn put_activity(&self, log: &ActivityLog) -> CrmResult<()> {
        self.put(ACTIVITY, &id_key(log.id), log)
    }

    fn delete_activity(&self, id: u64) -> CrmResult<bool> {
        self.remove(ACTIVITY, &id_key(id))
    }

    fn list_activity(&self) -> CrmResult<Vec<ActivityLog>> {
        self.scan(ACTIVITY)
    }

    fn get_mfa(&self, user_id: &str) -> CrmResult<Option<MfaRecord>> {
        self.get(MFA, user_id.as_bytes())
    }

    fn put_mfa(&self, record: &MfaRecord) -> CrmResult<()> {
        self.put(MFA, record.user_id.as_bytes(), record)
    }

    fn delete_mfa(&self, user_id: &str) -> CrmResult<bool> {
        self.remove(MFA, user_id.as_bytes())
    }
}
