//! HTTP client for the CRM API, used by the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::access_policy::Capabilities;
use crate::errors::{CrmError, CrmResult};
use crate::records::{Profile, Recruit};
use crate::role::Role;
use crate::session_role::RoleSource;

/// Key under which the session payload is kept in the session file.
pub const SESSION_KEY: &str = "crm.session";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub email: String,
}

impl StoredSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// JSON file holding client state, one entry per key.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> CrmResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| CrmError::config("no local data directory for the session file"))?;
        Ok(Self::new(base.join("recruit-crm").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> CrmResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| CrmError::io(format!("read {}", self.path.display()), e))?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                tracing::warn!(path = %self.path.display(), "session file unreadable; starting fresh");
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> CrmResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CrmError::io("create session directory", e))?;
        }
        let body = serde_json::to_vec_pretty(map)
            .map_err(|e| CrmError::serialization("encode session file", e))?;
        fs::write(&self.path, body).map_err(|e| CrmError::io(format!("write {}", self.path.display()), e))
    }

    pub fn load(&self) -> CrmResult<Option<StoredSession>> {
        let map = self.read_map()?;
        match map.get(SESSION_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone()).ok()),
            None => Ok(None),
        }
    }

    pub fn save(&self, session: &StoredSession) -> CrmResult<()> {
        let mut map = self.read_map()?;
        let value = serde_json::to_value(session)
            .map_err(|e| CrmError::serialization("encode session", e))?;
        map.insert(SESSION_KEY.to_string(), value);
        self.write_map(&map)
    }

    pub fn clear(&self) -> CrmResult<()> {
        let mut map = self.read_map()?;
        if map.remove(SESSION_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigninData {
    access_token: String,
    expires_at: DateTime<Utc>,
    user: Profile,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<StoredSession>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Option<StoredSession>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> Option<&StoredSession> {
        self.session.as_ref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.session {
            Some(session) => builder.bearer_auth(&session.access_token),
            None => builder,
        }
    }

    async fn error_from(response: reqwest::Response) -> CrmError {
        let status = response.status();
        let message = response
            .json::<Envelope<Value>>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::UNAUTHORIZED => CrmError::auth(message),
            StatusCode::FORBIDDEN => CrmError::auth(format!("forbidden: {message}")),
            StatusCode::NOT_FOUND => CrmError::not_found("resource", message),
            StatusCode::CONFLICT => CrmError::conflict(message),
            StatusCode::TOO_MANY_REQUESTS => CrmError::rate_limited(message),
            StatusCode::BAD_REQUEST => CrmError::validation("request", message),
            _ => CrmError::internal(format!("server returned {status}: {message}")),
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> CrmResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| CrmError::network(what.to_string(), e))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let body: Envelope<T> = response
            .json()
            .await
            .map_err(|e| CrmError::network(format!("{what} body"), e))?;
        body.data
            .ok_or_else(|| CrmError::internal(format!("{what}: response carried no data")))
    }

    pub async fn signin(&mut self, email: &str, password: &str, mfa_code: Option<&str>) -> CrmResult<StoredSession> {
        let builder = self.request(Method::POST, "/api/auth/signin").json(&json!({
            "email": email,
            "password": password,
            "mfaCode": mfa_code,
        }));
        let data: SigninData = self.send(builder, "signin").await?;
        let session = StoredSession {
            access_token: data.access_token,
            expires_at: data.expires_at,
            user_id: data.user.id,
            email: data.user.email,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    pub async fn signout(&mut self) -> CrmResult<()> {
        if self.session.is_none() {
            return Ok(());
        }
        let builder = self.request(Method::POST, "/api/auth/signout");
        let result = builder.send().await;
        self.session = None;
        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            // An already expired session is as good as signed out.
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => Ok(()),
            Ok(response) => Err(Self::error_from(response).await),
            Err(e) => Err(CrmError::network("signout", e)),
        }
    }

    pub async fn capabilities(&self) -> CrmResult<Capabilities> {
        self.send(self.request(Method::GET, "/api/auth/role"), "role").await
    }

    pub async fn recruits(&self, params: &[(String, String)]) -> CrmResult<Vec<Recruit>> {
        let builder = self.request(Method::GET, "/api/recruitment").query(params);
        self.send(builder, "recruitment list").await
    }

    pub async fn export_activity_csv(&self, params: &[(String, String)]) -> CrmResult<Vec<u8>> {
        let response = self
            .request(Method::GET, "/api/activity-logs/export")
            .query(params)
            .send()
            .await
            .map_err(|e| CrmError::network("activity export", e))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CrmError::network("activity export body", e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RoleSource for ApiClient {
    async fn current_user_id(&self) -> CrmResult<Option<String>> {
        Ok(self
            .session
            .as_ref()
            .filter(|s| s.is_live(Utc::now()))
            .map(|s| s.user_id.clone()))
    }

    async fn fetch_role(&self, user_id: &str) -> CrmResult<Role> {
        let caps = self.capabilities().await?;
        if caps.user_id != user_id {
            return Err(CrmError::auth("session belongs to a different user"));
        }
        Ok(caps.role)
    }
}
