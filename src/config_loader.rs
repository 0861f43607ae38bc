use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::secret_seal::decode_base64_key;

pub const DEFAULT_CONFIG_FILE: &str = "crm.toml";
pub const CONFIG_PATH_ENV: &str = "CRM_CONFIG";
pub const ENV_PREFIX: &str = "CRM_";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrmConfig {
    pub bind_addr: String,
    pub data_dir: String,
    pub session_ttl_secs: u64,
    pub mfa_issuer: String,
    #[serde(default)]
    pub mfa_key_b64: Option<String>,
    pub max_resume_bytes: usize,
    pub signin_max_attempts: usize,
    pub signin_window_secs: u64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub bootstrap_admin_email: Option<String>,
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            data_dir: "./crm-data".into(),
            session_ttl_secs: 60 * 60 * 12,
            mfa_issuer: "Recruit CRM".into(),
            mfa_key_b64: None,
            max_resume_bytes: 5 * 1024 * 1024,
            signin_max_attempts: 5,
            signin_window_secs: 300,
            cors_origins: Vec::new(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

impl CrmConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, figment::Error> {
        self.bind_addr
            .parse()
            .map_err(|_| figment::Error::from(format!("bind_addr '{}' is not host:port", self.bind_addr)))
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("db")
    }

    pub fn mfa_key_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("mfa.key")
    }

    pub fn validate(&self) -> Result<(), figment::Error> {
        self.socket_addr()?;
        if self.data_dir.trim().is_empty() {
            return Err(figment::Error::from("data_dir must be set"));
        }
        if self.session_ttl_secs == 0 {
            return Err(figment::Error::from("session_ttl_secs must be positive"));
        }
        if self.signin_max_attempts == 0 || self.signin_window_secs == 0 {
            return Err(figment::Error::from("sign-in limiter needs a positive budget and window"));
        }
        if self.max_resume_bytes == 0 {
            return Err(figment::Error::from("max_resume_bytes must be positive"));
        }
        if let Some(key) = &self.mfa_key_b64 {
            decode_base64_key(key).map_err(|e| figment::Error::from(e.to_string()))?;
        }
        if self.bootstrap_admin_email.is_some() != self.bootstrap_admin_password.is_some() {
            return Err(figment::Error::from(
                "bootstrap_admin_email and bootstrap_admin_password go together",
            ));
        }
        Ok(())
    }
}

pub fn figment_for(path: impl Into<PathBuf>) -> Figment {
    Figment::from(Serialized::defaults(CrmConfig::default()))
        .merge(Toml::file(path.into()))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
}

/// Defaults, then `crm.toml` (or `$CRM_CONFIG`), then `CRM_*` variables.
pub fn load_config() -> Result<CrmConfig, figment::Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    extract(figment_for(path))
}

pub fn extract(figment: Figment) -> Result<CrmConfig, figment::Error> {
    let config: CrmConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
