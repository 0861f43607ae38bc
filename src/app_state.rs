use std::sync::Arc;

use crate::accounts::ensure_bootstrap_admin;
use crate::config_loader::CrmConfig;
use crate::crm_store::CrmStore;
use crate::crm_store_sled::CrmStoreSled;
use crate::errors::CrmResult;
use crate::rate_limiter::RateLimiter;
use crate::secret_seal::SecretSealer;

/// Request-independent knobs the handlers read.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub session_ttl_secs: u64,
    pub mfa_issuer: String,
    pub max_resume_bytes: usize,
}

impl From<&CrmConfig> for ServiceSettings {
    fn from(config: &CrmConfig) -> Self {
        Self {
            session_ttl_secs: config.session_ttl_secs,
            mfa_issuer: config.mfa_issuer.clone(),
            max_resume_bytes: config.max_resume_bytes,
        }
    }
}

pub struct AppState {
    pub store: Arc<dyn CrmStore>,
    pub sealer: SecretSealer,
    pub signin_limiter: RateLimiter,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn CrmStore>, sealer: SecretSealer, config: &CrmConfig) -> Self {
        Self {
            store,
            sealer,
            signin_limiter: RateLimiter::new(config.signin_max_attempts, config.signin_window_secs),
            settings: ServiceSettings::from(config),
        }
    }

    /// Opens the on-disk store and sealing key named by `config`, then seeds
    /// the bootstrap admin if one is configured.
    pub fn open(config: &CrmConfig) -> CrmResult<Self> {
        let store = CrmStoreSled::open(config.store_path())?;
        let sealer = match &config.mfa_key_b64 {
            Some(key) => SecretSealer::from_base64(key)?,
            None => SecretSealer::load_or_create(&config.mfa_key_path())?,
        };
        let state = Self::new(Arc::new(store), sealer, config);

        if let (Some(email), Some(password)) = (
            &config.bootstrap_admin_email,
            &config.bootstrap_admin_password,
        ) {
            ensure_bootstrap_admin(state.store.as_ref(), email, password)?;
        }
        Ok(state)
    }
}
