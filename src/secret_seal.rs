use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use std::fs;
use std::path::Path;

use crate::errors::{CrmError, CrmResult};

const NONCE_LEN: usize = 12;

/// AES-256-GCM sealing for secrets at rest (TOTP seeds).
///
/// Output is `base64(nonce || ciphertext)` with a fresh nonce per seal.
#[derive(Clone)]
pub struct SecretSealer {
    key: [u8; 32],
}

impl SecretSealer {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn from_base64(encoded_key: &str) -> CrmResult<Self> {
        Ok(Self::new(decode_base64_key(encoded_key)?))
    }

    /// Load the key stored at `path`, creating one if the file is absent.
    pub fn load_or_create(path: &Path) -> CrmResult<Self> {
        if path.exists() {
            let encoded = fs::read_to_string(path)
                .map_err(|e| CrmError::io(format!("read key file {}", path.display()), e))?;
            return Self::from_base64(encoded.trim());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CrmError::io("create key directory", e))?;
        }
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        fs::write(path, general_purpose::STANDARD.encode(key))
            .map_err(|e| CrmError::io(format!("write key file {}", path.display()), e))?;
        tracing::warn!(path = %path.display(), "generated new secret sealing key");
        Ok(Self::new(key))
    }

    pub fn seal(&self, plaintext: &[u8]) -> CrmResult<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| CrmError::crypto("invalid sealing key"))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CrmError::crypto("encryption failed"))?;
        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(out))
    }

    pub fn open(&self, sealed: &str) -> CrmResult<Vec<u8>> {
        let raw = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|_| CrmError::crypto("sealed value is not base64"))?;
        if raw.len() <= NONCE_LEN {
            return Err(CrmError::crypto("sealed value too short"));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| CrmError::crypto("invalid sealing key"))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CrmError::crypto("decryption failed"))
    }
}

pub fn decode_base64_key(encoded_key: &str) -> CrmResult<[u8; 32]> {
    let decoded = general_purpose::STANDARD
        .decode(encoded_key)
        .map_err(|_| CrmError::config("sealing key is not valid base64"))?;
    if decoded.len() != 32 {
        return Err(CrmError::config("sealing key must be 32 bytes"));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded);
    Ok(key)
}
