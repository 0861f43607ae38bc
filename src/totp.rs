//! Time-based one-time passwords (RFC 6238, HMAC-SHA1, 6 digits, 30s steps).

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::errors::{CrmError, CrmResult};

type HmacSha1 = Hmac<Sha1>;

pub const STEP_SECS: u64 = 30;
pub const DIGITS: u32 = 6;
/// Steps accepted either side of the current one, for clock drift.
pub const SKEW_STEPS: u64 = 1;
const SECRET_LEN: usize = 20;

/// A fresh base32 secret (160 bits, no padding).
pub fn generate_secret() -> String {
    let mut raw = [0u8; SECRET_LEN];
    rand::rng().fill_bytes(&mut raw);
    BASE32_NOPAD.encode(&raw)
}

pub fn decode_secret(secret_b32: &str) -> CrmResult<Vec<u8>> {
    let normalized: String = secret_b32
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| CrmError::crypto("MFA secret is not valid base32"))
}

/// HOTP value for a counter (RFC 4226 dynamic truncation).
pub fn hotp(secret: &[u8], counter: u64) -> CrmResult<u32> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|_| CrmError::crypto("invalid HMAC key"))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    Ok(binary % 10u32.pow(DIGITS))
}

pub fn code_at(secret: &[u8], unix_secs: u64) -> CrmResult<String> {
    let value = hotp(secret, unix_secs / STEP_SECS)?;
    Ok(format!("{:0width$}", value, width = DIGITS as usize))
}

/// Checks `code` against the current step and its neighbours.
pub fn verify_code(secret_b32: &str, code: &str, unix_secs: u64) -> CrmResult<bool> {
    let code = code.trim();
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }
    let secret = decode_secret(secret_b32)?;
    let step = unix_secs / STEP_SECS;
    let mut matched = false;
    for counter in step.saturating_sub(SKEW_STEPS)..=step + SKEW_STEPS {
        let candidate = format!(
            "{:0width$}",
            hotp(&secret, counter)?,
            width = DIGITS as usize
        );
        matched |= bool::from(candidate.as_bytes().ct_eq(code.as_bytes()));
    }
    Ok(matched)
}

/// Provisioning URI understood by authenticator apps.
pub fn otpauth_url(issuer: &str, account: &str, secret_b32: &str) -> String {
    let issuer_enc = percent_encode(issuer);
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
        issuer_enc,
        percent_encode(account),
        secret_b32,
        issuer_enc,
        DIGITS,
        STEP_SECS
    )
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'@' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
