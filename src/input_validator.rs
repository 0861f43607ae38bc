use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{CrmError, CrmResult};
use crate::role::Position;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TEXT_LEN: usize = 2000;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9 ()\-]{6,20}$").unwrap();
    static ref ACTION_RE: Regex = Regex::new(r"^[a-z][a-z0-9_]{1,63}$").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Trims and rejects blank or oversized values.
pub fn required(field: &str, value: &str, max_len: usize) -> CrmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation(field, "is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(CrmError::validation(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn optional_text(field: &str, value: Option<&str>) -> CrmResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_TEXT_LEN => Err(CrmError::validation(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        )),
        Some(text) => Ok(Some(text.to_string())),
    }
}

pub fn email(field: &str, value: &str) -> CrmResult<String> {
    let value = required(field, value, 254)?;
    if !EMAIL_RE.is_match(&value) {
        return Err(CrmError::validation(field, "is not a valid email address"));
    }
    Ok(value.to_lowercase())
}

pub fn contact_number(field: &str, value: &str) -> CrmResult<String> {
    let value = required(field, value, 20)?;
    if !PHONE_RE.is_match(&value) {
        return Err(CrmError::validation(field, "is not a valid phone number"));
    }
    Ok(value)
}

pub fn position(field: &str, value: &str) -> CrmResult<Position> {
    let value = required(field, value, MAX_NAME_LEN)?;
    value
        .parse()
        .map_err(|_| CrmError::validation(field, format!("unknown position '{value}'")))
}

/// Activity actions are short snake_case identifiers.
pub fn action(value: &str) -> CrmResult<String> {
    let value = value.trim();
    if !ACTION_RE.is_match(value) {
        return Err(CrmError::validation(
            "action",
            "must be a lowercase identifier such as page_view",
        ));
    }
    Ok(value.to_string())
}

pub fn is_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}
