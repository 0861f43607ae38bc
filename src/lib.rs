//! Library root for the `recruit_crm` crate

// Core error handling
pub mod api_errors;
pub mod errors;

// Roles, pages and who sees what
pub mod access_policy;
pub mod listing;
pub mod role;
pub mod visibility;

// Records & validation
pub mod input_validator;
pub mod records;

// Persistence
pub mod crm_store;
pub mod crm_store_sled;

// Accounts, sessions & secrets
pub mod accounts;
pub mod auth_session;
pub mod passwords;
pub mod rate_limiter;
pub mod secret_seal;
pub mod totp;

// Activity trail
pub mod activity;
pub mod csv_export;

// Web server interface
pub mod api;
pub mod app_state;
pub mod web;

// Client side
pub mod client;
pub mod session_role;

// Configuration, CLI & logging
pub mod cli;
pub mod config_loader;
pub mod observability;

#[cfg(test)]
mod tests {
    pub mod config;
    pub mod session_role_test;
    pub mod store_test;
    pub mod test_utils;
}

pub use access_policy::{can_access, visibility_for, Capabilities};
pub use errors::{CrmError, CrmResult};
pub use role::{Page, Position, Role};
