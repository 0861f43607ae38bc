//! Route handlers. Every response uses the `{success, message?, data}` envelope.

pub mod accounts;
pub mod activity_logs;
pub mod applications;
pub mod auth;
pub mod mfa;
pub mod recruitment;

use axum::extract::FromRequest;
use axum::Json;
use serde::Serialize;

use crate::api_errors::AppError;
use crate::listing::ListPage;

/// `Json` body extractor whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: None,
        data,
        pagination: None,
    })
}

pub fn ok_with<T: Serialize>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: Some(message.into()),
        data,
        pagination: None,
    })
}

pub fn listed<T: Serialize>(page: ListPage<T>) -> Json<Envelope<Vec<T>>> {
    Json(Envelope {
        success: true,
        message: None,
        pagination: Some(Pagination {
            total: page.total,
            total_pages: page.total_pages,
            page: page.page,
            page_size: page.page_size,
        }),
        data: page.items,
    })
}

/// Numeric record ids arrive as path strings; anything else is a 404.
pub fn parse_record_id(raw: &str, resource: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::not_found(format!("{resource} not found")))
}
