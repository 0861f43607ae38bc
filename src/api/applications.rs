use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::activity::{self, actions, Actor};
use crate::api::{ok_with, Envelope};
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::input_validator::{self, MAX_NAME_LEN};
use crate::records::{Recruit, RecruitStatus, ResumeInfo};

#[derive(Default)]
struct ApplicationForm {
    full_name: Option<String>,
    email_address: Option<String>,
    contact_number: Option<String>,
    position_applied_for: Option<String>,
    referral_name: Option<String>,
    resume: Option<(ResumeInfo, Vec<u8>)>,
}

fn field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::bad_request(format!("{name}: is required")))
}

async fn read_form(multipart: &mut Multipart, max_resume_bytes: usize) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();
    while let Some(part) = multipart.next_field().await? {
        let name = part.name().unwrap_or_default().to_string();
        if name == "resume" {
            let file_name = part.file_name().unwrap_or("resume").to_string();
            let content_type = part
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = part.bytes().await?;
            if bytes.is_empty() {
                continue;
            }
            if bytes.len() > max_resume_bytes {
                return Err(AppError::payload_too_large(format!(
                    "resume exceeds {max_resume_bytes} bytes"
                )));
            }
            let info = ResumeInfo {
                file_name,
                content_type,
                size: bytes.len(),
            };
            form.resume = Some((info, bytes.to_vec()));
            continue;
        }

        let text = part
            .text()
            .await
            .map_err(|e| AppError::bad_request(format!("{name}: unreadable ({e})")))?;
        match name.as_str() {
            "fullName" => form.full_name = Some(text),
            "emailAddress" => form.email_address = Some(text),
            "contactNumber" => form.contact_number = Some(text),
            "positionAppliedFor" => form.position_applied_for = Some(text),
            "referralName" => form.referral_name = Some(text),
            other => tracing::debug!(field = %other, "ignoring unknown application field"),
        }
    }
    Ok(form)
}

/// Public application intake. No session required.
pub async fn submit_application(
    State(st): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Envelope<Recruit>>), AppError> {
    let mut multipart = multipart?;
    let form = read_form(&mut multipart, st.settings.max_resume_bytes).await?;

    let full_name = input_validator::required("fullName", field(&form.full_name, "fullName")?, MAX_NAME_LEN)?;
    let email_address = input_validator::email("emailAddress", field(&form.email_address, "emailAddress")?)?;
    let contact_number =
        input_validator::contact_number("contactNumber", field(&form.contact_number, "contactNumber")?)?;
    let position = input_validator::position(
        "positionAppliedFor",
        field(&form.position_applied_for, "positionAppliedFor")?,
    )?;
    let referral_name =
        input_validator::required("referralName", field(&form.referral_name, "referralName")?, MAX_NAME_LEN)?;

    let store = st.store.as_ref();
    let now = Utc::now();
    let recruit = Recruit {
        id: store.next_id()?,
        full_name,
        email_address,
        contact_number,
        position_applied_for: position.as_str().to_string(),
        referral_name,
        status: RecruitStatus::Pending,
        notes: None,
        resume: form.resume.as_ref().map(|(info, _)| info.clone()),
        created_at: now,
        updated_at: now,
    };
    if let Some((_, bytes)) = &form.resume {
        store.put_resume(recruit.id, bytes)?;
    }
    store.put_recruit(&recruit)?;

    tracing::info!(recruit_id = recruit.id, position = %position, "application submitted");
    activity::record(
        store,
        &Actor::anonymous(),
        actions::APPLICATION_SUBMITTED,
        Some(format!("#{} for {}", recruit.id, recruit.position_applied_for)),
    );

    Ok((
        StatusCode::CREATED,
        ok_with("Application submitted successfully", recruit),
    ))
}
