use crate::errors::{CrmError, CrmResult};
use crate::records::ActivityLog;

pub const ACTIVITY_HEADER: [&str; 6] = ["id", "createdAt", "userId", "userEmail", "action", "details"];

pub fn activity_csv(logs: &[ActivityLog]) -> CrmResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(ACTIVITY_HEADER)
        .map_err(|e| CrmError::internal(format!("csv header: {e}")))?;
    for log in logs {
        writer
            .write_record([
                log.id.to_string(),
                log.created_at.to_rfc3339(),
                log.user_id.clone().unwrap_or_default(),
                log.user_email.clone().unwrap_or_default(),
                log.action.clone(),
                log.details.clone().unwrap_or_default(),
            ])
            .map_err(|e| CrmError::internal(format!("csv row {}: {e}", log.id)))?;
    }
    writer
        .into_inner()
        .map_err(|e| CrmError::internal(format!("csv flush: {e}")))
}

pub fn export_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("activity-logs-{}.csv", now.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quotes_commas_quotes_and_newlines() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let logs = vec![ActivityLog {
            id: 7,
            user_id: Some("u1".into()),
            user_email: Some("ana@example.com".into()),
            action: "page_view".into(),
            details: Some("opened \"Accounts\", then\nleft".into()),
            created_at: at,
        }];
        let text = String::from_utf8(activity_csv(&logs).unwrap()).unwrap();
        let mut lines = text.splitn(2, '\n');
        assert_eq!(lines.next(), Some("id,createdAt,userId,userEmail,action,details"));
        assert_eq!(
            lines.next(),
            Some("7,2024-05-01T09:30:00+00:00,u1,ana@example.com,page_view,\"opened \"\"Accounts\"\", then\nleft\"\n")
        );
    }

    #[test]
    fn anonymous_rows_have_empty_cells() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let logs = vec![ActivityLog {
            id: 1,
            user_id: None,
            user_email: None,
            action: "application_submitted".into(),
            details: None,
            created_at: at,
        }];
        let text = String::from_utf8(activity_csv(&logs).unwrap()).unwrap();
        assert!(text.ends_with("1,2024-05-01T00:00:00+00:00,,,application_submitted,\n"));
        assert_eq!(export_file_name(at), "activity-logs-20240501-000000.csv");
    }
}
