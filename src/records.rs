// Persisted record shapes for profiles, recruits, activity and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::{FilterAxis, Listable, SortKey};
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(()),
        }
    }
}

/// Staff account profile. The role lives here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_sign_in: Option<DateTime<Utc>>,
}

/// Login material kept apart from the profile, keyed by lowercased email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecruitStatus {
    Pending,
    Reviewed,
    Interviewed,
    Accepted,
    Rejected,
}

impl RecruitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecruitStatus::Pending => "Pending",
            RecruitStatus::Reviewed => "Reviewed",
            RecruitStatus::Interviewed => "Interviewed",
            RecruitStatus::Accepted => "Accepted",
            RecruitStatus::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for RecruitStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "pending" => Ok(RecruitStatus::Pending),
            "reviewed" => Ok(RecruitStatus::Reviewed),
            "interviewed" => Ok(RecruitStatus::Interviewed),
            "accepted" => Ok(RecruitStatus::Accepted),
            "rejected" => Ok(RecruitStatus::Rejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInfo {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// Submitted application, managed afterwards as a recruitment record.
///
/// `position_applied_for` is kept as submitted; visibility parses it on read
/// so a value outside the known ranks is only ever shown to `Sys Admin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recruit {
    pub id: u64,
    pub full_name: String,
    pub email_address: String,
    pub contact_number: String,
    pub position_applied_for: String,
    pub referral_name: String,
    pub status: RecruitStatus,
    pub notes: Option<String>,
    pub resume: Option<ResumeInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: u64,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Server-side half of a bearer session. Stored under the token digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// TOTP enrollment. The secret is sealed; see `secret_seal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaRecord {
    pub user_id: String,
    pub sealed_secret: String,
    pub enabled: bool,
    pub enrolled_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

fn day_of(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

const PROFILE_AXES: &[FilterAxis] = &[
    FilterAxis {
        field: "role",
        sentinel: "Role",
    },
    FilterAxis {
        field: "status",
        sentinel: "Status",
    },
    FilterAxis {
        field: "date",
        sentinel: "Date",
    },
];

impl Listable for Profile {
    fn filter_axes() -> &'static [FilterAxis] {
        PROFILE_AXES
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str(), self.email.as_str(), self.role.as_str()]
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "role" => Some(self.role.as_str().to_string()),
            "status" => Some(self.status.as_str().to_string()),
            "date" => Some(day_of(&self.created_at)),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "fullName" => Some(SortKey::text(&self.full_name)),
            "email" => Some(SortKey::text(&self.email)),
            "role" => Some(SortKey::text(self.role.as_str())),
            "status" => Some(SortKey::text(self.status.as_str())),
            "createdAt" => Some(SortKey::Date(Some(self.created_at))),
            _ => None,
        }
    }
}

const RECRUIT_AXES: &[FilterAxis] = &[
    FilterAxis {
        field: "position",
        sentinel: "Position",
    },
    FilterAxis {
        field: "status",
        sentinel: "Status",
    },
    FilterAxis {
        field: "date",
        sentinel: "Date",
    },
];

impl Listable for Recruit {
    fn filter_axes() -> &'static [FilterAxis] {
        RECRUIT_AXES
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.full_name.as_str(),
            self.email_address.as_str(),
            self.contact_number.as_str(),
            self.referral_name.as_str(),
            self.position_applied_for.as_str(),
        ]
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "position" => Some(self.position_applied_for.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "date" => Some(day_of(&self.created_at)),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Number(self.id)),
            "fullName" => Some(SortKey::text(&self.full_name)),
            "email" => Some(SortKey::text(&self.email_address)),
            "position" => Some(SortKey::text(&self.position_applied_for)),
            "status" => Some(SortKey::text(self.status.as_str())),
            "createdAt" => Some(SortKey::Date(Some(self.created_at))),
            _ => None,
        }
    }
}

const ACTIVITY_AXES: &[FilterAxis] = &[
    FilterAxis {
        field: "action",
        sentinel: "Action",
    },
    FilterAxis {
        field: "date",
        sentinel: "Date",
    },
];

impl Listable for ActivityLog {
    fn filter_axes() -> &'static [FilterAxis] {
        ACTIVITY_AXES
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.action.as_str()];
        if let Some(email) = &self.user_email {
            fields.push(email.as_str());
        }
        if let Some(details) = &self.details {
            fields.push(details.as_str());
        }
        fields
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "action" => Some(self.action.clone()),
            "date" => Some(day_of(&self.created_at)),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "action" => Some(SortKey::text(&self.action)),
            "userEmail" => Some(SortKey::text(self.user_email.as_deref().unwrap_or(""))),
            "createdAt" => Some(SortKey::Date(Some(self.created_at))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{apply, ListQuery, SortDirection};
    use chrono::TimeZone;

    fn recruit(id: u64, name: &str, position: &str, status: RecruitStatus, day: u32) -> Recruit {
        let at = Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap();
        Recruit {
            id,
            full_name: name.to_string(),
            email_address: format!("{}@example.com", name.to_lowercase()),
            contact_number: "09170000000".to_string(),
            position_applied_for: position.to_string(),
            referral_name: "Walk-in".to_string(),
            status,
            notes: None,
            resume: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn recruit_filters_use_position_status_and_day() {
        let rows = vec![
            recruit(1, "Ana", "Unit Head", RecruitStatus::Pending, 2),
            recruit(2, "Ben", "Unit Head", RecruitStatus::Accepted, 2),
            recruit(3, "Cara", "Branch Head", RecruitStatus::Pending, 3),
        ];
        let q = ListQuery::default()
            .with_filter("position", "Unit Head")
            .with_filter("status", "Pending")
            .with_filter("date", "2024-05-02");
        let page = apply(&rows, &q);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 1);

        let unset = ListQuery::default()
            .with_filter("position", "Position")
            .with_filter("status", "Status")
            .with_filter("date", "Date");
        assert_eq!(apply(&rows, &unset).total, 3);
    }

    #[test]
    fn recruits_sort_by_name_case_folded() {
        let rows = vec![
            recruit(1, "carlo", "Unit Head", RecruitStatus::Pending, 2),
            recruit(2, "Ana", "Unit Head", RecruitStatus::Pending, 2),
            recruit(3, "bea", "Unit Head", RecruitStatus::Pending, 2),
        ];
        let page = apply(&rows, &ListQuery::default().sorted_by("fullName", SortDirection::Asc));
        let ids: Vec<u64> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn activity_search_covers_optional_fields() {
        let log = ActivityLog {
            id: 1,
            user_id: None,
            user_email: Some("ops@example.com".to_string()),
            action: "signin".to_string(),
            details: Some("from mobile".to_string()),
            created_at: Utc::now(),
        };
        assert!(crate::listing::matches_search(&log, Some("MOBILE")));
        assert!(crate::listing::matches_search(&log, Some("ops@")));
        assert!(!crate::listing::matches_search(&log, Some("signout")));
    }
}
