use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role assigned to a profile.
///
/// `Unknown` stands in for any stored value outside the closed set so that
/// policy lookups stay total: it maps to the least privilege everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    FinancialAdvisor,
    UnitHeadAssociate,
    UnitHead,
    BranchHead,
    RegionHead,
    SysAdmin,
    Unknown,
}

impl Role {
    /// Every role a profile can legitimately hold.
    pub const KNOWN: [Role; 6] = [
        Role::FinancialAdvisor,
        Role::UnitHeadAssociate,
        Role::UnitHead,
        Role::BranchHead,
        Role::RegionHead,
        Role::SysAdmin,
    ];

    /// Lowest privilege; used whenever a role cannot be resolved.
    pub const FALLBACK: Role = Role::FinancialAdvisor;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FinancialAdvisor => "FA",
            Role::UnitHeadAssociate => "UHA",
            Role::UnitHead => "UH",
            Role::BranchHead => "BH",
            Role::RegionHead => "Region Head",
            Role::SysAdmin => "Sys Admin",
            Role::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown)
    }

    /// Parse a role tag, mapping anything unrecognized to `Unknown`.
    pub fn parse_lenient(input: &str) -> Role {
        input.parse().unwrap_or(Role::Unknown)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(input: &str) -> Result<Role, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "fa" | "financial advisor" => Ok(Role::FinancialAdvisor),
            "uha" | "unit head associate" => Ok(Role::UnitHeadAssociate),
            "uh" | "unit head" => Ok(Role::UnitHead),
            "bh" | "branch head" => Ok(Role::BranchHead),
            "region head" => Ok(Role::RegionHead),
            "sys admin" => Ok(Role::SysAdmin),
            _ => Err(()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse_lenient(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank an applicant applies for (`position_applied_for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Financial Advisor")]
    FinancialAdvisor,
    #[serde(rename = "Unit Head Associate")]
    UnitHeadAssociate,
    #[serde(rename = "Unit Head")]
    UnitHead,
    #[serde(rename = "Branch Head")]
    BranchHead,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::FinancialAdvisor,
        Position::UnitHeadAssociate,
        Position::UnitHead,
        Position::BranchHead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::FinancialAdvisor => "Financial Advisor",
            Position::UnitHeadAssociate => "Unit Head Associate",
            Position::UnitHead => "Unit Head",
            Position::BranchHead => "Branch Head",
        }
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(input: &str) -> Result<Position, Self::Err> {
        let wanted = input.trim();
        Position::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named application screen gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Dashboard,
    Recruitment,
    Accounts,
    ActivityLogs,
    Settings,
    Profile,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::Recruitment,
        Page::Accounts,
        Page::ActivityLogs,
        Page::Settings,
        Page::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Recruitment => "recruitment",
            Page::Accounts => "accounts",
            Page::ActivityLogs => "activity-logs",
            Page::Settings => "settings",
            Page::Profile => "profile",
        }
    }
}

impl FromStr for Page {
    type Err = ();

    fn from_str(input: &str) -> Result<Page, Self::Err> {
        let wanted = input.trim();
        Page::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or(())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_round_trip_through_serde() {
        for role in Role::KNOWN {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
        assert_eq!(serde_json::to_string(&Role::RegionHead).unwrap(), "\"Region Head\"");
    }

    #[test]
    fn unrecognized_role_becomes_unknown() {
        let role: Role = serde_json::from_str("\"Overlord\"").unwrap();
        assert_eq!(role, Role::Unknown);
        assert!(!role.is_known());
        assert_eq!(Role::parse_lenient(""), Role::Unknown);
    }

    #[test]
    fn positions_parse_case_insensitively() {
        assert_eq!("unit head".parse::<Position>(), Ok(Position::UnitHead));
        assert_eq!(" Branch Head ".parse::<Position>(), Ok(Position::BranchHead));
        assert!("Region Head".parse::<Position>().is_err());
    }

    #[test]
    fn page_ids_are_exact() {
        assert_eq!("activity-logs".parse::<Page>(), Ok(Page::ActivityLogs));
        assert!("Activity-Logs".parse::<Page>().is_err());
        assert!("billing".parse::<Page>().is_err());
    }
}
