//! Authoritative role tables.
//!
//! Both the page gate (client side and the page-gated API routes) and the
//! recruit visibility filter read from the two tables below. Nothing else in
//! the crate hard-codes role lists.

use serde::{Deserialize, Serialize};

use crate::role::{Page, Position, Role};

const STAFF: &[Role] = &[
    Role::FinancialAdvisor,
    Role::UnitHeadAssociate,
    Role::UnitHead,
    Role::BranchHead,
    Role::RegionHead,
];

/// Page -> roles allowed to render it. `Sys Admin` is implicit.
const PAGE_RULES: &[(Page, &[Role])] = &[
    (Page::Dashboard, STAFF),
    (
        Page::Recruitment,
        &[
            Role::UnitHeadAssociate,
            Role::UnitHead,
            Role::BranchHead,
            Role::RegionHead,
        ],
    ),
    (Page::Accounts, &[Role::RegionHead]),
    (Page::ActivityLogs, &[Role::BranchHead, Role::RegionHead]),
    (Page::Settings, STAFF),
    (Page::Profile, STAFF),
];

/// Viewer role -> applicant positions the viewer may see.
const POSITION_RULES: &[(Role, &[Position])] = &[
    (Role::FinancialAdvisor, &[]),
    (Role::UnitHeadAssociate, &[Position::FinancialAdvisor]),
    (
        Role::UnitHead,
        &[Position::FinancialAdvisor, Position::UnitHeadAssociate],
    ),
    (
        Role::BranchHead,
        &[
            Position::FinancialAdvisor,
            Position::UnitHeadAssociate,
            Position::UnitHead,
        ],
    ),
    (
        Role::RegionHead,
        &[
            Position::FinancialAdvisor,
            Position::UnitHeadAssociate,
            Position::UnitHead,
            Position::BranchHead,
        ],
    ),
];

/// Which recruit records a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every record, including ones with an unrecognized position.
    All,
    /// Only records whose position is in the set. May be empty.
    Positions(&'static [Position]),
}

impl Visibility {
    pub fn admits(&self, position_applied_for: &str) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Positions(allowed) => match position_applied_for.parse::<Position>() {
                Ok(position) => allowed.contains(&position),
                Err(()) => false,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Visibility::Positions(allowed) if allowed.is_empty())
    }

    pub fn positions(&self) -> Vec<Position> {
        match self {
            Visibility::All => Position::ALL.to_vec(),
            Visibility::Positions(allowed) => allowed.to_vec(),
        }
    }
}

/// Whether `role` may render `page`.
pub fn can_access(role: Role, page: Page) -> bool {
    if role == Role::SysAdmin {
        return true;
    }
    PAGE_RULES
        .iter()
        .find(|(p, _)| *p == page)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

/// Page check keyed by the raw page identifier. Unlisted pages deny,
/// except for `Sys Admin`.
pub fn can_access_page_id(role: Role, page_id: &str) -> bool {
    if role == Role::SysAdmin {
        return true;
    }
    match page_id.parse::<Page>() {
        Ok(page) => can_access(role, page),
        Err(()) => false,
    }
}

pub fn visibility_for(role: Role) -> Visibility {
    if role == Role::SysAdmin {
        return Visibility::All;
    }
    POSITION_RULES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, positions)| Visibility::Positions(*positions))
        .unwrap_or(Visibility::Positions(&[]))
}

pub fn accessible_pages(role: Role) -> Vec<Page> {
    Page::ALL
        .into_iter()
        .filter(|page| can_access(role, *page))
        .collect()
}

/// Capability list delivered to clients so they never keep their own copy
/// of the tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub user_id: String,
    pub role: Role,
    pub pages: Vec<Page>,
    pub visible_positions: Vec<Position>,
}

impl Capabilities {
    pub fn for_user(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            pages: accessible_pages(role),
            visible_positions: visibility_for(role).positions(),
        }
    }
}
