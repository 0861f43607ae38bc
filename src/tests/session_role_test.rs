use crate::errors::CrmError;
use crate::role::{Page, Role};
use crate::session_role::SessionRoleCache;
use crate::tests::test_utils::ScriptedSource;

#[tokio::test]
async fn role_is_fetched_once_per_principal() {
    let source = ScriptedSource::signed_in("u1", vec![Ok(Role::BranchHead)]);
    let mut cache = SessionRoleCache::new();

    assert_eq!(cache.role(&source).await, Role::BranchHead);
    assert_eq!(cache.role(&source).await, Role::BranchHead);
    assert!(cache.can_access(&source, Page::ActivityLogs).await);
    assert!(!cache.can_access(&source, Page::Accounts).await);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_financial_advisor_and_is_not_cached() {
    let source = ScriptedSource::signed_in(
        "u1",
        vec![Err(CrmError::internal("network down")), Ok(Role::RegionHead)],
    );
    let mut cache = SessionRoleCache::new();

    assert_eq!(cache.role(&source).await, Role::FinancialAdvisor);
    assert_eq!(cache.cached(), None);
    assert_eq!(cache.role(&source).await, Role::RegionHead);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn no_session_means_lowest_privilege() {
    let source = ScriptedSource::signed_in("u1", vec![]);
    source.switch_user(None);
    let mut cache = SessionRoleCache::new();

    assert_eq!(cache.role(&source).await, Role::FinancialAdvisor);
    assert!(!cache.can_access(&source, Page::Recruitment).await);
    assert!(cache.can_access(&source, Page::Dashboard).await);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn sign_out_and_principal_change_invalidate() {
    let source = ScriptedSource::signed_in(
        "u1",
        vec![Ok(Role::SysAdmin), Ok(Role::UnitHead), Ok(Role::UnitHeadAssociate)],
    );
    let mut cache = SessionRoleCache::new();

    assert_eq!(cache.role(&source).await, Role::SysAdmin);

    source.switch_user(Some("u2"));
    assert_eq!(cache.role(&source).await, Role::UnitHead);

    cache.on_sign_out();
    assert_eq!(cache.cached(), None);
    assert_eq!(cache.role(&source).await, Role::UnitHeadAssociate);
    assert_eq!(source.fetch_count(), 3);
}

#[tokio::test]
async fn unknown_page_ids_deny_even_when_cached() {
    let source = ScriptedSource::signed_in("u1", vec![Ok(Role::RegionHead)]);
    let mut cache = SessionRoleCache::new();

    assert!(cache.can_access_page_id(&source, "accounts").await);
    assert!(!cache.can_access_page_id(&source, "payroll").await);
}

#[tokio::test]
async fn unknown_stored_role_is_cached_and_denies() {
    let source = ScriptedSource::signed_in("u1", vec![Ok(Role::Unknown)]);
    let mut cache = SessionRoleCache::new();

    for page in Page::ALL {
        assert!(!cache.can_access(&source, page).await, "{page}");
    }
    assert_eq!(source.fetch_count(), 1);
}
