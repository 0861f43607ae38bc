//! Search, filter, sort and paginate over an already-fetched list.
//!
//! Used by the account, recruit and activity-log listings. Every step is a
//! pure function of the records and the [`ListQuery`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::errors::{CrmError, CrmResult};
use crate::input_validator::is_date;

/// One filterable field and the placeholder value meaning "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterAxis {
    pub field: &'static str,
    pub sentinel: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Date(Option<DateTime<Utc>>),
    Number(u64),
}

impl SortKey {
    /// Text keys are case-folded so "alice" and "Alice" sort together.
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }
}

pub trait Listable {
    fn filter_axes() -> &'static [FilterAxis];

    fn search_fields(&self) -> Vec<&str>;

    fn filter_value(&self, field: &str) -> Option<String>;

    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
    pub sort: Option<SortSpec>,
    pub page: usize,
    /// `None` puts every filtered record on a single page.
    pub page_size: Option<usize>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            filters: Vec::new(),
            sort: None,
            page: 1,
            page_size: None,
        }
    }
}

const DATE_SENTINEL: &str = "Date";

const RESERVED_PARAMS: [&str; 5] = ["search", "sort", "dir", "page", "pageSize"];

impl ListQuery {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.filters.push((field.to_string(), value.to_string()));
        self
    }

    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn paged(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }

    /// Build a query from URL parameters. Unreserved keys are filters.
    pub fn from_params(params: &HashMap<String, String>) -> CrmResult<Self> {
        let mut query = ListQuery::default();

        if let Some(search) = params.get("search") {
            if !search.trim().is_empty() {
                query.search = Some(search.clone());
            }
        }

        if let Some(field) = params.get("sort").filter(|f| !f.trim().is_empty()) {
            let direction = match params.get("dir").map(|d| d.to_lowercase()).as_deref() {
                None | Some("") | Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(_) => return Err(CrmError::validation("dir", "expected asc or desc")),
            };
            query.sort = Some(SortSpec {
                field: field.clone(),
                direction,
            });
        }

        if let Some(page) = params.get("page") {
            query.page = page
                .parse::<usize>()
                .map_err(|_| CrmError::validation("page", "expected a positive integer"))?;
        }

        if let Some(size) = params.get("pageSize") {
            let size = size
                .parse::<usize>()
                .map_err(|_| CrmError::validation("pageSize", "expected a positive integer"))?;
            if size == 0 {
                return Err(CrmError::validation("pageSize", "must be at least 1"));
            }
            query.page_size = Some(size);
        }

        let mut filters: Vec<(String, String)> = params
            .iter()
            .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        filters.sort();
        if let Some((_, day)) = filters.iter().find(|(k, _)| k == "date") {
            let day = day.trim();
            if !day.is_empty() && day != DATE_SENTINEL && !is_date(day) {
                return Err(CrmError::validation("date", "expected YYYY-MM-DD"));
            }
        }
        query.filters = filters;

        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

pub fn matches_search<T: Listable>(record: &T, search: Option<&str>) -> bool {
    let needle = match search.map(|s| s.trim().to_lowercase()) {
        Some(n) if !n.is_empty() => n,
        _ => return true,
    };
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Conjunctive exact-match test across every filter axis. A filter that is
/// empty, equal to its axis sentinel, or not an axis of `T` never excludes.
pub fn matches_filters<T: Listable>(record: &T, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(field, value)| {
        let axis = match T::filter_axes().iter().find(|a| a.field == field.as_str()) {
            Some(axis) => axis,
            None => return true,
        };
        if value.is_empty() || value.as_str() == axis.sentinel {
            return true;
        }
        record.filter_value(field).as_deref() == Some(value.as_str())
    })
}

/// Stable sort by a single field. Unknown fields leave the order untouched.
pub fn sort_records<T: Listable>(records: &mut [T], spec: &SortSpec) {
    records.sort_by(|a, b| {
        let ord = match (a.sort_key(&spec.field), b.sort_key(&spec.field)) {
            (Some(ka), Some(kb)) => ka.cmp(&kb),
            _ => Ordering::Equal,
        };
        match spec.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

pub fn apply<T: Listable + Clone>(records: &[T], query: &ListQuery) -> ListPage<T> {
    let mut filtered: Vec<T> = records
        .iter()
        .filter(|r| matches_search(*r, query.search.as_deref()))
        .filter(|r| matches_filters(*r, &query.filters))
        .cloned()
        .collect();

    if let Some(spec) = &query.sort {
        sort_records(&mut filtered, spec);
    }

    let total = filtered.len();
    let page_size = query.page_size.unwrap_or(total.max(1));
    let total_pages = page_count(total, page_size);
    let page = query.page.clamp(1, total_pages.max(1));

    let items: Vec<T> = filtered
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    ListPage {
        items,
        total,
        total_pages,
        page,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: String,
        team: String,
        tier: String,
    }

    const AXES: &[FilterAxis] = &[
        FilterAxis {
            field: "team",
            sentinel: "Team",
        },
        FilterAxis {
            field: "tier",
            sentinel: "Tier",
        },
    ];

    impl Listable for Row {
        fn filter_axes() -> &'static [FilterAxis] {
            AXES
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name.as_str()]
        }

        fn filter_value(&self, field: &str) -> Option<String> {
            match field {
                "team" => Some(self.team.clone()),
                "tier" => Some(self.tier.clone()),
                _ => None,
            }
        }

        fn sort_key(&self, field: &str) -> Option<SortKey> {
            match field {
                "name" => Some(SortKey::text(&self.name)),
                _ => None,
            }
        }
    }

    fn row(name: &str, team: &str, tier: &str) -> Row {
        Row {
            name: name.to_string(),
            team: team.to_string(),
            tier: tier.to_string(),
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let rows = vec![row("Maria Santos", "A", "1"), row("Jose Rizal", "B", "2")];
        let page = apply(&rows, &ListQuery::default().with_search("SANT"));
        assert_eq!(page.items, vec![rows[0].clone()]);
    }

    #[test]
    fn sentinel_never_excludes() {
        let rows = vec![row("a", "A", "1"), row("b", "B", "2")];
        let page = apply(
            &rows,
            &ListQuery::default()
                .with_filter("team", "Team")
                .with_filter("tier", ""),
        );
        assert_eq!(page.total, 2);
    }

    #[test]
    fn filters_compose_conjunctively() {
        let rows = vec![
            row("ann", "A", "1"),
            row("ben", "A", "2"),
            row("cid", "B", "1"),
            row("ann two", "A", "1"),
        ];
        for r in &rows {
            let q = ListQuery::default()
                .with_search("ann")
                .with_filter("team", "A")
                .with_filter("tier", "1");
            let expected = matches_search(r, Some("ann"))
                && r.team == "A"
                && r.tier == "1";
            assert_eq!(
                matches_search(r, q.search.as_deref()) && matches_filters(r, &q.filters),
                expected
            );
        }
        let page = apply(
            &rows,
            &ListQuery::default()
                .with_search("ann")
                .with_filter("team", "A")
                .with_filter("tier", "1"),
        );
        assert_eq!(page.total, 2);

        let relaxed = apply(
            &rows,
            &ListQuery::default()
                .with_search("ann")
                .with_filter("team", "A")
                .with_filter("tier", "Tier"),
        );
        assert_eq!(relaxed.total, 2);
        let no_team = apply(&rows, &ListQuery::default().with_filter("tier", "1"));
        assert_eq!(no_team.total, 3);
    }

    #[test]
    fn filter_values_match_exactly() {
        let rows = vec![row("a", "Alpha", "1")];
        let page = apply(&rows, &ListQuery::default().with_filter("team", "alpha"));
        assert_eq!(page.total, 0);
    }

    #[test]
    fn reversing_twice_restores_order() {
        let rows = vec![
            row("delta", "A", "1"),
            row("Alpha", "A", "1"),
            row("charlie", "A", "1"),
            row("Bravo", "A", "1"),
        ];
        let asc = ListQuery::default().sorted_by("name", SortDirection::Asc);
        let first = apply(&rows, &asc).items;
        let names: Vec<&str> = first.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "charlie", "delta"]);

        let mut current = first.clone();
        let mut dir = SortDirection::Asc;
        for _ in 0..2 {
            dir = dir.reversed();
            current = apply(&current, &ListQuery::default().sorted_by("name", dir)).items;
        }
        assert_eq!(current, first);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let rows = vec![row("same", "A", "1"), row("SAME", "B", "1"), row("same", "C", "1")];
        let page = apply(&rows, &ListQuery::default().sorted_by("name", SortDirection::Desc));
        let teams: Vec<&str> = page.items.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(teams, vec!["A", "B", "C"]);
    }

    #[test]
    fn eleven_records_in_pages_of_five() {
        let rows: Vec<Row> = (0..11).map(|i| row(&format!("r{i:02}"), "A", "1")).collect();
        let last = apply(&rows, &ListQuery::default().paged(3, 5));
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].name, "r10");

        for total in 0..30usize {
            assert_eq!(page_count(total, 5), (total + 4) / 5);
        }
    }

    #[test]
    fn page_out_of_range_is_clamped_not_wrapped() {
        let rows: Vec<Row> = (0..7).map(|i| row(&format!("r{i}"), "A", "1")).collect();
        let beyond = apply(&rows, &ListQuery::default().paged(9, 5));
        assert_eq!(beyond.page, 2);
        assert_eq!(beyond.items.len(), 2);

        let before = apply(&rows, &ListQuery::default().paged(0, 5));
        assert_eq!(before.page, 1);
        assert_eq!(before.items.len(), 5);
    }

    #[test]
    fn empty_input_has_no_pages() {
        let page = apply::<Row>(&[], &ListQuery::default().paged(1, 5));
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn params_split_into_reserved_and_filters() {
        let mut params = HashMap::new();
        params.insert("search".to_string(), "ann".to_string());
        params.insert("sort".to_string(), "name".to_string());
        params.insert("dir".to_string(), "DESC".to_string());
        params.insert("page".to_string(), "2".to_string());
        params.insert("pageSize".to_string(), "10".to_string());
        params.insert("team".to_string(), "A".to_string());

        let q = ListQuery::from_params(&params).unwrap();
        assert_eq!(q.search.as_deref(), Some("ann"));
        assert_eq!(
            q.sort,
            Some(SortSpec {
                field: "name".to_string(),
                direction: SortDirection::Desc
            })
        );
        assert_eq!(q.page, 2);
        assert_eq!(q.page_size, Some(10));
        assert_eq!(q.filters, vec![("team".to_string(), "A".to_string())]);

        params.insert("pageSize".to_string(), "0".to_string());
        assert!(ListQuery::from_params(&params).is_err());
    }

    #[test]
    fn date_filter_must_be_a_calendar_day() {
        let mut params = HashMap::new();
        params.insert("date".to_string(), "2024-03-01".to_string());
        assert!(ListQuery::from_params(&params).is_ok());

        params.insert("date".to_string(), "Date".to_string());
        assert!(ListQuery::from_params(&params).is_ok());

        params.insert("date".to_string(), "".to_string());
        assert!(ListQuery::from_params(&params).is_ok());

        params.insert("date".to_string(), "last tuesday".to_string());
        assert!(matches!(
            ListQuery::from_params(&params),
            Err(CrmError::Validation { .. })
        ));
    }
}
