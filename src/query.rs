//! Ranked, deduplicated, paginated views over the joined attendee/company
//! rows. Pure over its inputs: the HTTP layer fetches rows from the store and
//! hands them here.

use crate::domain::Category;
use crate::storage::ProspectRow;
use std::cmp::Reverse;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProspectFilter {
    #[default]
    All,
    Gate,
    Truck,
    Other,
}

impl ProspectFilter {
    pub fn parse(s: &str) -> Option<ProspectFilter> {
        match s {
            "all" => Some(ProspectFilter::All),
            "gate" => Some(ProspectFilter::Gate),
            "truck" => Some(ProspectFilter::Truck),
            "other" => Some(ProspectFilter::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProspectQuery {
    pub filter: ProspectFilter,
    pub search: Option<String>,
    pub dedupe: bool,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ProspectQuery {
    fn default() -> Self {
        Self {
            filter: ProspectFilter::All,
            search: None,
            dedupe: true,
            limit: 20,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProspectPage {
    /// Size of the filtered+deduped set before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub prospects: Vec<ProspectRow>,
}

/// Filter, search, rank, dedupe, and paginate in that order. Dedupe runs
/// after ordering so each company keeps the attendee that ranks first under
/// the active filter's sort.
pub fn run(mut rows: Vec<ProspectRow>, query: &ProspectQuery) -> ProspectPage {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    // UX guard, not an error: single-character searches match too much to be
    // useful, so they short-circuit to an empty page.
    if let Some(term) = search {
        if term.chars().count() < 2 {
            return ProspectPage {
                total: 0,
                limit: query.limit,
                offset: query.offset,
                prospects: Vec::new(),
            };
        }
    }

    match query.filter {
        ProspectFilter::Gate => {
            rows.retain(|r| matches!(r.company.category, Category::Gate | Category::Both));
            rows.sort_by_key(|r| (Reverse(r.attendee.gate_fit_score), row_id(r)));
        }
        ProspectFilter::Truck => {
            rows.retain(|r| matches!(r.company.category, Category::Truck | Category::Both));
            rows.sort_by_key(|r| (Reverse(r.attendee.truck_fit_score), row_id(r)));
        }
        ProspectFilter::Other => {
            rows.retain(|r| r.company.category == Category::Other);
            rows.sort_by(|a, b| {
                (a.company.name.as_str(), row_id(a)).cmp(&(b.company.name.as_str(), row_id(b)))
            });
        }
        ProspectFilter::All => {
            rows.sort_by_key(|r| (Reverse(r.attendee.combined_score), row_id(r)));
        }
    }

    if let Some(term) = search {
        let needle = term.to_lowercase();
        rows.retain(|r| {
            r.attendee.first_name.to_lowercase().contains(&needle)
                || r.attendee.last_name.to_lowercase().contains(&needle)
                || r.company.name.to_lowercase().contains(&needle)
        });
    }

    // One attendee per company, but only when no search is active: a text
    // search is assumed to target a specific person.
    if query.dedupe && search.is_none() {
        let mut seen = HashSet::new();
        rows.retain(|r| seen.insert(r.attendee.company_id));
    }

    let total = rows.len();
    let prospects = rows
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    ProspectPage {
        total,
        limit: query.limit,
        offset: query.offset,
        prospects,
    }
}

fn row_id(row: &ProspectRow) -> i64 {
    row.attendee.id.unwrap_or(i64::MAX)
}
