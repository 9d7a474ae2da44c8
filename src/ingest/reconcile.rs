//! Reconciling the raw export into the company/attendee store. Safe to re-run
//! on the same or a superset export: companies are created once and never
//! overwritten, attendees are create-only behind the
//! (first name, last name, company) idempotency key.

use crate::domain::{Attendee, Company};
use crate::error::Result;
use crate::ingest::source::SourceRow;
use crate::storage::Store;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const COMPANY: &[&str] = &["Company"];
const WEBSITE: &[&str] = &["Website", "Domain"];
const INDUSTRY: &[&str] = &["Primary Industry"];
const NUM_LOCATIONS: &[&str] = &["Number of Locations"];
const EMPLOYEES: &[&str] = &["Employees"];
const REVENUE: &[&str] = &["Revenue Range (in USD)", "Revenue (in 000s USD)"];
const FIRST_NAME: &[&str] = &["First Name"];
const LAST_NAME: &[&str] = &["Last Name"];
const FULL_NAME: &[&str] = &["Full Name"];
const JOB_TITLE: &[&str] = &["Job Title", "Title"];
const JOB_FUNCTION: &[&str] = &["Job Function"];
const MANAGEMENT_LEVEL: &[&str] = &["Management Level"];
const TICKET_TYPE: &[&str] = &["Ticket Type"];
const EMAIL: &[&str] = &["Work Email", "Email Address"];
const LINKEDIN_URL: &[&str] = &["LinkedIn Contact Profile URL", "Linked In Profile URL"];
const REP: &[&str] = &["Rep"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub companies_created: usize,
    pub attendees_created: usize,
    pub duplicate_rows: usize,
    pub dropped_rows: usize,
}

#[derive(Default)]
struct CompanyDraft {
    website: String,
    industry: String,
    num_locations: String,
    employees: String,
    revenue: String,
}

impl CompanyDraft {
    /// First non-empty value seen wins; later rows only fill gaps.
    fn absorb(&mut self, row: &SourceRow) {
        fill(&mut self.website, row.get(WEBSITE));
        fill(&mut self.industry, row.get(INDUSTRY));
        fill(&mut self.num_locations, row.get(NUM_LOCATIONS));
        fill(&mut self.employees, row.get(EMPLOYEES));
        fill(&mut self.revenue, row.get(REVENUE));
    }
}

fn fill(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// Derive the attendee name for a row: prefer explicit first/last columns,
/// fall back to splitting a full-name column on the first whitespace run.
/// The remainder only becomes the last name when the last-name column is
/// also absent.
fn resolve_name(row: &SourceRow) -> (String, String) {
    let mut first = row.get(FIRST_NAME).to_string();
    let mut last = row.get(LAST_NAME).to_string();

    if first.is_empty() {
        let full = row.get(FULL_NAME);
        if !full.is_empty() {
            let mut parts = full.splitn(2, char::is_whitespace);
            first = parts.next().unwrap_or_default().trim().to_string();
            if last.is_empty() {
                last = parts.next().unwrap_or_default().trim().to_string();
            }
        }
    }

    (first, last)
}

/// Run one idempotent ingestion pass over the raw rows. All company creations
/// commit before any attendee creation, since attendee rows need a resolved
/// company id.
pub async fn ingest(store: &dyn Store, rows: &[SourceRow]) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    // Pass 1: aggregate per-company attributes, preserving first-seen order.
    let mut draft_order: Vec<String> = Vec::new();
    let mut drafts: HashMap<String, CompanyDraft> = HashMap::new();
    for row in rows {
        let name = row.get(COMPANY);
        if name.is_empty() {
            continue;
        }
        let draft = drafts.entry(name.to_string()).or_insert_with(|| {
            draft_order.push(name.to_string());
            CompanyDraft::default()
        });
        draft.absorb(row);
    }
    info!("Found {} unique companies in export", draft_order.len());

    // Pass 2: create companies that are not already present. Existing rows
    // are left untouched so manual or researched corrections survive
    // re-imports.
    let mut companies: HashMap<String, Company> = HashMap::new();
    for name in &draft_order {
        if let Some(existing) = store.get_company_by_name(name).await? {
            companies.insert(name.clone(), existing);
            continue;
        }
        let draft = &drafts[name];
        let mut company = Company::from_source(
            name.clone(),
            draft.website.clone(),
            draft.industry.clone(),
            crate::ingest::parse_count(&draft.num_locations),
            crate::ingest::parse_count(&draft.employees),
            if draft.revenue.is_empty() {
                None
            } else {
                Some(draft.revenue.clone())
            },
        );
        store.create_company(&mut company).await?;
        report.companies_created += 1;
        companies.insert(name.clone(), company);
    }

    // Pass 3: create attendees behind the idempotency key, snapshotting the
    // company's current scores.
    for row in rows {
        let company_name = row.get(COMPANY);
        let (first_name, last_name) = resolve_name(row);
        if company_name.is_empty() || first_name.is_empty() {
            report.dropped_rows += 1;
            continue;
        }

        let Some(company) = companies.get(company_name) else {
            warn!("Dropping attendee row: unresolved company '{company_name}'");
            report.dropped_rows += 1;
            continue;
        };
        let Some(company_id) = company.id else {
            warn!("Dropping attendee row: company '{company_name}' has no id");
            report.dropped_rows += 1;
            continue;
        };

        if store
            .attendee_exists(&first_name, &last_name, company_id)
            .await?
        {
            debug!("Skipping duplicate attendee {first_name} {last_name} at {company_name}");
            report.duplicate_rows += 1;
            continue;
        }

        let mut attendee = Attendee {
            id: None,
            first_name,
            last_name,
            company_id,
            job_title: row.get(JOB_TITLE).to_string(),
            job_function: row.get(JOB_FUNCTION).to_string(),
            management_level: row.get(MANAGEMENT_LEVEL).to_string(),
            ticket_type: row.get(TICKET_TYPE).to_string(),
            email: row.get(EMAIL).to_string(),
            linkedin_url: row.get(LINKEDIN_URL).to_string(),
            rep: row.get(REP).to_string(),
            gate_fit_score: company.gate_fit_score,
            truck_fit_score: company.truck_fit_score,
            combined_score: company.combined_score,
            created_at: Utc::now(),
        };
        store.create_attendee(&mut attendee).await?;
        report.attendees_created += 1;
    }

    info!(
        "Ingest complete: {} companies created, {} attendees created, {} duplicates, {} dropped",
        report.companies_created,
        report.attendees_created,
        report.duplicate_rows,
        report.dropped_rows
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name_prefers_explicit_columns() {
        let row = SourceRow::from_pairs(&[("First Name", "Ada"), ("Last Name", "Lovelace")]);
        assert_eq!(
            resolve_name(&row),
            ("Ada".to_string(), "Lovelace".to_string())
        );
    }

    #[test]
    fn resolve_name_splits_full_name_on_first_whitespace() {
        let row = SourceRow::from_pairs(&[("Full Name", "Grace Brewster Hopper")]);
        assert_eq!(
            resolve_name(&row),
            ("Grace".to_string(), "Brewster Hopper".to_string())
        );
    }

    #[test]
    fn resolve_name_keeps_supplied_last_name() {
        let row = SourceRow::from_pairs(&[("Full Name", "Grace Hopper"), ("Last Name", "Murray")]);
        assert_eq!(resolve_name(&row), ("Grace".to_string(), "Murray".to_string()));
    }

    #[test]
    fn resolve_name_single_token_full_name() {
        let row = SourceRow::from_pairs(&[("Full Name", "Prince")]);
        assert_eq!(resolve_name(&row), ("Prince".to_string(), String::new()));
    }
}
