use crate::domain::{Attendee, Company};
use crate::error::{ProspectError, Result};
use crate::storage::{ProspectRow, ResearchOutcome, Store};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Inner {
    companies: HashMap<i64, Company>,
    attendees: HashMap<i64, Attendee>,
    next_company_id: i64,
    next_attendee_id: i64,
}

/// In-memory store implementation for development/testing.
///
/// A single mutex guards both entity maps so `commit_research` is atomic with
/// respect to concurrent readers, matching the store contract.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_company(&self, company: &mut Company) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_company_id += 1;
        let id = inner.next_company_id;
        company.id = Some(id);
        inner.companies.insert(id, company.clone());

        debug!("Created company: {} with id {}", company.name, id);
        Ok(())
    }

    async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let inner = self.inner.lock().unwrap();
        let company = inner
            .companies
            .values()
            .find(|c| c.name == name)
            .cloned();
        Ok(company)
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let inner = self.inner.lock().unwrap();
        let mut companies: Vec<Company> = inner.companies.values().cloned().collect();
        companies.sort_by_key(|c| c.id);
        Ok(companies)
    }

    async fn pending_research(&self, limit: Option<usize>) -> Result<Vec<Company>> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<Company> = inner
            .companies
            .values()
            .filter(|c| c.researched_at.is_none())
            .cloned()
            .collect();
        pending.sort_by_key(|c| c.id);
        if let Some(limit) = limit {
            pending.truncate(limit);
        }
        Ok(pending)
    }

    async fn commit_research(&self, company_id: i64, outcome: &ResearchOutcome) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        let company = inner
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| ProspectError::Store {
                message: format!("Cannot commit research for unknown company {company_id}"),
            })?;

        company.overview = outcome.overview.clone();
        company.dc_count = outcome.dc_count;
        company.truck_count = outcome.truck_count;
        company.bullets = outcome.bullets.clone();
        company.hook = outcome.hook.clone();
        company.gate_fit_score = outcome.gate_fit_score;
        company.truck_fit_score = outcome.truck_fit_score;
        company.combined_score = outcome.combined_score;
        company.category = outcome.category;
        company.researched_at = Some(outcome.researched_at);

        for attendee in inner
            .attendees
            .values_mut()
            .filter(|a| a.company_id == company_id)
        {
            attendee.gate_fit_score = outcome.gate_fit_score;
            attendee.truck_fit_score = outcome.truck_fit_score;
            attendee.combined_score = outcome.combined_score;
        }

        debug!("Committed research for company {}", company_id);
        Ok(())
    }

    async fn create_attendee(&self, attendee: &mut Attendee) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.companies.contains_key(&attendee.company_id) {
            return Err(ProspectError::Store {
                message: format!(
                    "Attendee references unknown company {}",
                    attendee.company_id
                ),
            });
        }

        inner.next_attendee_id += 1;
        let id = inner.next_attendee_id;
        attendee.id = Some(id);
        inner.attendees.insert(id, attendee.clone());

        debug!(
            "Created attendee: {} {} with id {}",
            attendee.first_name, attendee.last_name, id
        );
        Ok(())
    }

    async fn attendee_exists(
        &self,
        first_name: &str,
        last_name: &str,
        company_id: i64,
    ) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.attendees.values().any(|a| {
            a.company_id == company_id && a.first_name == first_name && a.last_name == last_name
        }))
    }

    async fn count_attendees(&self) -> Result<usize> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.attendees.len())
    }

    async fn prospect_rows(&self) -> Result<Vec<ProspectRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ProspectRow> = inner
            .attendees
            .values()
            .filter_map(|a| {
                inner.companies.get(&a.company_id).map(|c| ProspectRow {
                    attendee: a.clone(),
                    company: c.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.attendee.id);
        Ok(rows)
    }

    async fn get_prospect(&self, attendee_id: i64) -> Result<Option<ProspectRow>> {
        let inner = self.inner.lock().unwrap();
        let row = inner.attendees.get(&attendee_id).and_then(|a| {
            inner.companies.get(&a.company_id).map(|c| ProspectRow {
                attendee: a.clone(),
                company: c.clone(),
            })
        });
        Ok(row)
    }
}
