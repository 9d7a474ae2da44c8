//! The resumable research pass. One bounded enrichment attempt per pending
//! company, fixed pacing between calls, per-company failure isolation: a
//! failed company is logged, stays pending, and the pass moves on.

use crate::domain::{Category, Company};
use crate::error::{ProspectError, Result};
use crate::research::parser::parse_findings;
use crate::research::provider::{ResearchProvider, ResearchRequest};
use crate::scoring;
use crate::storage::{ResearchOutcome, Store};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub struct Orchestrator {
    store: Arc<dyn Store>,
    provider: Arc<dyn ResearchProvider>,
    delay: Duration,
}

/// Result of one enrichment pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub attempted: usize,
    pub enriched: usize,
    /// (company name, error) for every isolated failure.
    pub failures: Vec<(String, String)>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn ResearchProvider>, delay: Duration) -> Self {
        Self {
            store,
            provider,
            delay,
        }
    }

    /// Run one pass over every pending company, optionally truncated to
    /// `limit`. Companies already enriched before a mid-pass failure keep
    /// their results; failed companies remain pending for a future run.
    pub async fn run_pass(&self, limit: Option<usize>) -> Result<PassReport> {
        let queue = self.store.pending_research(limit).await?;
        let total = queue.len();
        info!("Research pass starting: {} pending companies", total);
        println!("Companies to research: {total}");

        let mut report = PassReport::default();
        for (i, company) in queue.iter().enumerate() {
            println!("\n[{}/{}] Researching: {}", i + 1, total, company.name);
            report.attempted += 1;

            match self.enrich_company(company).await {
                Ok(outcome) => {
                    report.enriched += 1;
                    println!(
                        "  ✓ DCs: {}, Trucks: {}",
                        outcome.dc_count, outcome.truck_count
                    );
                    println!(
                        "  ✓ Gate: {}, Truck: {}, Category: {}",
                        outcome.gate_fit_score, outcome.truck_fit_score, outcome.category
                    );
                    if !outcome.bullets.is_empty() {
                        println!("  ✓ {} bullets", outcome.bullets.len());
                    }
                }
                Err(e) => {
                    warn!("Research failed for {}: {}", company.name, e);
                    println!("  ✗ Error: {e}");
                    report.failures.push((company.name.clone(), e.to_string()));
                }
            }

            // Fixed pacing after every attempt, success or failure.
            tokio::time::sleep(self.delay).await;
        }

        info!(
            "Research pass finished: {}/{} enriched",
            report.enriched, report.attempted
        );
        Ok(report)
    }

    /// One bounded attempt: call, parse, score, commit. Commit covers the
    /// company's research fields, the completion marker, and the score
    /// fan-out to its attendees, as one transaction.
    #[instrument(skip(self, company), fields(company = %company.name))]
    async fn enrich_company(&self, company: &Company) -> Result<ResearchOutcome> {
        let company_id = company.id.ok_or_else(|| ProspectError::Store {
            message: format!("Company '{}' has no id", company.name),
        })?;

        let request = ResearchRequest {
            company_name: company.name.clone(),
            industry: company.industry.clone(),
            num_locations: company.num_locations,
            employees: company.employees,
            website: company.website.clone(),
        };

        let response_text = self.provider.research(&request).await?;
        let findings = parse_findings(&response_text)?;

        let gate = findings.gate_fit_score;
        let truck = findings.truck_fit_score;
        let outcome = ResearchOutcome {
            overview: findings.overview,
            dc_count: findings.dc_count,
            truck_count: findings.truck_count,
            bullets: findings.company_bullets,
            hook: findings.hook,
            gate_fit_score: gate,
            truck_fit_score: truck,
            combined_score: scoring::combined_score(gate, truck),
            category: scoring::category(gate, truck),
            researched_at: Utc::now(),
        };

        self.store.commit_research(company_id, &outcome).await?;
        Ok(outcome)
    }

    pub async fn summary(&self) -> Result<ResearchSummary> {
        let companies = self.store.list_companies().await?;
        let total_attendees = self.store.count_attendees().await?;

        let mut summary = ResearchSummary {
            total_companies: companies.len(),
            researched_companies: companies.iter().filter(|c| c.researched_at.is_some()).count(),
            total_attendees,
            ..Default::default()
        };
        for company in &companies {
            match company.category {
                Category::Gate => summary.gate += 1,
                Category::Truck => summary.truck += 1,
                Category::Both => summary.both += 1,
                Category::Other => summary.other += 1,
            }
            for (threshold, count) in summary.gate_score_buckets.iter_mut() {
                if company.gate_fit_score >= *threshold {
                    *count += 1;
                }
            }
        }
        Ok(summary)
    }
}

/// Post-pass store breakdown, printed after batch runs.
#[derive(Debug)]
pub struct ResearchSummary {
    pub total_companies: usize,
    pub researched_companies: usize,
    pub total_attendees: usize,
    pub gate: usize,
    pub truck: usize,
    pub both: usize,
    pub other: usize,
    pub gate_score_buckets: Vec<(i64, usize)>,
}

impl Default for ResearchSummary {
    fn default() -> Self {
        Self {
            total_companies: 0,
            researched_companies: 0,
            total_attendees: 0,
            gate: 0,
            truck: 0,
            both: 0,
            other: 0,
            gate_score_buckets: vec![(90, 0), (70, 0), (50, 0)],
        }
    }
}

impl std::fmt::Display for ResearchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Companies: {}/{} researched",
            self.researched_companies, self.total_companies
        )?;
        writeln!(f, "Attendees: {}", self.total_attendees)?;
        writeln!(f, "\nCategory breakdown:")?;
        writeln!(f, "  gate: {}", self.gate)?;
        writeln!(f, "  truck: {}", self.truck)?;
        writeln!(f, "  both: {}", self.both)?;
        writeln!(f, "  other: {}", self.other)?;
        writeln!(f, "\nGate fit score distribution:")?;
        for (threshold, count) in &self.gate_score_buckets {
            writeln!(f, "  {threshold}+: {count}")?;
        }
        Ok(())
    }
}
