use async_trait::async_trait;
use prospector::domain::Category;
use prospector::error::{ProspectError, Result};
use prospector::ingest::{self, read_rows_from};
use prospector::research::{Orchestrator, ResearchProvider, ResearchRequest};
use prospector::storage::{InMemoryStore, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const EXPORT: &str = "\
First Name,Last Name,Company,Primary Industry
Ann,Lee,Acme Freight,Logistics
Bob,Stone,Acme Freight,Logistics
Cara,Diaz,Blue Retail,Retail
";

/// Scripted provider: a canned response (or failure) per company name.
struct ScriptedProvider {
    responses: HashMap<String, std::result::Result<String, String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(responses: Vec<(&str, std::result::Result<&str, &str>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(k, v)| {
                    (
                        k.to_string(),
                        v.map(str::to_string).map_err(str::to_string),
                    )
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResearchProvider for ScriptedProvider {
    async fn research(&self, request: &ResearchRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(&request.company_name) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(ProspectError::Research {
                message: message.clone(),
            }),
            None => Err(ProspectError::Research {
                message: format!("no scripted response for {}", request.company_name),
            }),
        }
    }
}

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let rows = read_rows_from(EXPORT.as_bytes()).unwrap();
    ingest::ingest(store.as_ref(), &rows).await.unwrap();
    store
}

fn orchestrator(store: Arc<InMemoryStore>, provider: ScriptedProvider) -> Orchestrator {
    Orchestrator::new(store, Arc::new(provider), Duration::ZERO)
}

#[tokio::test]
async fn fenced_response_is_committed_and_fanned_out() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![
        (
            "Acme Freight",
            Ok("```json\n{\"overview\": \"Freight\", \"dc_count\": 14, \"truck_count\": 800, \
                \"gate_fit_score\": 60, \"truck_fit_score\": 60, \"hook\": \"Texas expansion\", \
                \"company_bullets\": [\"14 DCs (careers page)\"]}\n```"),
        ),
        (
            "Blue Retail",
            Ok(r#"{"gate_fit_score": 80, "truck_fit_score": 10}"#),
        ),
    ]);

    let report = orchestrator(store.clone(), provider).run_pass(None).await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.enriched, 2);
    assert!(report.failures.is_empty());

    let acme = store
        .get_company_by_name("Acme Freight")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acme.category, Category::Both);
    assert_eq!(acme.combined_score, 72);
    assert_eq!(acme.dc_count, 14);
    assert_eq!(acme.bullets, vec!["14 DCs (careers page)".to_string()]);
    assert!(acme.researched_at.is_some());

    // Both of Acme's attendees carry the refreshed snapshot.
    let rows = store.prospect_rows().await.unwrap();
    let acme_attendees: Vec<_> = rows
        .iter()
        .filter(|r| r.company.name == "Acme Freight")
        .collect();
    assert_eq!(acme_attendees.len(), 2);
    for row in acme_attendees {
        assert_eq!(row.attendee.combined_score, 72);
        assert_eq!(row.attendee.gate_fit_score, 60);
    }

    let blue = store
        .get_company_by_name("Blue Retail")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blue.category, Category::Gate);
    assert_eq!(blue.combined_score, 82);
}

#[tokio::test]
async fn one_failure_does_not_abort_the_pass() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![
        ("Acme Freight", Err("service unavailable")),
        (
            "Blue Retail",
            Ok(r#"{"gate_fit_score": 55, "truck_fit_score": 0}"#),
        ),
    ]);

    let report = orchestrator(store.clone(), provider).run_pass(None).await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "Acme Freight");

    // Failed company stays pending for a future run; the success sticks.
    let pending = store.pending_research(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "Acme Freight");
}

#[tokio::test]
async fn unparseable_response_leaves_company_pending() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![
        ("Acme Freight", Ok("Sorry, I could not find this company.")),
        ("Blue Retail", Ok(r#"{"truck_fit_score": 90}"#)),
    ]);

    let report = orchestrator(store.clone(), provider).run_pass(None).await.unwrap();
    assert_eq!(report.enriched, 1);
    assert_eq!(report.failures.len(), 1);

    let acme = store
        .get_company_by_name("Acme Freight")
        .await
        .unwrap()
        .unwrap();
    assert!(acme.researched_at.is_none());
    assert_eq!(acme.gate_fit_score, 0);
}

#[tokio::test]
async fn limit_truncates_the_queue_before_the_pass() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![
        ("Acme Freight", Ok(r#"{"gate_fit_score": 50, "truck_fit_score": 50}"#)),
        ("Blue Retail", Ok(r#"{"gate_fit_score": 50, "truck_fit_score": 50}"#)),
    ]);

    let report = orchestrator(store.clone(), provider).run_pass(Some(1)).await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(store.pending_research(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn already_enriched_companies_are_not_revisited() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![
        ("Acme Freight", Ok(r#"{"gate_fit_score": 50, "truck_fit_score": 50}"#)),
        ("Blue Retail", Ok(r#"{"gate_fit_score": 50, "truck_fit_score": 50}"#)),
    ]);
    let orchestrator = orchestrator(store.clone(), provider);

    orchestrator.run_pass(None).await.unwrap();
    let second = orchestrator.run_pass(None).await.unwrap();
    assert_eq!(second.attempted, 0);

    let summary = orchestrator.summary().await.unwrap();
    assert_eq!(summary.researched_companies, 2);
    assert_eq!(summary.total_companies, 2);
    assert_eq!(summary.both, 2);
    assert_eq!(summary.total_attendees, 3);
}
