//! End-to-end checks over the SQLite-backed store: ingest an export, commit
//! research, and read back through the query engine and detail lookup.

use chrono::Utc;
use prospector::domain::Category;
use prospector::ingest::{self, read_rows_from};
use prospector::query::{self, ProspectFilter, ProspectQuery};
use prospector::storage::{ResearchOutcome, SqliteStore, Store};

const EXPORT: &str = "\
First Name,Last Name,Company,Website,Job Title,Ticket Type
Ann,Lee,Acme Freight,acme.example,VP Operations,Retailer/CPG
Bob,Stone,Acme Freight,acme.example,Director,Retailer/CPG
Cara,Diaz,Blue Retail,blue.example,Buyer,Retailer/CPG
Dev,Moss,Corner Shop,corner.example,Owner,Exhibitor/Sponsor
";

fn outcome(gate: i64, truck: i64) -> ResearchOutcome {
    ResearchOutcome {
        overview: "A company".to_string(),
        dc_count: 10,
        truck_count: 100,
        bullets: vec!["fact (source)".to_string()],
        hook: "Recent expansion".to_string(),
        gate_fit_score: gate,
        truck_fit_score: truck,
        combined_score: prospector::scoring::combined_score(gate, truck),
        category: prospector::scoring::category(gate, truck),
        researched_at: Utc::now(),
    }
}

async fn seeded_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("prospects.db")).unwrap();
    let rows = read_rows_from(EXPORT.as_bytes()).unwrap();
    ingest::ingest(&store, &rows).await.unwrap();

    let acme = store
        .get_company_by_name("Acme Freight")
        .await
        .unwrap()
        .unwrap();
    store
        .commit_research(acme.id.unwrap(), &outcome(80, 10))
        .await
        .unwrap();
    let blue = store
        .get_company_by_name("Blue Retail")
        .await
        .unwrap()
        .unwrap();
    store
        .commit_research(blue.id.unwrap(), &outcome(60, 70))
        .await
        .unwrap();

    (dir, store)
}

#[tokio::test]
async fn sqlite_round_trip_preserves_research_fields() {
    let (dir, store) = seeded_store().await;
    drop(store);

    // Reopen the same database file; everything must survive.
    let store = SqliteStore::open(dir.path().join("prospects.db")).unwrap();
    let acme = store
        .get_company_by_name("Acme Freight")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acme.category, Category::Gate);
    assert_eq!(acme.combined_score, 82);
    assert_eq!(acme.bullets, vec!["fact (source)".to_string()]);
    assert!(acme.researched_at.is_some());

    let pending = store.pending_research(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "Corner Shop");
}

#[tokio::test]
async fn commit_research_fans_out_to_all_attendees() {
    let (_dir, store) = seeded_store().await;

    let rows = store.prospect_rows().await.unwrap();
    for row in rows.iter().filter(|r| r.company.name == "Acme Freight") {
        assert_eq!(row.attendee.gate_fit_score, 80);
        assert_eq!(row.attendee.combined_score, 82);
    }
    // Unresearched company attendees keep the zero snapshot.
    let dev = rows
        .iter()
        .find(|r| r.attendee.first_name == "Dev")
        .unwrap();
    assert_eq!(dev.attendee.combined_score, 0);
}

#[tokio::test]
async fn gate_filter_ranks_and_dedupes_over_sqlite_rows() {
    let (_dir, store) = seeded_store().await;
    let rows = store.prospect_rows().await.unwrap();

    let page = query::run(
        rows,
        &ProspectQuery {
            filter: ProspectFilter::Gate,
            ..Default::default()
        },
    );
    // Acme (gate 80, category gate) and Blue (gate 60, category both),
    // one attendee each after dedupe.
    assert_eq!(page.total, 2);
    assert_eq!(page.prospects[0].company.name, "Acme Freight");
    assert_eq!(page.prospects[0].attendee.first_name, "Ann");
    assert_eq!(page.prospects[1].company.name, "Blue Retail");
}

#[tokio::test]
async fn detail_lookup_returns_joined_row_or_none() {
    let (_dir, store) = seeded_store().await;

    let rows = store.prospect_rows().await.unwrap();
    let ann_id = rows
        .iter()
        .find(|r| r.attendee.first_name == "Ann")
        .and_then(|r| r.attendee.id)
        .unwrap();

    let detail = store.get_prospect(ann_id).await.unwrap().unwrap();
    assert_eq!(detail.company.name, "Acme Freight");
    assert_eq!(detail.company.hook, "Recent expansion");
    assert_eq!(detail.attendee.job_title, "VP Operations");

    assert!(store.get_prospect(99_999).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_ingest_is_idempotent() {
    let (_dir, store) = seeded_store().await;
    let rows = read_rows_from(EXPORT.as_bytes()).unwrap();

    let report = ingest::ingest(&store, &rows).await.unwrap();
    assert_eq!(report.companies_created, 0);
    assert_eq!(report.attendees_created, 0);
    assert_eq!(report.duplicate_rows, 4);
    assert_eq!(store.count_attendees().await.unwrap(), 4);

    // Identity fields on researched companies are untouched by the re-run.
    let blue = store
        .get_company_by_name("Blue Retail")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blue.website, "blue.example");
    assert_eq!(blue.category, Category::Both);
}
