use crate::domain::{Attendee, Category, Company};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// One attendee joined to its company, the unit the query engine ranks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProspectRow {
    pub attendee: Attendee,
    pub company: Company,
}

/// The full result of one successful research call, committed as a single
/// transactional unit: company research fields + completion marker + score
/// fan-out to every attendee of the company.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub overview: String,
    pub dc_count: i64,
    pub truck_count: i64,
    pub bullets: Vec<String>,
    pub hook: String,
    pub gate_fit_score: i64,
    pub truck_fit_score: i64,
    pub combined_score: i64,
    pub category: Category,
    pub researched_at: DateTime<Utc>,
}

/// Storage boundary for the prospect store. The core never assumes a specific
/// engine, only these operations and the atomicity of `commit_research`.
#[async_trait]
pub trait Store: Send + Sync {
    // Company operations
    async fn create_company(&self, company: &mut Company) -> Result<()>;
    async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>>;
    async fn list_companies(&self) -> Result<Vec<Company>>;
    /// Companies whose `researched_at` is still unset, optionally truncated.
    /// Order among them is store-defined and not a contract.
    async fn pending_research(&self, limit: Option<usize>) -> Result<Vec<Company>>;
    /// Commit research fields, the completion marker, and the denormalized
    /// score snapshot on every attendee of the company, atomically.
    async fn commit_research(&self, company_id: i64, outcome: &ResearchOutcome) -> Result<()>;

    // Attendee operations
    async fn create_attendee(&self, attendee: &mut Attendee) -> Result<()>;
    async fn attendee_exists(
        &self,
        first_name: &str,
        last_name: &str,
        company_id: i64,
    ) -> Result<bool>;
    async fn count_attendees(&self) -> Result<usize>;

    // Read path
    async fn prospect_rows(&self) -> Result<Vec<ProspectRow>>;
    async fn get_prospect(&self, attendee_id: i64) -> Result<Option<ProspectRow>>;
}
