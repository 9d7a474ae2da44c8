use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed classification of a company derived from its two fit scores.
/// Only `scoring::category` produces values of this type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gate,
    Truck,
    Both,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gate => "gate",
            Category::Truck => "truck",
            Category::Both => "both",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "gate" => Some(Category::Gate),
            "truck" => Some(Category::Truck),
            "both" => Some(Category::Both),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated company entity keyed by name, the unit of research enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Option<i64>,
    pub name: String,

    // From the attendee source export
    pub website: String,
    pub industry: String,
    pub num_locations: i64,
    pub employees: i64,
    /// Kept as opaque text ("Over $5 bil." etc.), never parsed numerically.
    pub revenue: Option<String>,

    // Research results
    pub overview: String,
    pub dc_count: i64,
    pub truck_count: i64,
    pub bullets: Vec<String>,
    pub hook: String,

    // Fit scores (0-100; combined may exceed 100 and is never clamped)
    pub gate_fit_score: i64,
    pub truck_fit_score: i64,
    pub combined_score: i64,
    pub category: Category,

    /// None until a research pass has committed for this company.
    pub researched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// A new company carries only source-export identity fields; research and
    /// derived fields start at their zero defaults.
    pub fn from_source(
        name: String,
        website: String,
        industry: String,
        num_locations: i64,
        employees: i64,
        revenue: Option<String>,
    ) -> Self {
        Self {
            id: None,
            name,
            website,
            industry,
            num_locations,
            employees,
            revenue,
            overview: String::new(),
            dc_count: 0,
            truck_count: 0,
            bullets: Vec::new(),
            hook: String::new(),
            gate_fit_score: 0,
            truck_fit_score: 0,
            combined_score: 0,
            category: Category::Other,
            researched_at: None,
            created_at: Utc::now(),
        }
    }
}

/// A person record belonging to exactly one company.
///
/// `(first_name, last_name, company)` is the ingestion idempotency key; the
/// three score fields are a denormalized snapshot refreshed by the research
/// orchestrator whenever the company is re-scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub company_id: i64,

    pub job_title: String,
    pub job_function: String,
    pub management_level: String,
    pub ticket_type: String,
    pub email: String,
    pub linkedin_url: String,
    /// Assigned sales rep tag from the source export.
    pub rep: String,

    pub gate_fit_score: i64,
    pub truck_fit_score: i64,
    pub combined_score: i64,

    pub created_at: DateTime<Utc>,
}

impl Attendee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
