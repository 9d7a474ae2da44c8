use crate::domain::{Attendee, Category, Company};
use crate::error::{ProspectError, Result};
use crate::storage::{ProspectRow, ResearchOutcome, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// SQLite-backed prospect store.
///
/// A single connection behind a mutex: batch passes are a single sequential
/// writer by design, and the read path tolerates waiting on in-flight commits.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const COMPANY_COLUMNS: &str = "id, name, website, industry, num_locations, employees, revenue, \
     overview, dc_count, truck_count, bullets, hook, \
     gate_fit_score, truck_fit_score, combined_score, category, researched_at, created_at";

const ATTENDEE_COLUMNS: &str = "id, first_name, last_name, company_id, job_title, job_function, \
     management_level, ticket_type, email, linkedin_url, rep, \
     gate_fit_score, truck_fit_score, combined_score, created_at";

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(include_str!(
            "../../migrations/001_create_companies_and_attendees.sql"
        ))?;
        info!("Opened prospect store at {}", db_path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    let bullets_json: String = row.get(10)?;
    let category_text: String = row.get(15)?;
    let researched_at: Option<String> = row.get(16)?;
    let created_at: String = row.get(17)?;

    Ok(Company {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        website: row.get(2)?,
        industry: row.get(3)?,
        num_locations: row.get(4)?,
        employees: row.get(5)?,
        revenue: row.get(6)?,
        overview: row.get(7)?,
        dc_count: row.get(8)?,
        truck_count: row.get(9)?,
        bullets: serde_json::from_str(&bullets_json).unwrap_or_default(),
        hook: row.get(11)?,
        gate_fit_score: row.get(12)?,
        truck_fit_score: row.get(13)?,
        combined_score: row.get(14)?,
        category: Category::parse(&category_text).unwrap_or(Category::Other),
        researched_at: researched_at.as_deref().and_then(parse_timestamp),
        created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
    })
}

fn attendee_from_row(row: &Row<'_>) -> rusqlite::Result<Attendee> {
    let created_at: String = row.get(14)?;
    Ok(Attendee {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        company_id: row.get(3)?,
        job_title: row.get(4)?,
        job_function: row.get(5)?,
        management_level: row.get(6)?,
        ticket_type: row.get(7)?,
        email: row.get(8)?,
        linkedin_url: row.get(9)?,
        rep: row.get(10)?,
        gate_fit_score: row.get(11)?,
        truck_fit_score: row.get(12)?,
        combined_score: row.get(13)?,
        created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_company(&self, company: &mut Company) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO companies (name, website, industry, num_locations, employees, revenue, \
             bullets, category, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                company.name,
                company.website,
                company.industry,
                company.num_locations,
                company.employees,
                company.revenue,
                serde_json::to_string(&company.bullets)?,
                company.category.as_str(),
                company.created_at.to_rfc3339(),
            ],
        )?;
        company.id = Some(conn.last_insert_rowid());
        debug!("Created company: {} with id {:?}", company.name, company.id);
        Ok(())
    }

    async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE name = ?1"
        ))?;
        let mut rows = stmt.query_map(params![name], company_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY id"
        ))?;
        let companies = stmt
            .query_map([], company_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(companies)
    }

    async fn pending_research(&self, limit: Option<usize>) -> Result<Vec<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE researched_at IS NULL ORDER BY id"
        ))?;
        let mut pending = stmt
            .query_map([], company_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if let Some(limit) = limit {
            pending.truncate(limit);
        }
        Ok(pending)
    }

    async fn commit_research(&self, company_id: i64, outcome: &ResearchOutcome) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE companies SET overview = ?1, dc_count = ?2, truck_count = ?3, bullets = ?4, \
             hook = ?5, gate_fit_score = ?6, truck_fit_score = ?7, combined_score = ?8, \
             category = ?9, researched_at = ?10 WHERE id = ?11",
            params![
                outcome.overview,
                outcome.dc_count,
                outcome.truck_count,
                serde_json::to_string(&outcome.bullets)?,
                outcome.hook,
                outcome.gate_fit_score,
                outcome.truck_fit_score,
                outcome.combined_score,
                outcome.category.as_str(),
                outcome.researched_at.to_rfc3339(),
                company_id,
            ],
        )?;
        if updated != 1 {
            return Err(ProspectError::Store {
                message: format!("Cannot commit research for unknown company {company_id}"),
            });
        }

        tx.execute(
            "UPDATE attendees SET gate_fit_score = ?1, truck_fit_score = ?2, combined_score = ?3 \
             WHERE company_id = ?4",
            params![
                outcome.gate_fit_score,
                outcome.truck_fit_score,
                outcome.combined_score,
                company_id,
            ],
        )?;

        tx.commit()?;
        debug!("Committed research for company {}", company_id);
        Ok(())
    }

    async fn create_attendee(&self, attendee: &mut Attendee) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO attendees (first_name, last_name, company_id, job_title, job_function, \
             management_level, ticket_type, email, linkedin_url, rep, \
             gate_fit_score, truck_fit_score, combined_score, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                attendee.first_name,
                attendee.last_name,
                attendee.company_id,
                attendee.job_title,
                attendee.job_function,
                attendee.management_level,
                attendee.ticket_type,
                attendee.email,
                attendee.linkedin_url,
                attendee.rep,
                attendee.gate_fit_score,
                attendee.truck_fit_score,
                attendee.combined_score,
                attendee.created_at.to_rfc3339(),
            ],
        )?;
        attendee.id = Some(conn.last_insert_rowid());
        debug!(
            "Created attendee: {} {} with id {:?}",
            attendee.first_name, attendee.last_name, attendee.id
        );
        Ok(())
    }

    async fn attendee_exists(
        &self,
        first_name: &str,
        last_name: &str,
        company_id: i64,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT 1 FROM attendees WHERE first_name = ?1 AND last_name = ?2 AND company_id = ?3",
        )?;
        Ok(stmt.exists(params![first_name, last_name, company_id])?)
    }

    async fn count_attendees(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM attendees", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn prospect_rows(&self) -> Result<Vec<ProspectRow>> {
        let conn = self.conn.lock().unwrap();
        let sql = joined_select("ORDER BY a.id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], prospect_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn get_prospect(&self, attendee_id: i64) -> Result<Option<ProspectRow>> {
        let conn = self.conn.lock().unwrap();
        let sql = joined_select("WHERE a.id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![attendee_id], prospect_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}

fn joined_select(suffix: &str) -> String {
    let attendee_cols = ATTENDEE_COLUMNS
        .split(", ")
        .map(|c| format!("a.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let company_cols = COMPANY_COLUMNS
        .split(", ")
        .map(|c| format!("c.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {attendee_cols}, {company_cols} \
         FROM attendees a JOIN companies c ON c.id = a.company_id {suffix}"
    )
}

fn prospect_from_row(row: &Row<'_>) -> rusqlite::Result<ProspectRow> {
    let attendee = attendee_from_row(row)?;

    // Company columns start after the 15 attendee columns
    let base = 15;
    let bullets_json: String = row.get(base + 10)?;
    let category_text: String = row.get(base + 15)?;
    let researched_at: Option<String> = row.get(base + 16)?;
    let created_at: String = row.get(base + 17)?;

    let company = Company {
        id: Some(row.get(base)?),
        name: row.get(base + 1)?,
        website: row.get(base + 2)?,
        industry: row.get(base + 3)?,
        num_locations: row.get(base + 4)?,
        employees: row.get(base + 5)?,
        revenue: row.get(base + 6)?,
        overview: row.get(base + 7)?,
        dc_count: row.get(base + 8)?,
        truck_count: row.get(base + 9)?,
        bullets: serde_json::from_str(&bullets_json).unwrap_or_default(),
        hook: row.get(base + 11)?,
        gate_fit_score: row.get(base + 12)?,
        truck_fit_score: row.get(base + 13)?,
        combined_score: row.get(base + 14)?,
        category: Category::parse(&category_text).unwrap_or(Category::Other),
        researched_at: researched_at.as_deref().and_then(parse_timestamp),
        created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
    };

    Ok(ProspectRow { attendee, company })
}
