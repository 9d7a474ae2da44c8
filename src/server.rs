//! JSON read API over the prospect store, plus the session login endpoints.
//! Every failure mode maps to a structured response value; handlers never
//! panic or return empty data for auth failures.

use crate::auth::{self, SessionSet, SESSION_COOKIE};
use crate::config::{AuthConfig, Config};
use crate::query::{self, ProspectFilter, ProspectQuery};
use crate::storage::{ProspectRow, Store};
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionSet>,
    pub auth: AuthConfig,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "prospector",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if form.username.to_lowercase() == state.auth.username.to_lowercase()
        && form.password == state.auth.password
    {
        let token = state.sessions.issue();
        let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; Max-Age=86400; Path=/");
        return (
            [(header::SET_COOKIE, cookie)],
            Json(serde_json::json!({ "ok": true })),
        )
            .into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        state.sessions.revoke(&token);
    }
    let cookie = format!("{SESSION_COOKIE}=; Max-Age=0; Path=/");
    (
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

fn storage_failure(e: crate::error::ProspectError) -> Response {
    tracing::error!("Store read failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal error" })),
    )
        .into_response()
}

fn session_is_valid(state: &AppState, headers: &HeaderMap) -> bool {
    auth::session_token(headers)
        .map(|token| state.sessions.is_valid(&token))
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct ProspectParams {
    filter: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    dedupe: Option<bool>,
}

impl ProspectParams {
    fn into_query(self) -> ProspectQuery {
        ProspectQuery {
            filter: self
                .filter
                .as_deref()
                .and_then(ProspectFilter::parse)
                .unwrap_or_default(),
            search: self.search,
            dedupe: self.dedupe.unwrap_or(true),
            limit: self.limit.unwrap_or(20).clamp(1, 100),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Summary record for the prospect list view.
#[derive(Debug, Serialize)]
struct ProspectSummary {
    id: i64,
    name: String,
    company_name: String,
    job_title: String,
    dc_count: i64,
    truck_count: i64,
    gate_fit_score: i64,
    truck_fit_score: i64,
    hook: String,
    category: String,
    ticket_type: String,
}

impl From<&ProspectRow> for ProspectSummary {
    fn from(row: &ProspectRow) -> Self {
        Self {
            id: row.attendee.id.unwrap_or_default(),
            name: row.attendee.full_name(),
            company_name: row.company.name.clone(),
            job_title: row.attendee.job_title.clone(),
            dc_count: row.company.dc_count,
            truck_count: row.company.truck_count,
            gate_fit_score: row.attendee.gate_fit_score,
            truck_fit_score: row.attendee.truck_fit_score,
            hook: row.company.hook.clone(),
            category: row.company.category.to_string(),
            ticket_type: row.attendee.ticket_type.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProspectListResponse {
    total: usize,
    limit: usize,
    offset: usize,
    prospects: Vec<ProspectSummary>,
}

async fn list_prospects(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProspectParams>,
) -> Response {
    if !session_is_valid(&state, &headers) {
        return unauthorized();
    }

    let rows = match state.store.prospect_rows().await {
        Ok(rows) => rows,
        Err(e) => return storage_failure(e),
    };
    let page = query::run(rows, &params.into_query());

    Json(ProspectListResponse {
        total: page.total,
        limit: page.limit,
        offset: page.offset,
        prospects: page.prospects.iter().map(ProspectSummary::from).collect(),
    })
    .into_response()
}

/// Full detail record for one prospect.
#[derive(Debug, Serialize)]
struct ProspectDetail {
    id: i64,
    name: String,
    company_name: String,
    job_title: String,
    company_overview: String,
    dc_count: i64,
    truck_count: i64,
    gate_fit_score: i64,
    truck_fit_score: i64,
    combined_score: i64,
    category: String,
    hook: String,
    company_bullets: Vec<String>,
    email: String,
    linkedin_url: String,
    ticket_type: String,
    job_function: String,
    management_level: String,
    rep: String,
}

impl From<&ProspectRow> for ProspectDetail {
    fn from(row: &ProspectRow) -> Self {
        Self {
            id: row.attendee.id.unwrap_or_default(),
            name: row.attendee.full_name(),
            company_name: row.company.name.clone(),
            job_title: row.attendee.job_title.clone(),
            company_overview: row.company.overview.clone(),
            dc_count: row.company.dc_count,
            truck_count: row.company.truck_count,
            gate_fit_score: row.attendee.gate_fit_score,
            truck_fit_score: row.attendee.truck_fit_score,
            combined_score: row.attendee.combined_score,
            category: row.company.category.to_string(),
            hook: row.company.hook.clone(),
            company_bullets: row.company.bullets.clone(),
            email: row.attendee.email.clone(),
            linkedin_url: row.attendee.linkedin_url.clone(),
            ticket_type: row.attendee.ticket_type.clone(),
            job_function: row.attendee.job_function.clone(),
            management_level: row.attendee.management_level.clone(),
            rep: row.attendee.rep.clone(),
        }
    }
}

async fn get_prospect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(prospect_id): Path<i64>,
) -> Response {
    if !session_is_valid(&state, &headers) {
        return unauthorized();
    }

    match state.store.get_prospect(prospect_id).await {
        Ok(Some(row)) => Json(ProspectDetail::from(&row)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Not found" })),
        )
            .into_response(),
        Err(e) => storage_failure(e),
    }
}

/// Build the router with all routes and shared state.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/api/prospects", get(list_prospects))
        .route("/api/prospects/:id", get(get_prospect))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: &Config, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let state = AppState {
        store,
        sessions: Arc::new(SessionSet::new()),
        auth: config.auth.clone(),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Read API listening on http://{}", config.server.bind);
    println!("Read API listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
