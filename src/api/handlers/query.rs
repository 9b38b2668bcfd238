use crate::{
    types::{AppError, QueryRequest, QueryResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

const MIN_QUERY_LEN: usize = 10;
const MAX_QUERY_LEN: usize = 500;

/// Submit a new pharmaceutical query for analysis
#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query accepted, processing started", body = QueryResponse),
        (status = 400, description = "Invalid input")
    ),
    tag = "queries"
)]
pub async fn submit_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let query = payload.query.trim();
    let len = query.chars().count();
    if !(MIN_QUERY_LEN..=MAX_QUERY_LEN).contains(&len) {
        return Err(AppError::InvalidInput(format!(
            "Query must be between {} and {} characters",
            MIN_QUERY_LEN, MAX_QUERY_LEN
        )));
    }

    // The job record is durable before we answer; processing runs in the
    // background and never blocks the accept path.
    let job = state.jobs.create(query).await?;
    state.orchestrator.spawn(job.job_id, query.to_string());

    tracing::info!(job_id = %job.job_id, "query submitted");

    Ok(Json(QueryResponse {
        job_id: job.job_id,
        status: job.status,
        message: "Query submitted successfully. Processing started.".to_string(),
        created_at: job.created_at,
    }))
}
