use crate::{
    types::{AppError, Job, JobResult, JobStatus, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

/// Get current status of a job
#[utoipa::path(
    get,
    path = "/api/status/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Current job record", body = Job),
        (status = 404, description = "Job not found")
    ),
    tag = "status"
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>> {
    let job = state.jobs.get(job_id).await?;
    Ok(Json(job))
}

/// Get final results of a completed job
#[utoipa::path(
    get,
    path = "/api/result/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Final aggregate result", body = JobResult),
        (status = 400, description = "Job has not completed yet"),
        (status = 404, description = "Job not found")
    ),
    tag = "status"
)]
pub async fn get_job_result(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResult>> {
    let job = state.jobs.get(job_id).await?;

    if job.status != JobStatus::Completed {
        return Err(AppError::NotReady(format!(
            "Job is not completed yet. Current status: {}",
            job.status
        )));
    }

    let result = state.jobs.get_result(job_id).await?;
    Ok(Json(result))
}
