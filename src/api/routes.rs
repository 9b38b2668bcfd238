use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::api::handlers::health::root))
        .route("/api/health", get(crate::api::handlers::health::health_check))
        .route("/api/query", post(crate::api::handlers::query::submit_query))
        .route(
            "/api/status/{job_id}",
            get(crate::api::handlers::status::get_job_status),
        )
        .route(
            "/api/result/{job_id}",
            get(crate::api::handlers::status::get_job_result),
        )
        .route(
            "/api/reports/{filename}",
            get(crate::api::handlers::reports::get_report),
        )
        .route(
            "/ws/jobs/{job_id}",
            get(crate::api::handlers::ws::job_updates),
        )
}
