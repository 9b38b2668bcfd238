//! HTTP API Handlers and Routes
//!
//! This module provides the REST and WebSocket surface for PHAROS, built on
//! the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Queries (`/api/query`)
//! - `POST /api/query` - Submit a query; processing starts in the background
//!
//! ## Job state (`/api/status`, `/api/result`)
//! - `GET /api/status/{job_id}` - Current job record: status, agents, progress
//! - `GET /api/result/{job_id}` - Final aggregate once the job completed
//!
//! ## Live updates (`/ws/jobs`)
//! - `GET /ws/jobs/{job_id}` - WebSocket stream of job events from the
//!   moment of connection onward (no backlog replay)
//!
//! ## Reports (`/api/reports`)
//! - `GET /api/reports/{filename}` - Download a rendered report artifact
//!
//! ## Health
//! - `GET /` and `GET /api/health` - Liveness payloads
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI document covering the public surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::query::submit_query,
        handlers::status::get_job_status,
        handlers::status::get_job_result,
        handlers::health::health_check,
    ),
    tags(
        (name = "queries", description = "Query submission"),
        (name = "status", description = "Job status and results"),
        (name = "health", description = "Liveness checks")
    )
)]
pub struct ApiDoc;
