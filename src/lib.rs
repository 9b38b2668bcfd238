//! # PHAROS - Pharmaceutical Research Orchestration Server
//!
//! A multi-agent research orchestration server built in Rust. One free-text
//! query fans out to clinical-trial, patent, and literature workers under
//! bounded timeouts; partial results are aggregated into a confidence-rated
//! report while every state change is persisted and streamed to live
//! WebSocket subscribers.
//!
//! ## Overview
//!
//! PHAROS can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `pharos-server` binary
//! 2. **As a library** - Embed the orchestration engine in your own project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use pharos::{
//!     events::EventBus,
//!     normalize::TermNormalizer,
//!     orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, WorkerSet},
//!     report::TextReportRenderer,
//!     store::JobStore,
//!     synthesis::EvidenceSynthesizer,
//!     workers::{ClinicalTrialsWorker, LiteratureWorker, PatentWorker},
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> pharos::Result<()> {
//! let store = Arc::new(JobStore::new("data/jobs")?);
//! let events = Arc::new(EventBus::new());
//! let client = reqwest::Client::new();
//! let normalizer = Arc::new(TermNormalizer::new());
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::clone(&store),
//!     Arc::clone(&events),
//!     Collaborators {
//!         normalizer: normalizer.clone(),
//!         synthesizer: Arc::new(EvidenceSynthesizer::new(normalizer)),
//!         renderer: Arc::new(TextReportRenderer::new("data/reports")?),
//!     },
//!     WorkerSet {
//!         clinical: Arc::new(ClinicalTrialsWorker::new(client.clone())),
//!         patents: Arc::new(PatentWorker::new(client.clone())),
//!         literature: Arc::new(LiteratureWorker::new(client)),
//!     },
//!     OrchestratorSettings::default(),
//! );
//!
//! let job = store.create("lung cancer trials in India").await?;
//! orchestrator.spawn(job.job_id, job.query.clone());
//! orchestrator.wait(job.job_id).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`] - Job lifecycle state machine and worker fan-out
//! - [`store`] - Durable job/result records, one JSON snapshot per job
//! - [`events`] - Per-job publish/subscribe for live status notifications
//! - [`workers`] - Search workers over the external data sources
//! - [`normalize`] - Medical-term canonicalization and synonym expansion
//! - [`synthesis`] - Confidence scoring, ranking, and narrative generation
//! - [`report`] - Report artifact rendering
//! - [`api`] - REST and WebSocket surface
//! - [`types`] - Common records and error handling
//!
//! ## Architecture
//!
//! The engine holds no ambient globals: the [`store::JobStore`] and
//! [`events::EventBus`] are constructed once per process and threaded
//! through the [`orchestrator::Orchestrator`] and handlers via [`AppState`].
//! Failure isolation follows the bulkhead pattern - one worker's timeout or
//! domain error never delays or cancels its siblings, while a failure in
//! normalization, synthesis, or rendering fails the whole job.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface parsing.
pub mod cli;
/// Per-job publish/subscribe event bus.
pub mod events;
/// Query normalization and term expansion.
pub mod normalize;
/// Job lifecycle orchestration.
pub mod orchestrator;
/// Report artifact rendering.
pub mod report;
/// Durable job state.
pub mod store;
/// Result synthesis and confidence scoring.
pub mod synthesis;
/// Core types (records, requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// Data-retrieval workers.
pub mod workers;

// Re-export commonly used types
pub use events::EventBus;
pub use orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, WorkerSet};
pub use store::{JobStore, JobUpdate};
pub use types::{AppError, Result};
pub use utils::Config;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Environment-derived configuration
    pub config: Arc<Config>,
    /// Durable job store, the single source of truth for job state
    pub jobs: Arc<JobStore>,
    /// Per-job event bus feeding live subscribers
    pub events: Arc<EventBus>,
    /// Orchestrator driving background job runs
    pub orchestrator: Arc<Orchestrator>,
}
