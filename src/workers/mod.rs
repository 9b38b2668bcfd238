//! Data-retrieval workers.
//!
//! Each worker implements the same capability over one external source:
//! given a query, a result cap, and pre-expanded search terms, return an
//! ordered result list or fail with a domain error. Zero results is a valid
//! success, never an error. The orchestrator treats all workers uniformly
//! and imposes the call timeout from the outside; workers themselves only
//! bound individual HTTP requests.

/// ClinicalTrials.gov adapter.
pub mod clinical;
/// Europe PMC literature adapter.
pub mod literature;
/// Aggregated free patent sources adapter.
pub mod patents;

use crate::types::Result;
use async_trait::async_trait;

pub use clinical::ClinicalTrialsWorker;
pub use literature::LiteratureWorker;
pub use patents::PatentWorker;

/// Search capability implemented by every data-retrieval worker.
#[async_trait]
pub trait SearchWorker: Send + Sync {
    /// Result record type produced by this worker.
    type Output: Send;

    /// Display name matching the job's agent record.
    fn name(&self) -> &str;

    /// Run the search. An empty list is a success; a domain failure is
    /// `AppError::Worker`.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        expanded_terms: &[String],
    ) -> Result<Vec<Self::Output>>;
}
