//! Job orchestration: drives one job's lifecycle from normalization through
//! fan-out, synthesis, report rendering, and finalization.
//!
//! Worker faults are bulkheaded: a timeout or domain error in one fan-out
//! branch records a failed agent and contributes an empty result list without
//! touching its siblings or the job. Faults anywhere else abort the job as a
//! whole. Every store mutation is paired with an event-bus publication in
//! pipeline order.

use crate::events::EventBus;
use crate::normalize::{Normalizer, SearchTerms};
use crate::report::ReportRenderer;
use crate::store::{JobStore, JobUpdate};
use crate::synthesis::Synthesizer;
use crate::types::{
    AgentStatus, ClinicalTrial, EventPayload, EventType, JobResult, JobStatus, Patent,
    Publication, Result, MASTER_AGENT, RESULT_DISPLAY_LIMIT,
};
use crate::workers::SearchWorker;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Bound applied to every worker invocation.
    pub worker_timeout: Duration,
    /// Result cap requested from each worker.
    pub max_results: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(30),
            max_results: 20,
        }
    }
}

/// The three data-retrieval workers, injected as trait objects so tests can
/// swap in scripted doubles.
pub struct WorkerSet {
    pub clinical: Arc<dyn SearchWorker<Output = ClinicalTrial>>,
    pub patents: Arc<dyn SearchWorker<Output = Patent>>,
    pub literature: Arc<dyn SearchWorker<Output = Publication>>,
}

/// The stateless collaborators around the pipeline.
pub struct Collaborators {
    pub normalizer: Arc<dyn Normalizer>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub renderer: Arc<dyn ReportRenderer>,
}

/// Drives job runs and tracks their background task handles.
pub struct Orchestrator {
    store: Arc<JobStore>,
    events: Arc<EventBus>,
    collaborators: Collaborators,
    workers: WorkerSet,
    settings: OrchestratorSettings,
    running: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<JobStore>,
        events: Arc<EventBus>,
        collaborators: Collaborators,
        workers: WorkerSet,
        settings: OrchestratorSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            collaborators,
            workers,
            settings,
            running: Mutex::new(HashMap::new()),
        })
    }

    /// Launch the processing run for a freshly-created job. Returns
    /// immediately; the run is tracked and can be joined with [`Self::wait`].
    pub fn spawn(self: &Arc<Self>, job_id: Uuid, query: String) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.run(job_id, query).await;
        });

        let mut running = self.running.lock();
        running.retain(|_, h| !h.is_finished());
        running.insert(job_id, handle);
    }

    /// Join a tracked run. Returns false if no run is (or was) tracked for
    /// the id.
    pub async fn wait(&self, job_id: Uuid) -> bool {
        let handle = self.running.lock().remove(&job_id);
        match handle {
            Some(handle) => {
                let _ = handle.await;
                true
            }
            None => false,
        }
    }

    /// Number of runs that have not finished yet.
    pub fn running_jobs(&self) -> usize {
        let mut running = self.running.lock();
        running.retain(|_, h| !h.is_finished());
        running.len()
    }

    async fn run(&self, job_id: Uuid, query: String) {
        tracing::info!(%job_id, "starting analysis");

        if let Err(e) = self.process(job_id, &query).await {
            tracing::error!(%job_id, error = %e, "job failed");
            let _ = self
                .store
                .update(job_id, JobUpdate::failed(e.to_string()))
                .await;
            self.events.publish(
                job_id,
                EventType::JobFailed,
                EventPayload::Failed {
                    error: e.to_string(),
                },
            );
        }
    }

    async fn process(&self, job_id: Uuid, query: &str) -> Result<()> {
        // Step 1: the job is live.
        self.store
            .update(job_id, JobUpdate::status(JobStatus::Running))
            .await?;
        self.events.publish(
            job_id,
            EventType::JobStarted,
            EventPayload::Started {
                query: query.to_string(),
            },
        );
        self.set_master(job_id, AgentStatus::Running).await?;

        // Step 2: canonical terms and per-worker expansions.
        let normalized = self.collaborators.normalizer.normalize(query);
        let intent = self.collaborators.normalizer.parse_intent(query);
        tracing::debug!(%job_id, canonical = ?normalized.canonical_terms, "query normalized");
        self.set_master(job_id, AgentStatus::Completed).await?;
        self.store.update(job_id, JobUpdate::progress(10)).await?;

        // Step 3: concurrent fan-out, one bulkheaded branch per worker.
        let (trials, patents, publications) = self
            .run_workers(job_id, query, &normalized.search_terms)
            .await?;
        self.store.update(job_id, JobUpdate::progress(70)).await?;

        // Step 4: synthesis over whatever came back.
        self.set_master(job_id, AgentStatus::Running).await?;
        let synthesis = self
            .collaborators
            .synthesizer
            .synthesize(query, &intent, trials, patents, publications)
            .await?;
        self.set_master(job_id, AgentStatus::Completed).await?;
        self.store.update(job_id, JobUpdate::progress(85)).await?;

        // Step 5: report artifact.
        let report_url = self
            .collaborators
            .renderer
            .render(job_id, query, &synthesis)
            .await?;
        self.store.update(job_id, JobUpdate::progress(95)).await?;

        // Step 6: persist the aggregate and finalize.
        let job = self.store.get(job_id).await?;
        let result = JobResult {
            job_id,
            query: query.to_string(),
            status: JobStatus::Completed,
            executive_summary: synthesis.executive_summary,
            key_findings: synthesis.key_findings,
            clinical_trials: capped(synthesis.clinical_trials),
            patents: capped(synthesis.patents),
            publications: capped(synthesis.publications),
            competition_analysis: synthesis.competition_analysis,
            confidence_score: synthesis.confidence_score,
            confidence_level: synthesis.confidence_level,
            report_url: Some(report_url.clone()),
            created_at: job.created_at,
            completed_at: Utc::now(),
        };
        self.store.save_result(job_id, result).await?;
        self.store
            .update(
                job_id,
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    progress: Some(100),
                    error: None,
                },
            )
            .await?;
        self.set_master(job_id, AgentStatus::Completed).await?;
        self.events.publish(
            job_id,
            EventType::JobCompleted,
            EventPayload::Completed { report_url },
        );

        tracing::info!(%job_id, "analysis completed");
        Ok(())
    }

    async fn run_workers(
        &self,
        job_id: Uuid,
        query: &str,
        terms: &SearchTerms,
    ) -> Result<(Vec<ClinicalTrial>, Vec<Patent>, Vec<Publication>)> {
        let (trials, patents, publications) = tokio::join!(
            self.run_worker(
                job_id,
                self.workers.clinical.as_ref(),
                query,
                &terms.clinical_trials
            ),
            self.run_worker(job_id, self.workers.patents.as_ref(), query, &terms.patents),
            self.run_worker(
                job_id,
                self.workers.literature.as_ref(),
                query,
                &terms.literature
            ),
        );
        Ok((trials?, patents?, publications?))
    }

    /// Run one worker under the shared timeout, recording its agent
    /// transitions and publishing matching `agent_update` events. Worker
    /// faults settle to an empty list; store faults propagate.
    async fn run_worker<W>(
        &self,
        job_id: Uuid,
        worker: &W,
        query: &str,
        expanded_terms: &[String],
    ) -> Result<Vec<W::Output>>
    where
        W: SearchWorker + ?Sized,
    {
        let name = worker.name().to_string();

        self.store
            .update_agent(job_id, &name, AgentStatus::Running, 0, None)
            .await?;
        self.publish_agent(job_id, &name, AgentStatus::Running, None, None);

        let outcome = tokio::time::timeout(
            self.settings.worker_timeout,
            worker.search(query, self.settings.max_results, expanded_terms),
        )
        .await;

        match outcome {
            Ok(Ok(results)) => {
                self.store
                    .update_agent(job_id, &name, AgentStatus::Completed, results.len(), None)
                    .await?;
                self.publish_agent(
                    job_id,
                    &name,
                    AgentStatus::Completed,
                    Some(results.len()),
                    None,
                );
                Ok(results)
            }
            Ok(Err(e)) => {
                tracing::warn!(%job_id, agent = %name, error = %e, "worker failed");
                self.store
                    .update_agent(job_id, &name, AgentStatus::Failed, 0, Some(e.to_string()))
                    .await?;
                self.publish_agent(job_id, &name, AgentStatus::Failed, None, Some(e.to_string()));
                Ok(Vec::new())
            }
            Err(_) => {
                tracing::warn!(
                    %job_id,
                    agent = %name,
                    timeout_secs = self.settings.worker_timeout.as_secs(),
                    "worker timed out"
                );
                self.store
                    .update_agent(
                        job_id,
                        &name,
                        AgentStatus::Failed,
                        0,
                        Some("Timeout".to_string()),
                    )
                    .await?;
                self.publish_agent(
                    job_id,
                    &name,
                    AgentStatus::Failed,
                    None,
                    Some("Timeout".to_string()),
                );
                Ok(Vec::new())
            }
        }
    }

    fn publish_agent(
        &self,
        job_id: Uuid,
        agent: &str,
        status: AgentStatus,
        result_count: Option<usize>,
        error: Option<String>,
    ) {
        self.events.publish(
            job_id,
            EventType::AgentUpdate,
            EventPayload::Agent {
                agent: agent.to_string(),
                status,
                result_count,
                error,
            },
        );
    }

    async fn set_master(&self, job_id: Uuid, status: AgentStatus) -> Result<()> {
        self.store
            .update_agent(job_id, MASTER_AGENT, status, 0, None)
            .await
    }
}

fn capped<T>(mut items: Vec<T>) -> Vec<T> {
    items.truncate(RESULT_DISPLAY_LIMIT);
    items
}
