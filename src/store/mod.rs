//! Durable job state keyed by job id.
//!
//! One JSON snapshot per job (`{id}.json`) plus a separate result slot
//! (`{id}_result.json`), each overwritten wholesale on every update. An
//! in-memory map guarded by a single `RwLock` is the read path; every write
//! mutates the map and persists the snapshot while still holding the write
//! guard, so a concurrent reader only ever observes fully-applied updates.

use crate::types::{
    AgentStatus, AppError, Job, JobResult, JobStatus, Result,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Partial update applied to a job record.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            progress: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    results: HashMap<Uuid, JobResult>,
}

/// File-backed store for [`Job`] and [`JobResult`] records.
pub struct JobStore {
    data_dir: PathBuf,
    inner: RwLock<Inner>,
}

impl JobStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| AppError::Store(format!("Failed to create {}: {}", data_dir.display(), e)))?;
        Ok(Self {
            data_dir,
            inner: RwLock::new(Inner::default()),
        })
    }

    fn job_path(&self, id: Uuid) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }

    fn result_path(&self, id: Uuid) -> PathBuf {
        self.data_dir.join(format!("{}_result.json", id))
    }

    /// Re-read job and result snapshots left by a previous process.
    /// Returns the number of jobs recovered.
    pub async fn load_existing(&self) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut entries = tokio::fs::read_dir(&self.data_dir)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read data dir: {}", e)))?;

        let mut loaded = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Store(format!("Failed to read data dir: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if let Some(id_part) = stem.strip_suffix("_result") {
                if let Ok(id) = Uuid::parse_str(id_part) {
                    if let Some(result) = read_json::<JobResult>(&path).await {
                        inner.results.insert(id, result);
                    }
                }
            } else if let Ok(id) = Uuid::parse_str(stem) {
                if let Some(job) = read_json::<Job>(&path).await {
                    inner.jobs.insert(id, job);
                    loaded += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Create a new job for `query` and durably persist it before returning.
    pub async fn create(&self, query: &str) -> Result<Job> {
        let job = Job::new(query);
        let mut inner = self.inner.write().await;
        self.persist_job(&job).await?;
        inner.jobs.insert(job.job_id, job.clone());
        Ok(job)
    }

    /// Fetch the current job record.
    pub async fn get(&self, id: Uuid) -> Result<Job> {
        let inner = self.inner.read().await;
        inner
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
    }

    /// Merge partial fields into a job and refresh its `updated_at` stamp.
    ///
    /// Progress is clamped to be non-decreasing; a stale lower value is
    /// silently ignored.
    pub async fn update(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;

        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(progress) = update.progress {
            job.progress = job.progress.max(progress.min(100));
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
        job.updated_at = Utc::now();

        let snapshot = job.clone();
        self.persist_job(&snapshot).await?;
        Ok(snapshot)
    }

    /// Apply a status transition to the named agent record.
    ///
    /// Stamps `start_time` the first time the record enters `Running` and
    /// `end_time` when it reaches a terminal state.
    pub async fn update_agent(
        &self,
        id: Uuid,
        agent_name: &str,
        status: AgentStatus,
        result_count: usize,
        error: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;

        let agent = job
            .agents
            .iter_mut()
            .find(|a| a.name == agent_name)
            .ok_or_else(|| {
                AppError::NotFound(format!("Agent {} not found in job {}", agent_name, id))
            })?;

        agent.status = status;
        agent.result_count = result_count;
        if status == AgentStatus::Running && agent.start_time.is_none() {
            agent.start_time = Some(Utc::now());
        }
        if status.is_terminal() {
            agent.end_time = Some(Utc::now());
        }
        if let Some(error) = error {
            agent.error = Some(error);
        }
        job.updated_at = Utc::now();

        let snapshot = job.clone();
        self.persist_job(&snapshot).await
    }

    /// Persist the final aggregate for a completed job.
    pub async fn save_result(&self, id: Uuid, result: JobResult) -> Result<()> {
        let mut inner = self.inner.write().await;
        let bytes = serde_json::to_vec_pretty(&result)
            .map_err(|e| AppError::Store(format!("Failed to serialize result: {}", e)))?;
        tokio::fs::write(self.result_path(id), bytes)
            .await
            .map_err(|e| AppError::Store(format!("Failed to persist result: {}", e)))?;
        inner.results.insert(id, result);
        Ok(())
    }

    /// Fetch the final aggregate, if one has been written.
    pub async fn get_result(&self, id: Uuid) -> Result<JobResult> {
        let inner = self.inner.read().await;
        inner
            .results
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Result for job {} not found", id)))
    }

    async fn persist_job(&self, job: &Job) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(job)
            .map_err(|e| AppError::Store(format!("Failed to serialize job: {}", e)))?;
        tokio::fs::write(self.job_path(job.job_id), bytes)
            .await
            .map_err(|e| AppError::Store(format!("Failed to persist job: {}", e)))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping corrupt snapshot");
            None
        }
    }
}
