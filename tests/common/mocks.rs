//! Mock implementations for testing.
//!
//! Scripted workers with controllable outcomes and a fully-wired
//! application state over temporary directories.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use pharos::{
    events::EventBus,
    normalize::TermNormalizer,
    orchestrator::{Collaborators, Orchestrator, OrchestratorSettings, WorkerSet},
    report::{ReportRenderer, TextReportRenderer},
    store::JobStore,
    synthesis::{EvidenceSynthesizer, Synthesis},
    types::{
        AppError, ClinicalTrial, Patent, Publication, Result, CLINICAL_TRIALS_AGENT,
        LITERATURE_AGENT, PATENT_AGENT,
    },
    workers::SearchWorker,
    AppState, Config,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// What a scripted worker does when called.
#[derive(Clone)]
pub enum Behavior {
    /// Return this many fabricated items.
    Items(usize),
    /// Return items after a delay (still within the caller's timeout).
    Delayed(Duration, usize),
    /// Fail with a domain error.
    Fail(String),
    /// Never settle; the caller's timeout has to cut the call off.
    Hang,
}

/// Worker double driven by a [`Behavior`] script.
pub struct ScriptedWorker<T> {
    name: &'static str,
    behavior: Behavior,
    make: fn(usize) -> T,
}

#[async_trait]
impl<T: Send + Sync + 'static> SearchWorker for ScriptedWorker<T> {
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    async fn search(
        &self,
        _query: &str,
        max_results: usize,
        _expanded_terms: &[String],
    ) -> Result<Vec<T>> {
        match &self.behavior {
            Behavior::Items(n) => Ok((0..(*n).min(max_results)).map(self.make).collect()),
            Behavior::Delayed(delay, n) => {
                tokio::time::sleep(*delay).await;
                Ok((0..(*n).min(max_results)).map(self.make).collect())
            }
            Behavior::Fail(msg) => Err(AppError::Worker(msg.clone())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn sample_trial(i: usize) -> ClinicalTrial {
    ClinicalTrial {
        nct_id: format!("NCT{:08}", i),
        title: format!("Lung cancer trial {}", i),
        status: "RECRUITING".to_string(),
        phase: Some("PHASE2".to_string()),
        condition: "Lung Cancer".to_string(),
        intervention: Some("Drug X".to_string()),
        sponsor: Some("Acme Pharma".to_string()),
        start_date: None,
        completion_date: None,
        enrollment: Some(100),
        location: Some("India".to_string()),
        source_url: format!("https://clinicaltrials.gov/study/NCT{:08}", i),
        retrieved_at: Utc::now(),
        match_score: 0.0,
        matched_terms: Vec::new(),
    }
}

pub fn sample_patent(i: usize) -> Patent {
    Patent {
        patent_id: format!("US{:07}B2", 10000000 + i),
        title: format!("Pharmaceutical composition {}", i),
        assignee: "Acme Pharma".to_string(),
        filing_date: "2021-01-01".to_string(),
        status: "Granted".to_string(),
        source_url: String::new(),
        retrieved_at: Utc::now(),
        match_score: 0.0,
        matched_terms: Vec::new(),
    }
}

pub fn sample_publication(i: usize) -> Publication {
    Publication {
        source: "Journal of Oncology".to_string(),
        title: format!("Cancer outcomes study {}", i),
        url: String::new(),
        snippet: "Abstract text.".to_string(),
        relevance_score: 0.6,
        retrieved_at: Utc::now(),
        matched_terms: Vec::new(),
    }
}

pub fn clinical_worker(behavior: Behavior) -> Arc<dyn SearchWorker<Output = ClinicalTrial>> {
    Arc::new(ScriptedWorker {
        name: CLINICAL_TRIALS_AGENT,
        behavior,
        make: sample_trial,
    })
}

pub fn patent_worker(behavior: Behavior) -> Arc<dyn SearchWorker<Output = Patent>> {
    Arc::new(ScriptedWorker {
        name: PATENT_AGENT,
        behavior,
        make: sample_patent,
    })
}

pub fn literature_worker(behavior: Behavior) -> Arc<dyn SearchWorker<Output = Publication>> {
    Arc::new(ScriptedWorker {
        name: LITERATURE_AGENT,
        behavior,
        make: sample_publication,
    })
}

/// Renderer double that always fails, for whole-job abort tests.
pub struct FailingRenderer;

#[async_trait]
impl ReportRenderer for FailingRenderer {
    async fn render(&self, _job_id: Uuid, _query: &str, _synthesis: &Synthesis) -> Result<String> {
        Err(AppError::Collaborator("Renderer exploded".to_string()))
    }
}

/// Fully-wired state over temp dirs; dropping it cleans the dirs up.
pub struct TestHarness {
    pub state: AppState,
    _data_dir: TempDir,
    _reports_dir: TempDir,
}

pub fn harness(
    clinical: Behavior,
    patents: Behavior,
    literature: Behavior,
    worker_timeout: Duration,
) -> TestHarness {
    let reports_dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(TextReportRenderer::new(reports_dir.path()).unwrap());
    harness_with_renderer(
        clinical,
        patents,
        literature,
        worker_timeout,
        renderer,
        reports_dir,
    )
}

pub fn harness_with_renderer(
    clinical: Behavior,
    patents: Behavior,
    literature: Behavior,
    worker_timeout: Duration,
    renderer: Arc<dyn ReportRenderer>,
    reports_dir: TempDir,
) -> TestHarness {
    let data_dir = tempfile::tempdir().unwrap();

    let mut config = Config::from_env().unwrap();
    config.storage.data_dir = data_dir.path().display().to_string();
    config.storage.reports_dir = reports_dir.path().display().to_string();

    let jobs = Arc::new(JobStore::new(data_dir.path()).unwrap());
    let events = Arc::new(EventBus::new());
    let normalizer = Arc::new(TermNormalizer::new());

    let orchestrator = Orchestrator::new(
        Arc::clone(&jobs),
        Arc::clone(&events),
        Collaborators {
            normalizer: normalizer.clone(),
            synthesizer: Arc::new(EvidenceSynthesizer::new(normalizer)),
            renderer,
        },
        WorkerSet {
            clinical: clinical_worker(clinical),
            patents: patent_worker(patents),
            literature: literature_worker(literature),
        },
        OrchestratorSettings {
            worker_timeout,
            max_results: 20,
        },
    );

    TestHarness {
        state: AppState {
            config: Arc::new(config),
            jobs,
            events,
            orchestrator,
        },
        _data_dir: data_dir,
        _reports_dir: reports_dir,
    }
}
