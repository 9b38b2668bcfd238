//! Report rendering: turns a synthesized aggregate into a downloadable
//! artifact and hands back its URL.
//!
//! The renderer owns degradation internally; the orchestrator only sees a
//! report reference and never learns whether a richer format fell back to
//! plain text.

use crate::synthesis::Synthesis;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::PathBuf;
use uuid::Uuid;

/// Report-rendering collaborator consumed by the orchestrator.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render an artifact for the job and return its serving URL.
    async fn render(&self, job_id: Uuid, query: &str, synthesis: &Synthesis) -> Result<String>;
}

/// Plain-text renderer writing one file per job under the reports directory.
pub struct TextReportRenderer {
    reports_dir: PathBuf,
}

impl TextReportRenderer {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Result<Self> {
        let reports_dir = reports_dir.into();
        std::fs::create_dir_all(&reports_dir).map_err(|e| {
            AppError::Collaborator(format!(
                "Failed to create {}: {}",
                reports_dir.display(),
                e
            ))
        })?;
        Ok(Self { reports_dir })
    }

    fn render_text(job_id: Uuid, query: &str, synthesis: &Synthesis) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "PHAROS Analysis Report");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Job ID: {}", job_id);
        let _ = writeln!(out, "Query: {}", query);
        let _ = writeln!(out, "Generated: {}", Utc::now().to_rfc3339());
        let _ = writeln!(out);

        let _ = writeln!(out, "EXECUTIVE SUMMARY");
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(out, "{}", synthesis.executive_summary);
        let _ = writeln!(out);

        let _ = writeln!(out, "KEY FINDINGS");
        let _ = writeln!(out, "{}", thin);
        for (i, finding) in synthesis.key_findings.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, finding);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "CLINICAL TRIALS");
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(
            out,
            "Total trials found: {}",
            synthesis.clinical_trials.len()
        );
        let _ = writeln!(out);
        for trial in synthesis.clinical_trials.iter().take(10) {
            let _ = writeln!(out, "NCT ID: {}", trial.nct_id);
            let _ = writeln!(out, "Title: {}", trial.title);
            let _ = writeln!(out, "Status: {}", trial.status);
            let _ = writeln!(out, "{}", "-".repeat(40));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "PATENTS");
        let _ = writeln!(out, "{}", thin);
        for patent in synthesis.patents.iter().take(10) {
            let _ = writeln!(out, "{} - {} ({})", patent.patent_id, patent.title, patent.assignee);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "LITERATURE");
        let _ = writeln!(out, "{}", thin);
        for publication in synthesis.publications.iter().take(10) {
            let _ = writeln!(out, "{} - {}", publication.source, publication.title);
        }

        out
    }
}

#[async_trait]
impl ReportRenderer for TextReportRenderer {
    async fn render(&self, job_id: Uuid, query: &str, synthesis: &Synthesis) -> Result<String> {
        let file_name = format!("job_{}.txt", job_id);
        let path = self.reports_dir.join(&file_name);

        let content = Self::render_text(job_id, query, synthesis);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::Collaborator(format!("Failed to write report: {}", e)))?;

        tracing::info!(%job_id, path = %path.display(), "report rendered");
        Ok(format!("/api/reports/{}", file_name))
    }
}
