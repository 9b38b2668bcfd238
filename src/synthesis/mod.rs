//! Result synthesis: competition analysis, relevance re-ranking, confidence
//! scoring, and narrative generation over whatever the workers returned.
//!
//! Synthesis only ever sees result collections. A failed worker manifests
//! here as an empty list, which simply lowers the evidence base and the
//! derived confidence; there is no error path back into the fan-out.

use crate::normalize::{FocusArea, Normalizer, QueryIntent};
use crate::types::{
    ClinicalTrial, CompetitionAnalysis, ConfidenceLevel, Patent, Publication, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

const ACTIVE_TRIAL_STATUSES: &[&str] = &[
    "RECRUITING",
    "ACTIVE_NOT_RECRUITING",
    "ENROLLING_BY_INVITATION",
];

/// Aggregate produced by one synthesis pass.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub executive_summary: String,
    pub key_findings: Vec<String>,
    pub clinical_trials: Vec<ClinicalTrial>,
    pub patents: Vec<Patent>,
    pub publications: Vec<Publication>,
    pub competition_analysis: CompetitionAnalysis,
    pub confidence_score: f32,
    pub confidence_level: ConfidenceLevel,
}

/// Ranking/confidence collaborator consumed by the orchestrator.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        query: &str,
        intent: &QueryIntent,
        trials: Vec<ClinicalTrial>,
        patents: Vec<Patent>,
        publications: Vec<Publication>,
    ) -> Result<Synthesis>;
}

/// Confidence from the total evidence count.
pub fn confidence_for(total_results: usize) -> (f32, ConfidenceLevel) {
    if total_results >= 20 {
        (0.85, ConfidenceLevel::High)
    } else if total_results >= 10 {
        (0.70, ConfidenceLevel::Medium)
    } else {
        (0.50, ConfidenceLevel::Low)
    }
}

/// Competitive-landscape metrics from the clinical trial set.
pub fn analyze_competition(trials: &[ClinicalTrial]) -> CompetitionAnalysis {
    if trials.is_empty() {
        return CompetitionAnalysis {
            competition_level: "unknown".to_string(),
            ..Default::default()
        };
    }

    let active_trials = trials
        .iter()
        .filter(|t| ACTIVE_TRIAL_STATUSES.contains(&t.status.to_uppercase().as_str()))
        .count();

    let mut phase_distribution: HashMap<String, usize> = HashMap::new();
    for trial in trials {
        if let Some(phase) = &trial.phase {
            *phase_distribution.entry(phase.clone()).or_insert(0) += 1;
        }
    }

    let competition_level = if active_trials < 5 {
        "low"
    } else if active_trials < 15 {
        "medium"
    } else {
        "high"
    };

    CompetitionAnalysis {
        competition_level: competition_level.to_string(),
        active_trials,
        total_trials: trials.len(),
        phase_distribution,
    }
}

/// Default [`Synthesizer`] scoring relevance against the normalized query.
pub struct EvidenceSynthesizer {
    normalizer: Arc<dyn Normalizer>,
}

impl EvidenceSynthesizer {
    pub fn new(normalizer: Arc<dyn Normalizer>) -> Self {
        Self { normalizer }
    }

    fn rank_trials(&self, query: &str, mut trials: Vec<ClinicalTrial>) -> Vec<ClinicalTrial> {
        for trial in &mut trials {
            let text = format!("{} {}", trial.title, trial.condition);
            trial.match_score = self.normalizer.match_score(query, &text);
            trial.matched_terms = self.normalizer.matched_terms(query, &text);
        }
        trials.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        trials
    }

    fn rank_patents(&self, query: &str, mut patents: Vec<Patent>) -> Vec<Patent> {
        for patent in &mut patents {
            let score = self.normalizer.match_score(query, &patent.title);
            // Source-provided scores (curated keyword hits) are kept when
            // stronger than the normalized-term overlap.
            patent.match_score = patent.match_score.max(score);
            if patent.matched_terms.is_empty() {
                patent.matched_terms = self.normalizer.matched_terms(query, &patent.title);
            }
        }
        patents.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        patents
    }

    fn rank_publications(&self, query: &str, mut publications: Vec<Publication>) -> Vec<Publication> {
        for publication in &mut publications {
            let text = format!("{} {}", publication.title, publication.snippet);
            publication.matched_terms = self.normalizer.matched_terms(query, &text);
        }
        publications.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        publications
    }

    fn executive_summary(
        &self,
        query: &str,
        intent: &QueryIntent,
        competition: &CompetitionAnalysis,
        patents: &[Patent],
        publications: &[Publication],
    ) -> String {
        let region = intent
            .geographic_region
            .as_deref()
            .unwrap_or("the targeted region");

        let mut summary = format!(
            "Analysis of '{}' reveals {} relevant clinical trials, with {} currently active or recruiting. ",
            query, competition.total_trials, competition.active_trials
        );
        summary.push_str(&format!(
            "The competitive landscape shows {} competition in {}. ",
            competition.competition_level, region
        ));

        if competition.competition_level == "low" && competition.active_trials < 5 {
            summary.push_str(
                "This represents a significant opportunity for market entry with limited direct competition. ",
            );
        }

        summary.push_str(&format!(
            "Patent analysis identified {} relevant patents, and literature intelligence gathered {} supporting data points.",
            patents.len(),
            publications.len()
        ));

        if intent.focus_areas.contains(&FocusArea::PatientBurden) {
            summary.push_str(
                " Patient burden indicators suggest substantial unmet medical need in this therapeutic area.",
            );
        }

        summary
    }

    fn key_findings(
        &self,
        intent: &QueryIntent,
        competition: &CompetitionAnalysis,
        patents: &[Patent],
    ) -> Vec<String> {
        let mut findings = Vec::new();

        findings.push(format!(
            "Competitive Analysis: {} competition detected with {} active trials",
            title_word(&competition.competition_level),
            competition.active_trials
        ));

        if let Some((phase, _)) = competition
            .phase_distribution
            .iter()
            .max_by_key(|(_, count)| **count)
        {
            findings.push(format!("Trial Phases: Most activity in {}", phase));
        }

        if !patents.is_empty() {
            let active_patents = patents.iter().filter(|p| p.status == "Active").count();
            findings.push(format!(
                "Patent Landscape: {} relevant patents identified, {} currently active",
                patents.len(),
                active_patents
            ));
        }

        if competition.competition_level == "low" {
            findings.push(
                "Market Opportunity: Low competition suggests favorable conditions for new entrants"
                    .to_string(),
            );
        }

        if let Some(region) = &intent.geographic_region {
            findings.push(format!(
                "Geographic Focus: Analysis concentrated on {} market dynamics",
                region
            ));
        }

        findings
    }
}

#[async_trait]
impl Synthesizer for EvidenceSynthesizer {
    async fn synthesize(
        &self,
        query: &str,
        intent: &QueryIntent,
        trials: Vec<ClinicalTrial>,
        patents: Vec<Patent>,
        publications: Vec<Publication>,
    ) -> Result<Synthesis> {
        let trials = self.rank_trials(query, trials);
        let patents = self.rank_patents(query, patents);
        let publications = self.rank_publications(query, publications);

        let competition = analyze_competition(&trials);

        let total_results = trials.len() + patents.len() + publications.len();
        let (confidence_score, confidence_level) = confidence_for(total_results);

        let executive_summary =
            self.executive_summary(query, intent, &competition, &patents, &publications);

        let mut key_findings = self.key_findings(intent, &competition, &patents);
        key_findings.insert(
            0,
            format!(
                "Analysis Confidence: {} ({:.0}/100) - Based on {} trials, {} patents, {} publications",
                confidence_level,
                confidence_score * 100.0,
                trials.len(),
                patents.len(),
                publications.len()
            ),
        );

        tracing::info!(
            total_results,
            confidence = %confidence_level,
            competition = %competition.competition_level,
            "synthesis complete"
        );

        Ok(Synthesis {
            executive_summary,
            key_findings,
            clinical_trials: trials,
            patents,
            publications,
            competition_analysis: competition,
            confidence_score,
            confidence_level,
        })
    }
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    }
}
