//! Clinical trials worker backed by the ClinicalTrials.gov v2 API.

use super::SearchWorker;
use crate::types::{AppError, ClinicalTrial, Result, CLINICAL_TRIALS_AGENT};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov/api/v2";

const DISEASE_KEYWORDS: &[&str] = &[
    "respiratory",
    "cardiovascular",
    "diabetes",
    "cancer",
    "asthma",
    "copd",
    "pneumonia",
    "tuberculosis",
    "covid",
    "influenza",
];

const LOCATION_KEYWORDS: &[&str] = &[
    "india",
    "united states",
    "china",
    "europe",
    "asia",
    "africa",
];

/// Worker fetching live study data from ClinicalTrials.gov.
pub struct ClinicalTrialsWorker {
    client: reqwest::Client,
    base_url: String,
}

impl ClinicalTrialsWorker {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Point the worker at a different API root (tests use a local mock).
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Pull a condition and an optional location filter out of a free-text
    /// query when no expanded terms are available.
    fn extract_keywords(query: &str) -> (String, Option<String>) {
        let query_lower = query.to_lowercase();

        let condition = DISEASE_KEYWORDS
            .iter()
            .find(|d| query_lower.contains(*d))
            .map(|d| d.to_string())
            .unwrap_or_else(|| query.to_string());

        let location = LOCATION_KEYWORDS
            .iter()
            .find(|l| query_lower.contains(*l))
            .map(|l| l.to_string());

        (condition, location)
    }

    fn parse_study(study: &Value) -> Option<ClinicalTrial> {
        let protocol = study.get("protocolSection")?;
        let identification = protocol.get("identificationModule");
        let status_module = protocol.get("statusModule");
        let design = protocol.get("designModule");

        let nct_id = identification
            .and_then(|m| m.get("nctId"))
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string();
        let source_url = if nct_id == "N/A" {
            String::new()
        } else {
            format!("https://clinicaltrials.gov/study/{}", nct_id)
        };

        let conditions = protocol
            .get("conditionsModule")
            .and_then(|m| m.get("conditions"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let intervention = protocol
            .get("armsInterventionsModule")
            .and_then(|m| m.get("interventions"))
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(|i| i.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let sponsor = protocol
            .get("sponsorCollaboratorsModule")
            .and_then(|m| m.get("leadSponsor"))
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let location = protocol
            .get("contactsLocationsModule")
            .and_then(|m| m.get("locations"))
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(|l| l.get("country"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(ClinicalTrial {
            nct_id,
            title: identification
                .and_then(|m| m.get("briefTitle"))
                .and_then(Value::as_str)
                .unwrap_or("Untitled Study")
                .to_string(),
            status: status_module
                .and_then(|m| m.get("overallStatus"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            phase: design
                .and_then(|m| m.get("phases"))
                .and_then(Value::as_array)
                .and_then(|p| p.first())
                .and_then(Value::as_str)
                .map(str::to_string),
            condition: conditions,
            intervention,
            sponsor,
            start_date: status_module
                .and_then(|m| m.get("startDateStruct"))
                .and_then(|s| s.get("date"))
                .and_then(Value::as_str)
                .map(str::to_string),
            completion_date: status_module
                .and_then(|m| m.get("completionDateStruct"))
                .and_then(|s| s.get("date"))
                .and_then(Value::as_str)
                .map(str::to_string),
            enrollment: design
                .and_then(|m| m.get("enrollmentInfo"))
                .and_then(|e| e.get("count"))
                .and_then(Value::as_u64),
            location,
            source_url,
            retrieved_at: Utc::now(),
            match_score: 0.0,
            matched_terms: Vec::new(),
        })
    }
}

#[async_trait]
impl SearchWorker for ClinicalTrialsWorker {
    type Output = ClinicalTrial;

    fn name(&self) -> &str {
        CLINICAL_TRIALS_AGENT
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        expanded_terms: &[String],
    ) -> Result<Vec<ClinicalTrial>> {
        let (condition, location) = Self::extract_keywords(query);

        // Expanded canonical terms beat raw keyword extraction when present.
        let search_query = if expanded_terms.is_empty() {
            condition
        } else {
            expanded_terms
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(" OR ")
        };

        tracing::debug!(worker = self.name(), %search_query, "querying ClinicalTrials.gov");

        let page_size = max_results.to_string();
        let mut request = self
            .client
            .get(format!("{}/studies", self.base_url))
            .query(&[
                ("query.cond", search_query.as_str()),
                ("pageSize", page_size.as_str()),
                ("countTotal", "true"),
                ("format", "json"),
            ]);
        if let Some(location) = &location {
            request = request.query(&[("query.locn", location.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Worker(format!("ClinicalTrials.gov request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Worker(format!("ClinicalTrials.gov returned error: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Worker(format!("ClinicalTrials.gov bad response: {}", e)))?;

        let studies = body
            .get("studies")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let trials: Vec<ClinicalTrial> = studies.iter().filter_map(Self::parse_study).collect();
        tracing::debug!(worker = self.name(), count = trials.len(), "studies parsed");
        Ok(trials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_pick_condition_and_location() {
        let (condition, location) =
            ClinicalTrialsWorker::extract_keywords("lung cancer trials in India");
        assert_eq!(condition, "cancer");
        assert_eq!(location.as_deref(), Some("india"));
    }

    #[test]
    fn keywords_fall_back_to_full_query() {
        let (condition, location) =
            ClinicalTrialsWorker::extract_keywords("novel kinase inhibitors");
        assert_eq!(condition, "novel kinase inhibitors");
        assert!(location.is_none());
    }

    #[test]
    fn parse_study_extracts_nested_fields() {
        let study = serde_json::json!({
            "protocolSection": {
                "identificationModule": {"nctId": "NCT01234567", "briefTitle": "A Study"},
                "statusModule": {
                    "overallStatus": "RECRUITING",
                    "startDateStruct": {"date": "2024-01"},
                    "completionDateStruct": {"date": "2026-06"}
                },
                "designModule": {"phases": ["PHASE2"], "enrollmentInfo": {"count": 120}},
                "conditionsModule": {"conditions": ["Lung Cancer", "NSCLC"]},
                "armsInterventionsModule": {"interventions": [{"name": "Drug X"}]},
                "sponsorCollaboratorsModule": {"leadSponsor": {"name": "Acme Pharma"}},
                "contactsLocationsModule": {"locations": [{"country": "India"}]}
            }
        });

        let trial = ClinicalTrialsWorker::parse_study(&study).unwrap();
        assert_eq!(trial.nct_id, "NCT01234567");
        assert_eq!(trial.status, "RECRUITING");
        assert_eq!(trial.phase.as_deref(), Some("PHASE2"));
        assert_eq!(trial.condition, "Lung Cancer, NSCLC");
        assert_eq!(trial.enrollment, Some(120));
        assert_eq!(trial.location.as_deref(), Some("India"));
        assert_eq!(
            trial.source_url,
            "https://clinicaltrials.gov/study/NCT01234567"
        );
    }
}
