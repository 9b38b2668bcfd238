//! Literature worker backed by the Europe PMC REST API.

use super::SearchWorker;
use crate::types::{AppError, Publication, Result, LITERATURE_AGENT};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest";

const STOP_WORDS: &[&str] = &[
    "what", "which", "how", "are", "the", "a", "an", "in", "on", "at", "for", "to", "of", "with",
    "show", "tell", "about",
];

/// Worker gathering scientific literature from Europe PMC (40M+ records).
pub struct LiteratureWorker {
    client: reqwest::Client,
    base_url: String,
}

impl LiteratureWorker {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn extract_keywords(query: &str) -> String {
        let query_lower = query.to_lowercase();
        let keywords: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w) && w.len() > 3)
            .take(5)
            .collect();

        if keywords.is_empty() {
            "pharmaceutical research".to_string()
        } else {
            keywords.join(" ")
        }
    }

    fn parse_publication(item: &Value) -> Publication {
        let pmid = item.get("pmid").and_then(Value::as_str);
        let pmcid = item.get("pmcid").and_then(Value::as_str);
        let doi = item.get("doi").and_then(Value::as_str);

        // Prefer PMC full text, then PubMed, then the DOI resolver.
        let url = if let Some(pmcid) = pmcid {
            format!("https://europepmc.org/article/PMC/{}", pmcid)
        } else if let Some(pmid) = pmid {
            format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)
        } else if let Some(doi) = doi {
            format!("https://doi.org/{}", doi)
        } else {
            "https://europepmc.org/".to_string()
        };

        let mut title = item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled Publication")
            .to_string();
        if title.len() > 150 {
            title = format!("{}...", truncate_chars(&title, 147));
        }

        let snippet = match item.get("abstractText").and_then(Value::as_str) {
            Some(text) if text.len() > 300 => format!("{}...", truncate_chars(text, 300)),
            Some(text) if !text.is_empty() => text.to_string(),
            _ => "No abstract available.".to_string(),
        };

        let source = item
            .get("journalTitle")
            .or_else(|| item.get("source"))
            .and_then(Value::as_str)
            .unwrap_or("Scientific Publication")
            .to_string();

        // Citation count on a saturating log-ish scale: 0.5 floor, 1.0 cap.
        let cited = item
            .get("citedByCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let relevance_score = (0.5 + cited as f32 / 2000.0).min(1.0);

        Publication {
            source,
            title,
            url,
            snippet,
            relevance_score: (relevance_score * 100.0).round() / 100.0,
            retrieved_at: Utc::now(),
            matched_terms: Vec::new(),
        }
    }
}

/// Cut at a char boundary at or below `max` bytes.
fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
impl SearchWorker for LiteratureWorker {
    type Output = Publication;

    fn name(&self) -> &str {
        LITERATURE_AGENT
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        expanded_terms: &[String],
    ) -> Result<Vec<Publication>> {
        // Literature search goes broad: up to 8 expanded synonyms.
        let keywords = if expanded_terms.is_empty() {
            Self::extract_keywords(query)
        } else {
            expanded_terms
                .iter()
                .take(8)
                .cloned()
                .collect::<Vec<_>>()
                .join(" OR ")
        };

        tracing::debug!(worker = self.name(), %keywords, "querying Europe PMC");

        let page_size = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("query", keywords.as_str()),
                ("format", "json"),
                ("pageSize", page_size.as_str()),
                ("sort", "CITED desc"),
                ("resultType", "core"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Worker(format!("Europe PMC request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Worker(format!("Europe PMC returned error: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Worker(format!("Europe PMC bad response: {}", e)))?;

        let publications: Vec<Publication> = body
            .get("resultList")
            .and_then(|l| l.get("result"))
            .and_then(Value::as_array)
            .map(|list| list.iter().map(Self::parse_publication).collect())
            .unwrap_or_default();

        tracing::debug!(
            worker = self.name(),
            count = publications.len(),
            "publications parsed"
        );
        Ok(publications)
    }
}
