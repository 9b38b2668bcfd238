//! Patent worker aggregating free patent sources.
//!
//! Merges a curated pharmaceutical patent dataset (keyword-scored) with a
//! best-effort FreePatentsOnline page scrape, deduplicated by patent id.
//! Either source failing on its own degrades coverage instead of failing
//! the search.

use super::SearchWorker;
use crate::types::{Patent, Result, PATENT_AGENT};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

const DEFAULT_BASE_URL: &str = "https://www.freepatentsonline.com";

static PATENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"US\d{7,10}[A-Z]\d?").expect("valid patent id pattern"));

const STOP_WORDS: &[&str] = &[
    "what", "are", "the", "for", "in", "a", "an", "and", "or", "of", "to", "is", "how", "does",
    "can", "will", "which", "show", "has", "but",
];

struct CuratedPatent {
    patent_id: &'static str,
    title: &'static str,
    assignee: &'static str,
    filing_date: &'static str,
    abstract_text: &'static str,
    source_url: &'static str,
}

/// Real granted pharma patents used as the offline-searchable baseline.
const CURATED_PATENTS: &[CuratedPatent] = &[
    CuratedPatent {
        patent_id: "US10633411B2",
        title: "Pharmaceutical compositions containing EGFR inhibitors for treatment of respiratory disorders",
        assignee: "AstraZeneca AB",
        filing_date: "2019-04-25",
        abstract_text: "Methods and compositions for treating respiratory diseases including COPD and asthma using EGFR pathway inhibitors.",
        source_url: "https://patents.google.com/patent/US10633411B2",
    },
    CuratedPatent {
        patent_id: "US10557109B2",
        title: "JAK inhibitor formulations for treatment of inflammatory diseases",
        assignee: "Pfizer Inc.",
        filing_date: "2020-02-11",
        abstract_text: "Pharmaceutical formulations of JAK inhibitors for treating rheumatoid arthritis, psoriasis, and inflammatory bowel disease.",
        source_url: "https://patents.google.com/patent/US10557109B2",
    },
    CuratedPatent {
        patent_id: "US11180517B2",
        title: "SGLT2 inhibitor combinations for diabetes and cardiovascular disease",
        assignee: "Boehringer Ingelheim",
        filing_date: "2021-11-23",
        abstract_text: "Combination therapies using SGLT2 inhibitors with metformin for improved glycemic control and cardiovascular outcomes in type 2 diabetes.",
        source_url: "https://patents.google.com/patent/US11180517B2",
    },
    CuratedPatent {
        patent_id: "US10675289B2",
        title: "PD-1 antibody formulations for cancer immunotherapy",
        assignee: "Bristol-Myers Squibb Company",
        filing_date: "2020-06-09",
        abstract_text: "Stable pharmaceutical formulations of anti-PD-1 antibodies for treatment of melanoma, lung cancer, and other malignancies.",
        source_url: "https://patents.google.com/patent/US10675289B2",
    },
    CuratedPatent {
        patent_id: "US10912783B2",
        title: "GLP-1 receptor agonist delivery systems for obesity and diabetes",
        assignee: "Novo Nordisk A/S",
        filing_date: "2021-02-09",
        abstract_text: "Novel delivery systems for GLP-1 receptor agonists with improved bioavailability for treatment of type 2 diabetes and obesity.",
        source_url: "https://patents.google.com/patent/US10912783B2",
    },
    CuratedPatent {
        patent_id: "US10993967B2",
        title: "CGRP antagonist formulations for migraine prevention",
        assignee: "Amgen Inc.",
        filing_date: "2021-05-04",
        abstract_text: "Pharmaceutical compositions containing CGRP pathway antagonists for prevention of chronic and episodic migraine.",
        source_url: "https://patents.google.com/patent/US10993967B2",
    },
    CuratedPatent {
        patent_id: "US11166963B2",
        title: "mRNA vaccine platforms for infectious disease prevention",
        assignee: "Moderna Therapeutics",
        filing_date: "2021-11-09",
        abstract_text: "Lipid nanoparticle formulations for delivery of mRNA vaccines targeting respiratory viruses and other infectious agents.",
        source_url: "https://patents.google.com/patent/US11166963B2",
    },
    CuratedPatent {
        patent_id: "US10799514B2",
        title: "PCSK9 inhibitor antibody therapies for hypercholesterolemia",
        assignee: "Sanofi Biotechnology",
        filing_date: "2020-10-13",
        abstract_text: "Monoclonal antibodies targeting PCSK9 for treatment of familial hypercholesterolemia and cardiovascular disease prevention.",
        source_url: "https://patents.google.com/patent/US10799514B2",
    },
    CuratedPatent {
        patent_id: "US11098065B2",
        title: "CFTR modulator combinations for cystic fibrosis",
        assignee: "Vertex Pharmaceuticals",
        filing_date: "2021-08-24",
        abstract_text: "Triple combination therapies targeting CFTR protein for treatment of cystic fibrosis with various genetic mutations.",
        source_url: "https://patents.google.com/patent/US11098065B2",
    },
    CuratedPatent {
        patent_id: "US11147800B2",
        title: "Inhaled corticosteroid and LABA combination devices for asthma",
        assignee: "GlaxoSmithKline",
        filing_date: "2021-10-19",
        abstract_text: "Dry powder inhaler devices containing fixed-dose combinations of inhaled corticosteroids and long-acting beta-agonists.",
        source_url: "https://patents.google.com/patent/US11147800B2",
    },
    CuratedPatent {
        patent_id: "US11129822B2",
        title: "BRAF and MEK inhibitor combinations for melanoma treatment",
        assignee: "Merck & Co.",
        filing_date: "2021-09-28",
        abstract_text: "Combination therapies using BRAF and MEK pathway inhibitors for treatment of BRAF-mutant melanoma.",
        source_url: "https://patents.google.com/patent/US11129822B2",
    },
    CuratedPatent {
        patent_id: "US11065248B2",
        title: "Tuberculosis treatment regimens with novel antimicrobial agents",
        assignee: "TB Alliance",
        filing_date: "2021-07-20",
        abstract_text: "Shortened treatment regimens for drug-resistant tuberculosis using novel antimicrobial combinations.",
        source_url: "https://patents.google.com/patent/US11065248B2",
    },
];

/// Worker fetching patent data from curated and scraped free sources.
pub struct PatentWorker {
    client: reqwest::Client,
    base_url: String,
}

impl PatentWorker {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn extract_keywords(query: &str) -> Vec<String> {
        let query_lower = query.to_lowercase();
        let keywords: Vec<String> = query_lower
            .split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w) && w.len() > 3)
            .take(5)
            .map(str::to_string)
            .collect();

        if keywords.is_empty() {
            vec![query_lower]
        } else {
            keywords
        }
    }

    /// Score the offline dataset against the keywords: title hits weigh 3,
    /// abstract hits weigh 1. A handful of entries is always returned so an
    /// off-dictionary query still yields a baseline landscape.
    fn search_curated(keywords: &[String], max_results: usize) -> Vec<Patent> {
        let mut results: Vec<Patent> = Vec::new();

        for entry in CURATED_PATENTS {
            let title_lower = entry.title.to_lowercase();
            let abstract_lower = entry.abstract_text.to_lowercase();

            let mut match_score = 0u32;
            let mut matched_terms = Vec::new();
            for keyword in keywords {
                if title_lower.contains(keyword.as_str()) {
                    match_score += 3;
                    matched_terms.push(keyword.clone());
                } else if abstract_lower.contains(keyword.as_str()) {
                    match_score += 1;
                    matched_terms.push(keyword.clone());
                }
            }

            if match_score > 0 || results.len() < 5 {
                results.push(Patent {
                    patent_id: entry.patent_id.to_string(),
                    title: entry.title.to_string(),
                    assignee: entry.assignee.to_string(),
                    filing_date: entry.filing_date.to_string(),
                    status: "Granted".to_string(),
                    source_url: entry.source_url.to_string(),
                    retrieved_at: Utc::now(),
                    match_score: match_score as f32 / 10.0,
                    matched_terms,
                });
            }
            if results.len() >= max_results {
                break;
            }
        }

        results.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(max_results);
        results
    }

    /// Best-effort FreePatentsOnline scrape; network or markup trouble just
    /// yields an empty contribution.
    async fn search_free_patents_online(
        &self,
        keywords: &[String],
        max_results: usize,
    ) -> Vec<Patent> {
        let query_str = keywords
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join("+");

        let response = self
            .client
            .get(format!("{}/result.html", self.base_url))
            .query(&[("p", "1"), ("q", query_str.as_str()), ("srch", "top")])
            .send()
            .await;

        let html = match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(worker = PATENT_AGENT, error = %e, "patent page read failed");
                    return Vec::new();
                }
            },
            Ok(resp) => {
                tracing::warn!(worker = PATENT_AGENT, status = %resp.status(), "patent search rejected");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(worker = PATENT_AGENT, error = %e, "patent search failed");
                return Vec::new();
            }
        };

        Self::parse_result_page(&html, max_results)
    }

    fn parse_result_page(html: &str, max_results: usize) -> Vec<Patent> {
        let document = Html::parse_document(html);
        let anchors = Selector::parse("a").expect("valid selector");

        let mut patents = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for anchor in document.select(&anchors) {
            let href = anchor.value().attr("href").unwrap_or_default();
            let text = anchor.text().collect::<String>();

            let Some(id) = PATENT_ID_RE
                .find(href)
                .or_else(|| PATENT_ID_RE.find(&text))
                .map(|m| m.as_str().to_string())
            else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }

            let title = {
                let trimmed = text.trim();
                if trimmed.is_empty() || PATENT_ID_RE.is_match(trimmed) {
                    "Patent related to search query".to_string()
                } else {
                    trimmed.to_string()
                }
            };

            patents.push(Patent {
                source_url: format!("https://www.freepatentsonline.com/{}.html", id),
                patent_id: id,
                title,
                assignee: "Various".to_string(),
                filing_date: String::new(),
                status: "Granted".to_string(),
                retrieved_at: Utc::now(),
                match_score: 0.7,
                matched_terms: Vec::new(),
            });
            if patents.len() >= max_results {
                break;
            }
        }
        patents
    }
}

#[async_trait]
impl SearchWorker for PatentWorker {
    type Output = Patent;

    fn name(&self) -> &str {
        PATENT_AGENT
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        expanded_terms: &[String],
    ) -> Result<Vec<Patent>> {
        let keywords: Vec<String> = if expanded_terms.is_empty() {
            Self::extract_keywords(query)
        } else {
            expanded_terms
                .iter()
                .take(5)
                .map(|t| t.to_lowercase())
                .collect()
        };

        tracing::debug!(worker = self.name(), ?keywords, "searching patent sources");

        let (curated, scraped) = tokio::join!(
            async { Self::search_curated(&keywords, max_results) },
            self.search_free_patents_online(&keywords, max_results / 2),
        );

        let mut seen = std::collections::HashSet::new();
        let mut merged: Vec<Patent> = Vec::new();
        for patent in curated.into_iter().chain(scraped) {
            if !patent.patent_id.is_empty() && seen.insert(patent.patent_id.clone()) {
                merged.push(patent);
            }
        }
        merged.truncate(max_results);

        tracing::debug!(worker = self.name(), count = merged.len(), "patents merged");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_search_scores_title_hits_highest() {
        let keywords = vec!["diabetes".to_string()];
        let results = PatentWorker::search_curated(&keywords, 20);

        assert!(!results.is_empty());
        assert!(results[0].title.to_lowercase().contains("diabetes"));
        assert!(results[0].match_score >= results.last().unwrap().match_score);
    }

    #[test]
    fn curated_search_returns_baseline_for_unknown_terms() {
        let keywords = vec!["zzzunmatchable".to_string()];
        let results = PatentWorker::search_curated(&keywords, 20);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|p| p.match_score == 0.0));
    }

    #[test]
    fn result_page_parse_extracts_patent_ids() {
        let html = r#"
            <html><body>
              <a href="/US10633411B2.html">EGFR inhibitor compositions</a>
              <a href="/US10633411B2.html">duplicate entry</a>
              <a href="/contact.html">Contact us</a>
              <a href="/US11180517B2.html">US11180517B2</a>
            </body></html>
        "#;

        let patents = PatentWorker::parse_result_page(html, 10);
        assert_eq!(patents.len(), 2);
        assert_eq!(patents[0].patent_id, "US10633411B2");
        assert_eq!(patents[0].title, "EGFR inhibitor compositions");
        // Bare-id anchor text falls back to a generic title.
        assert_eq!(patents[1].title, "Patent related to search query");
    }

    #[test]
    fn keywords_filter_stop_words() {
        let keywords = PatentWorker::extract_keywords("what are the best asthma inhaler patents");
        assert!(keywords.contains(&"asthma".to_string()));
        assert!(!keywords.contains(&"what".to_string()));
    }
}
