//! Query normalization: medical-term canonicalization, synonym expansion,
//! and per-worker search-term selection.
//!
//! This sits at the boundary of the orchestration engine; the engine only
//! depends on the [`Normalizer`] trait and a swapped-in implementation can
//! back it with a real ontology service.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Medical entities extracted from a raw query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryEntities {
    pub conditions: Vec<String>,
    pub drugs: Vec<String>,
    pub locations: Vec<String>,
}

/// Search terms tailored per worker: canonical terms for the structured
/// registries, broader synonyms for literature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTerms {
    pub clinical_trials: Vec<String>,
    pub patents: Vec<String>,
    pub literature: Vec<String>,
}

/// Outcome of normalizing one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub original: String,
    pub normalized: String,
    pub canonical_terms: Vec<String>,
    pub synonyms: Vec<String>,
    pub entities: QueryEntities,
    /// OR-joined expansion suitable for search APIs.
    pub expanded_query: String,
    pub search_terms: SearchTerms,
}

/// Analysis angle detected in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    CompetitionAnalysis,
    PatientBurden,
    OpportunityDetection,
}

/// Parsed intent driving summary generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    pub focus_areas: Vec<FocusArea>,
    pub geographic_region: Option<String>,
}

/// Term-expansion/normalization collaborator consumed by the orchestrator.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, query: &str) -> NormalizedQuery;
    fn parse_intent(&self, query: &str) -> QueryIntent;
    /// Relevance of `text` against the normalized query, 0-1.
    fn match_score(&self, query: &str, text: &str) -> f32;
    /// Normalized terms found verbatim in `text`.
    fn matched_terms(&self, query: &str, text: &str) -> Vec<String>;
}

type SynonymTable = HashMap<&'static str, Vec<&'static str>>;

static DISEASE_SYNONYMS: LazyLock<SynonymTable> = LazyLock::new(|| {
    HashMap::from([
        // Respiratory
        ("respiratory", vec!["pulmonary", "lung disease", "breathing disorder"]),
        ("copd", vec!["chronic obstructive pulmonary disease", "emphysema", "chronic bronchitis"]),
        ("asthma", vec!["bronchial asthma", "allergic asthma", "exercise-induced asthma"]),
        ("tuberculosis", vec!["tb", "mycobacterium tuberculosis", "pulmonary tuberculosis"]),
        ("pneumonia", vec!["lung infection", "pneumonitis", "community-acquired pneumonia"]),
        // Cardiovascular
        ("cardiovascular", vec!["cardiac", "heart disease", "circulatory disease"]),
        ("hypertension", vec!["high blood pressure", "htn", "elevated blood pressure"]),
        ("heart failure", vec!["cardiac failure", "chf", "congestive heart failure"]),
        ("stroke", vec!["cerebrovascular accident", "cva", "brain attack"]),
        // Metabolic
        ("diabetes", vec!["diabetes mellitus", "diabetic", "hyperglycemia"]),
        ("obesity", vec!["overweight", "adiposity", "excess body weight"]),
        // Oncology
        ("cancer", vec!["malignancy", "neoplasm", "tumor", "carcinoma"]),
        ("lung cancer", vec!["pulmonary cancer", "bronchogenic carcinoma", "nsclc", "sclc"]),
        ("breast cancer", vec!["mammary carcinoma", "breast neoplasm"]),
        // Neurology
        ("alzheimer", vec!["alzheimer's disease", "alzheimer disease", "dementia"]),
        ("parkinson", vec!["parkinson's disease", "pd", "parkinsonian syndrome"]),
        ("epilepsy", vec!["seizure disorder", "convulsions"]),
        // Rheumatology
        ("arthritis", vec!["joint inflammation", "arthritic disease"]),
        ("rheumatoid arthritis", vec!["ra", "rheumatoid disease"]),
    ])
});

static DRUG_SYNONYMS: LazyLock<SynonymTable> = LazyLock::new(|| {
    HashMap::from([
        ("antibiotic", vec!["antimicrobial", "antibacterial", "anti-infective"]),
        ("antihypertensive", vec!["blood pressure medication", "hypertension drug"]),
        ("antidiabetic", vec!["diabetes medication", "glucose-lowering drug", "hypoglycemic agent"]),
        ("statin", vec!["cholesterol medication", "lipid-lowering drug", "hmg-coa reductase inhibitor"]),
        ("immunosuppressant", vec!["immunomodulator", "immune suppressant"]),
        ("antidepressant", vec!["depression medication", "ssri", "antidepressive"]),
        ("bronchodilator", vec!["asthma inhaler", "respiratory medication"]),
    ])
});

static GEOGRAPHIC_SYNONYMS: LazyLock<SynonymTable> = LazyLock::new(|| {
    HashMap::from([
        ("india", vec!["indian", "south asia", "bharat"]),
        ("china", vec!["chinese", "prc"]),
        ("usa", vec!["united states", "us", "america", "american"]),
        ("europe", vec!["european", "eu"]),
    ])
});

/// Query term -> MeSH-like canonical forms.
static CANONICAL_MAPPING: LazyLock<SynonymTable> = LazyLock::new(|| {
    HashMap::from([
        ("respiratory diseases", vec!["COPD", "Asthma", "Interstitial Lung Disease", "Pneumonia", "Tuberculosis"]),
        ("lung disease", vec!["COPD", "Asthma", "Lung Cancer", "Pulmonary Fibrosis"]),
        ("heart disease", vec!["Coronary Artery Disease", "Heart Failure", "Arrhythmia", "Hypertension"]),
        ("cardiovascular", vec!["Hypertension", "Heart Failure", "Coronary Artery Disease", "Stroke", "Atrial Fibrillation"]),
        ("diabetes", vec!["Type 2 Diabetes", "Type 1 Diabetes", "Diabetic Complications"]),
        ("cancer", vec!["Lung Cancer", "Breast Cancer", "Colorectal Cancer", "Prostate Cancer"]),
        ("pain", vec!["Chronic Pain", "Neuropathic Pain", "Inflammatory Pain"]),
        ("neurological", vec!["Alzheimer Disease", "Parkinson Disease", "Epilepsy", "Multiple Sclerosis"]),
    ])
});

static GEOGRAPHIC_REGIONS: &[(&str, &str)] = &[
    ("india", "India"),
    ("china", "China"),
    ("united states", "United States"),
    ("europe", "Europe"),
    ("asia", "Asia"),
];

/// Dictionary-backed [`Normalizer`] built on curated synonym and canonical
/// term tables.
#[derive(Default)]
pub struct TermNormalizer;

impl TermNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn extract_entities(&self, query: &str) -> QueryEntities {
        let mut entities = QueryEntities::default();

        for (term, synonyms) in DISEASE_SYNONYMS.iter() {
            if query.contains(term) || synonyms.iter().any(|s| query.contains(s)) {
                entities.conditions.push(term.to_string());
            }
        }
        for (term, synonyms) in DRUG_SYNONYMS.iter() {
            if query.contains(term) || synonyms.iter().any(|s| query.contains(s)) {
                entities.drugs.push(term.to_string());
            }
        }
        for (term, synonyms) in GEOGRAPHIC_SYNONYMS.iter() {
            if query.contains(term) || synonyms.iter().any(|s| query.contains(s)) {
                entities.locations.push(term.to_string());
            }
        }

        // Stable ordering; HashMap iteration is not.
        entities.conditions.sort();
        entities.drugs.sort();
        entities.locations.sort();
        entities
    }

    fn map_to_canonical(&self, conditions: &[String]) -> Vec<String> {
        let mut canonical = BTreeSet::new();

        for condition in conditions {
            if let Some(terms) = CANONICAL_MAPPING.get(condition.as_str()) {
                canonical.extend(terms.iter().map(|t| t.to_string()));
            }
            for (key, terms) in CANONICAL_MAPPING.iter() {
                if condition.contains(key) || key.contains(condition.as_str()) {
                    canonical.extend(terms.iter().map(|t| t.to_string()));
                }
            }
        }

        // Fallback: title-case the raw condition when nothing mapped.
        if canonical.is_empty() {
            for condition in conditions {
                canonical.insert(title_case(condition));
            }
        }

        canonical.into_iter().collect()
    }

    fn expand_synonyms(&self, terms: &[String]) -> Vec<String> {
        let mut synonyms = BTreeSet::new();
        for term in terms {
            synonyms.insert(term.clone());
            for table in [&*DISEASE_SYNONYMS, &*DRUG_SYNONYMS, &*GEOGRAPHIC_SYNONYMS] {
                if let Some(syns) = table.get(term.as_str()) {
                    synonyms.extend(syns.iter().map(|s| s.to_string()));
                }
            }
        }
        synonyms.into_iter().collect()
    }

    fn build_expanded_query(&self, canonical: &[String], synonyms: &[String]) -> String {
        let mut terms: Vec<String> = canonical
            .iter()
            .chain(synonyms.iter().take(10))
            .filter(|t| t.len() > 2)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
        terms.truncate(8);
        terms.join(" OR ")
    }
}

impl Normalizer for TermNormalizer {
    fn normalize(&self, query: &str) -> NormalizedQuery {
        let query_lower = query.to_lowercase();
        let entities = self.extract_entities(&query_lower);
        let canonical_terms = self.map_to_canonical(&entities.conditions);

        let mut expandable = entities.conditions.clone();
        expandable.extend(entities.drugs.clone());
        let synonyms = self.expand_synonyms(&expandable);

        let expanded_query = self.build_expanded_query(&canonical_terms, &synonyms);
        let normalized = normalize_text(&query_lower);

        let search_terms = SearchTerms {
            clinical_trials: canonical_terms.iter().take(5).cloned().collect(),
            patents: canonical_terms.iter().take(3).cloned().collect(),
            literature: synonyms.iter().take(8).cloned().collect(),
        };

        NormalizedQuery {
            original: query.to_string(),
            normalized,
            canonical_terms,
            synonyms,
            entities,
            expanded_query,
            search_terms,
        }
    }

    fn parse_intent(&self, query: &str) -> QueryIntent {
        let query_lower = query.to_lowercase();
        let mut intent = QueryIntent::default();

        if ["competition", "competitive", "market"]
            .iter()
            .any(|w| query_lower.contains(w))
        {
            intent.focus_areas.push(FocusArea::CompetitionAnalysis);
        }
        if ["burden", "prevalence", "patients"]
            .iter()
            .any(|w| query_lower.contains(w))
        {
            intent.focus_areas.push(FocusArea::PatientBurden);
        }
        if ["opportunity", "gap", "unmet"]
            .iter()
            .any(|w| query_lower.contains(w))
        {
            intent.focus_areas.push(FocusArea::OpportunityDetection);
        }

        intent.geographic_region = GEOGRAPHIC_REGIONS
            .iter()
            .find(|(key, _)| query_lower.contains(key))
            .map(|(_, region)| region.to_string());

        intent
    }

    fn match_score(&self, query: &str, text: &str) -> f32 {
        let normalized = self.normalize(query);
        let text_lower = text.to_lowercase();

        let mut matches = 0u32;
        let mut total = 0u32;

        // Canonical terms weighted double.
        for term in &normalized.canonical_terms {
            total += 2;
            if text_lower.contains(&term.to_lowercase()) {
                matches += 2;
            }
        }
        for syn in normalized.synonyms.iter().take(10) {
            total += 1;
            if text_lower.contains(&syn.to_lowercase()) {
                matches += 1;
            }
        }

        if total == 0 {
            0.0
        } else {
            matches as f32 / total as f32
        }
    }

    fn matched_terms(&self, query: &str, text: &str) -> Vec<String> {
        let normalized = self.normalize(query);
        let text_lower = text.to_lowercase();

        let mut terms: BTreeSet<String> = normalized.canonical_terms.into_iter().collect();
        terms.extend(normalized.synonyms.into_iter().take(15));

        terms
            .into_iter()
            .filter(|t| text_lower.contains(&t.to_lowercase()))
            .collect()
    }
}

fn normalize_text(query: &str) -> String {
    let replacements = [
        ("painkiller", "analgesic"),
        ("heart disease", "cardiovascular disease"),
        ("high blood pressure", "hypertension"),
        ("breathing", "respiratory"),
    ];
    let mut normalized = query.to_string();
    for (old, new) in replacements {
        normalized = normalized.replace(old, new);
    }
    normalized
}

fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
