//! Worker adapters against mocked upstream APIs.

use pharos::types::AppError;
use pharos::workers::{
    ClinicalTrialsWorker, LiteratureWorker, PatentWorker, SearchWorker,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============= Clinical trials =============

fn study(nct_id: &str, status: &str) -> serde_json::Value {
    json!({
        "protocolSection": {
            "identificationModule": {"nctId": nct_id, "briefTitle": "Trial"},
            "statusModule": {"overallStatus": status},
            "designModule": {"phases": ["PHASE3"]},
            "conditionsModule": {"conditions": ["Lung Cancer"]}
        }
    })
}

#[tokio::test]
async fn clinical_worker_joins_expanded_terms_with_or() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/studies"))
        .and(query_param("query.cond", "Lung Cancer OR NSCLC"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "studies": [study("NCT00000001", "RECRUITING"), study("NCT00000002", "COMPLETED")]
        })))
        .mount(&mock)
        .await;

    let worker = ClinicalTrialsWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker
        .search("lung cancer studies", 20, &terms(&["Lung Cancer", "NSCLC"]))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].nct_id, "NCT00000001");
    assert_eq!(results[0].phase.as_deref(), Some("PHASE3"));
}

#[tokio::test]
async fn clinical_worker_treats_zero_matches_as_success() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/studies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"studies": []})))
        .mount(&mock)
        .await;

    let worker = ClinicalTrialsWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker.search("obscure condition xyz", 20, &[]).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn clinical_worker_surfaces_upstream_errors_as_domain_errors() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/studies"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let worker = ClinicalTrialsWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let err = worker.search("lung cancer", 20, &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Worker(_)));
}

// ============= Literature =============

#[tokio::test]
async fn literature_worker_parses_publications() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("sort", "CITED desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultList": {
                "result": [
                    {
                        "pmid": "111",
                        "title": "NSCLC outcomes",
                        "abstractText": "Background.",
                        "journalTitle": "The Lancet",
                        "citedByCount": 400
                    },
                    {"doi": "10.1000/x", "title": "Second paper"}
                ]
            }
        })))
        .mount(&mock)
        .await;

    let worker = LiteratureWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker
        .search("lung cancer literature", 20, &terms(&["nsclc", "lung cancer"]))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(results[0].source, "The Lancet");
    assert!((results[0].relevance_score - 0.7).abs() < 0.001);
    assert_eq!(results[1].url, "https://doi.org/10.1000/x");
}

#[tokio::test]
async fn literature_worker_handles_missing_result_list() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let worker = LiteratureWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker.search("anything", 20, &[]).await.unwrap();
    assert!(results.is_empty());
}

// ============= Patents =============

#[tokio::test]
async fn patent_worker_merges_curated_and_scraped_sources() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/result.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="/US99887766B2.html">Novel insulin formulation</a>
            </body></html>"#,
        ))
        .mount(&mock)
        .await;

    let worker = PatentWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker
        .search("diabetes treatments", 20, &terms(&["diabetes"]))
        .await
        .unwrap();

    // Curated diabetes hits come first (keyword-scored), scrape adds more.
    assert!(results
        .iter()
        .any(|p| p.title.to_lowercase().contains("diabetes")));
    assert!(results.iter().any(|p| p.patent_id == "US99887766B2"));
}

#[tokio::test]
async fn patent_worker_survives_a_dead_scrape_source() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/result.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock)
        .await;

    let worker = PatentWorker::with_base_url(reqwest::Client::new(), mock.uri());
    let results = worker
        .search("asthma inhaler devices", 20, &terms(&["asthma"]))
        .await
        .unwrap();

    // Curated results still flow when the scrape source is down.
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .any(|p| p.title.to_lowercase().contains("asthma")));
}
