//! HTTP client tests against a mock analysis backend.

#![cfg(feature = "http")]

use onco_analysis::{
    AnalysisRequest, AnalysisService, AnalysisType, ChartKind, DatasetSummary,
    HttpAnalysisService, ServiceConfig,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn service(server: &MockServer) -> HttpAnalysisService {
    let config = ServiceConfig::builder()
        .base_url(format!("{}/api/", server.uri()))
        .timeout_secs(5)
        .build()
        .unwrap();
    HttpAnalysisService::new(config).unwrap()
}

#[tokio::test]
async fn test_run_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/brca_tcga_pub2015/analysis"))
        .and(body_json(json!({
            "type": "correlation",
            "gene": "TP53",
            "gene2": "BRCA1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GeneA_point": [1.0, 2.0],
            "GeneB_point": [3.0, 4.0]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = AnalysisRequest::new("brca_tcga_pub2015", AnalysisType::Correlation, "TP53")
        .with_gene2("BRCA1");
    let raw = service(&server).await.run(&request).await.unwrap();
    assert_eq!(raw["GeneB_point"], json!([3.0, 4.0]));
}

#[tokio::test]
async fn test_run_sends_clinical_feature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/luad/analysis"))
        .and(body_json(json!({
            "type": "methylation",
            "gene": "MLH1",
            "clinicalFeature": "Tumor Histology"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"analyses": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let request = AnalysisRequest::new("luad", AnalysisType::Methylation, "MLH1")
        .with_clinical_feature("tumor histology");
    let raw = service(&server).await.run(&request).await.unwrap();
    assert_eq!(raw, json!({"analyses": {}}));
}

#[tokio::test]
async fn test_run_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/brca/analysis"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let request = AnalysisRequest::new("brca", AnalysisType::Survival, "TP53");
    let err = service(&server).await.run(&request).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("database unavailable"), "{message}");
}

#[tokio::test]
async fn test_list_datasets_grouped_by_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Breast Cancer": [
                {"id": "brca_tcga_pub2015", "name": "brca_tcga_pub2015", "type": "Breast Cancer"}
            ],
            "Lung Cancer": [
                {"id": "luad_tcga", "name": "luad_tcga", "type": "Lung Cancer"},
                {"id": "lusc_tcga", "name": "lusc_tcga", "type": "Lung Cancer"}
            ]
        })))
        .mount(&server)
        .await;

    let groups = service(&server).await.list_datasets().await.unwrap();
    assert_eq!(
        groups.keys().collect::<Vec<_>>(),
        vec!["Breast Cancer", "Lung Cancer"]
    );
    assert_eq!(groups["Lung Cancer"][1].id, "lusc_tcga");
    assert_eq!(groups["Breast Cancer"][0].cancer_type, "Breast Cancer");
}

#[tokio::test]
async fn test_dataset_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Dataset not found"})),
        )
        .mount(&server)
        .await;

    let err = service(&server).await.dataset("missing").await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_clinical_records_and_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/brca/clinical"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "patient_id": "TCGA-A1-A0SB",
                "age": "70",
                "race": "WHITE",
                "gender": "Female",
                "stage": "Stage I",
                "status": "Alive",
                "survival_months": 8.5
            },
            {"patient_id": "TCGA-A1-A0SD", "age": null}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/brca/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sex": [{"category": "Female", "value": 1072}, {"category": "Male", "value": 12}],
            "kmOverall": [
                {"time": 0.0, "survival": 1.0, "censored": false},
                {"time": 24.0, "survival": 0.9, "censored": true}
            ],
            "heatmap": {"ignored": true}
        })))
        .mount(&server)
        .await;

    let client = service(&server).await;
    let records = client.clinical_records("brca").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].age, Some(70.0));
    assert_eq!(records[0].survival_months, Some(8.5));
    assert_eq!(records[1].age, None);
    assert_eq!(records[1].race, None);

    let summary = client.summary("brca").await.unwrap();
    assert_eq!(summary.sex.len(), 2);
    assert_eq!(summary.sex[0].value, 1072);
    assert!(summary.mutation_vs_fraction.is_empty());
    assert_eq!(
        summary.section_csv("sex").unwrap(),
        "Category,Value\nFemale,1072\nMale,12\n"
    );
    assert_eq!(summary.overall_survival_spec().unwrap().kind, ChartKind::Survival);
}

#[tokio::test]
async fn test_dataset_id_is_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/brca%2Ftcga/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let summary = service(&server).await.summary("brca/tcga").await.unwrap();
    assert_eq!(summary, DatasetSummary::default());
}
