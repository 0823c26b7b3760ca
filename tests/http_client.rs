//! Integration tests for HttpApiClient using wiremock

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use siteaudit_lib::api::{AnalysisApi, ApiClientConfig, ApiError, HttpApiClient};
use siteaudit_lib::models::{AnalysisStatus, ReportScores, ReportTier};

fn create_client(mock_server: &MockServer, token: Option<&str>) -> HttpApiClient {
    HttpApiClient::new(ApiClientConfig {
        base_url: mock_server.uri(),
        token: token.map(str::to_string),
        request_timeout: Duration::from_secs(5),
        account_timeout: Duration::from_secs(1),
    })
    .unwrap()
}

fn analysis_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "url": "https://example.com",
        "status": status,
        "scores": { "overall": 82, "accessibility": 75, "seo": 90, "performance": 58 },
        "screenshots": [{ "url": "https://cdn.example.com/a1.png", "device": "desktop" }],
        "issues": {
            "accessibility": [{ "title": "Images must have alternate text", "impact": "critical" }]
        }
    })
}

#[tokio::test]
async fn test_get_by_id_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/a1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": analysis_json("a1", "completed_with_errors")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    let analysis = client.get_by_id("a1").await.unwrap();

    assert_eq!(analysis.id, "a1");
    assert_eq!(analysis.status, AnalysisStatus::CompletedWithErrors);
    assert!(analysis.is_terminal());
    assert_eq!(analysis.scores.unwrap().performance, Some(58.0));
    assert_eq!(analysis.issues.accessibility.len(), 1);
    assert_eq!(analysis.screenshots[0].device.as_deref(), Some("desktop"));
}

#[tokio::test]
async fn test_get_by_id_accepts_null_score() {
    let mock_server = MockServer::start().await;

    let mut body = analysis_json("a1", "completed_with_errors");
    body["scores"]["performance"] = serde_json::Value::Null;
    Mock::given(method("GET"))
        .and(path("/api/analysis/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": body
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, None);
    let analysis = client.get_by_id("a1").await.unwrap();

    assert!(analysis.is_terminal());
    let scores = analysis.scores.unwrap();
    assert_eq!(scores.overall, Some(82.0));
    assert_eq!(scores.performance, None);
}

#[tokio::test]
async fn test_start_analysis_posts_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analysis"))
        .and(body_json(json!({ "url": "https://example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": analysis_json("new-1", "pending")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, None);
    let analysis = client.start_analysis("  https://example.com ").await.unwrap();

    assert_eq!(analysis.id, "new-1");
    assert_eq!(analysis.status, AnalysisStatus::Pending);
}

#[tokio::test]
async fn test_envelope_rejection_carries_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/a1/report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Report is still being generated"
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, None);
    let err = client.get_report("a1").await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.user_message("fallback"), "Report is still being generated");
}

#[tokio::test]
async fn test_reports_accept_both_score_shapes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/a1/report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "r1",
                "analysisId": "a1",
                "reportType": "overview",
                "scores": { "overall": 70, "accessibility": 65, "custom": 80 },
                "summary": { "totalViolations": 4, "critical": 1 },
                "issuePreview": { "categories": [{ "name": "Contrast", "count": 4 }] }
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/a1/report/detailed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "r2",
                "analysisId": "a1",
                "reportType": "detailed",
                "scores": { "overall": 70, "accessibility": 65, "seo": 72, "performance": 61 },
                "violations": [
                    { "id": "color-contrast", "description": "Low contrast", "impact": "serious", "nodes": 4 }
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, None);

    let overview = client.get_report("a1").await.unwrap();
    assert_eq!(overview.report_type, ReportTier::Overview);
    assert!(matches!(overview.scores, ReportScores::Legacy(_)));
    assert_eq!(overview.summary.total_violations, 4);

    let detailed = client.get_detailed_report("a1").await.unwrap();
    assert_eq!(detailed.report_type, ReportTier::Detailed);
    assert!(matches!(detailed.scores, ReportScores::Standard(_)));
    assert_eq!(detailed.violations.unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_error_uses_backend_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Analysis not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, None);
    let err = client.get_by_id("missing").await.unwrap_err();

    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 404);
            assert_eq!(message.as_deref(), Some("Analysis not found"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_download_pdf_returns_bytes() {
    let mock_server = MockServer::start().await;
    let pdf = b"%PDF-1.7 test".to_vec();

    Mock::given(method("GET"))
        .and(path("/api/analysis/a1/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf.clone()),
        )
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    assert_eq!(client.download_pdf("a1").await.unwrap(), pdf);
}

#[tokio::test]
async fn test_delete_account_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/account"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    client.delete_account().await.unwrap();
}

#[tokio::test]
async fn test_delete_account_message_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Cancel your subscription before deleting your account."
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    let err = client.delete_account().await.unwrap_err();

    assert_eq!(
        err.user_message("Failed to delete account. Please try again."),
        "Cancel your subscription before deleting your account."
    );
}

#[tokio::test]
async fn test_delete_account_fallback_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    let err = client.delete_account().await.unwrap_err();

    assert_eq!(
        err.user_message("Failed to delete account. Please try again."),
        "Failed to delete account. Please try again."
    );
}

#[tokio::test]
async fn test_delete_account_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server, Some("secret"));
    let err = client.delete_account().await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout { seconds: 1 }));
}

#[tokio::test]
async fn test_delete_account_requires_token() {
    let mock_server = MockServer::start().await;

    let client = create_client(&mock_server, None);
    let err = client.delete_account().await.unwrap_err();

    assert!(matches!(err, ApiError::MissingToken));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
