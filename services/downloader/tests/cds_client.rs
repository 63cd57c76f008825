//! CDS retrieve protocol against a mock server.

use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;
use tmax_common::{Area, YearMonth};
use tmax_downloader::config::ArchiveConfig;
use tmax_downloader::{ArchiveClient, ArchiveError, CdsClient, CdsCredentials, RetrievalRequest};

const DATASET: &str = "derived-era5-land-daily-statistics";
const EXECUTE: &str = "/api/retrieve/v1/processes/derived-era5-land-daily-statistics/execution";
const JOB: &str = "/api/retrieve/v1/jobs/job-1";
const RESULTS: &str = "/api/retrieve/v1/jobs/job-1/results";

fn client(server: &Server) -> CdsClient {
    let credentials = CdsCredentials {
        url: format!("{}/api/", server.url()),
        key: "test-key".to_string(),
    };
    CdsClient::new(credentials, &ArchiveConfig::default())
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

fn june_request() -> RetrievalRequest {
    RetrievalRequest::daily_maximum(YearMonth::new(2023, 6).unwrap(), Area::italy())
}

fn json_body(value: serde_json::Value) -> String {
    value.to_string()
}

#[tokio::test]
async fn test_submit_poll_download() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("temp_2023_06.nc");

    let submit = server
        .mock("POST", EXECUTE)
        .match_header("PRIVATE-TOKEN", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "inputs": {
                "variable": ["2m_temperature"],
                "year": "2023",
                "month": "06",
                "daily_statistic": "daily_maximum",
                "area": [47.0, 13.0, 39.0, 20.0]
            }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"jobID": "job-1", "status": "accepted"})))
        .create_async()
        .await;

    let poll = server
        .mock("GET", JOB)
        .match_header("PRIVATE-TOKEN", "test-key")
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"jobID": "job-1", "status": "successful"})))
        .create_async()
        .await;

    let results = server
        .mock("GET", RESULTS)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "asset": {
                "value": {
                    "href": format!("{}/download/job-1.nc", server.url()),
                    "file:size": 8
                }
            }
        })))
        .create_async()
        .await;

    let download = server
        .mock("GET", "/download/job-1.nc")
        .with_body(b"CDF\x01data")
        .create_async()
        .await;

    let bytes = client(&server)
        .retrieve(DATASET, &june_request(), &target)
        .await
        .unwrap();

    assert_eq!(bytes, 8);
    assert_eq!(std::fs::read(&target).unwrap(), b"CDF\x01data");
    submit.assert_async().await;
    poll.assert_async().await;
    results.assert_async().await;
    download.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    server
        .mock("POST", EXECUTE)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"title": "Unauthorized", "detail": "invalid token"})))
        .create_async()
        .await;

    let err = client(&server)
        .retrieve(DATASET, &june_request(), &dir.path().join("x.nc"))
        .await
        .unwrap_err();

    match err {
        ArchiveError::Auth(message) => assert!(message.contains("invalid token"), "{message}"),
        other => panic!("expected auth error, got {other}"),
    }
}

#[tokio::test]
async fn test_quota_exceeded() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    server
        .mock("POST", EXECUTE)
        .with_status(429)
        .create_async()
        .await;

    let err = client(&server)
        .retrieve(DATASET, &june_request(), &dir.path().join("x.nc"))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Quota(_)), "{err}");
}

#[tokio::test]
async fn test_bad_request_rejected() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    server
        .mock("POST", EXECUTE)
        .with_status(400)
        .with_body(json_body(json!({"detail": "invalid area"})))
        .create_async()
        .await;

    let err = client(&server)
        .retrieve(DATASET, &june_request(), &dir.path().join("x.nc"))
        .await
        .unwrap_err();

    match err {
        ArchiveError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid area");
        }
        other => panic!("expected rejection, got {other}"),
    }
}

#[tokio::test]
async fn test_failed_job() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    server
        .mock("POST", EXECUTE)
        .with_status(201)
        .with_body(json_body(json!({"jobID": "job-1", "status": "accepted"})))
        .create_async()
        .await;
    server
        .mock("GET", JOB)
        .with_body(json_body(json!({"jobID": "job-1", "status": "failed"})))
        .create_async()
        .await;
    server
        .mock("GET", RESULTS)
        .with_status(400)
        .with_body(json_body(json!({
            "title": "The job has failed",
            "detail": "Request too large"
        })))
        .create_async()
        .await;

    let err = client(&server)
        .retrieve(DATASET, &june_request(), &dir.path().join("x.nc"))
        .await
        .unwrap_err();

    match err {
        ArchiveError::JobFailed {
            job_id,
            status,
            message,
        } => {
            assert_eq!(job_id, "job-1");
            assert_eq!(status, "failed");
            assert!(message.contains("Request too large"), "{message}");
        }
        other => panic!("expected failed job, got {other}"),
    }
}

#[tokio::test]
async fn test_size_mismatch() {
    let mut server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();

    server
        .mock("POST", EXECUTE)
        .with_status(201)
        .with_body(json_body(json!({"jobID": "job-1", "status": "successful"})))
        .create_async()
        .await;
    server
        .mock("GET", RESULTS)
        .with_body(json_body(json!({
            "asset": {"value": {"href": "/download/job-1.nc", "file:size": 100}}
        })))
        .create_async()
        .await;
    server
        .mock("GET", "/download/job-1.nc")
        .with_body(b"short")
        .create_async()
        .await;

    let err = client(&server)
        .retrieve(DATASET, &june_request(), &dir.path().join("x.nc"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ArchiveError::SizeMismatch { expected: 100, actual: 5 }),
        "{err}"
    );
}
