//! End-to-end tests of the reqwest transport against a local HTTP server

use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wba_tasks::{
    AsyncTaskClient, AuthHeaders, ClientConfig, JobKind, JobOutcome, PollOptions, Submission,
    SubmissionError, TELEGRAM_INIT_DATA_HEADER,
};

const INIT_DATA: &str = "query_id=AAE&user=%7B%22id%22%3A1%7D&hash=abc";

fn client_for(server: &MockServer) -> AsyncTaskClient {
    let config = ClientConfig {
        base_url: server.uri(),
        init_data: Some(INIT_DATA.to_string()),
        ..Default::default()
    };
    AsyncTaskClient::from_config(&config).unwrap()
}

fn fast(max_attempts: u32) -> PollOptions {
    PollOptions::new(Duration::from_millis(20), max_attempts)
}

#[tokio::test]
async fn test_immediate_success_skips_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/seo/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success", "total": 42})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/seo/(queue|result)/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client
        .run_kind(JobKind::ContentGeneration, json!({"nm_id": 1}), &AuthHeaders::telegram(INIT_DATA), fast(5))
        .await
        .unwrap();

    assert_eq!(outcome, JobOutcome::success(json!({"status": "success", "total": 42})));
    assert_eq!(client.metrics().immediate, 1);
}

#[tokio::test]
async fn test_rejected_submission_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/reviews"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "limit exceeded"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .run_kind(JobKind::ReviewAnalysis, json!({}), &AuthHeaders::new(), fast(5))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmissionError::Rejected {
            status: 403,
            message: "limit exceeded".to_string()
        }
    );
    assert_eq!(err.message(), "limit exceeded");
    assert_eq!(client.metrics().submission_errors, 1);
}

#[tokio::test]
async fn test_non_json_error_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .run_kind(JobKind::KeywordClustering, json!({}), &AuthHeaders::new(), fast(5))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "HTTP 502");
}

#[tokio::test]
async fn test_unreachable_backend_is_submission_error() {
    let config = ClientConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        http_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let client = AsyncTaskClient::from_config(&config).unwrap();
    let err = client
        .run_kind(JobKind::ReviewAnalysis, json!({}), &AuthHeaders::new(), fast(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Transport(_)));
}

#[tokio::test]
async fn test_full_job_lifecycle_over_http() {
    let server = MockServer::start().await;
    let headers = AuthHeaders::telegram(INIT_DATA);

    Mock::given(method("POST"))
        .and(path("/api/seo/clusters"))
        .and(header(TELEGRAM_INIT_DATA_HEADER, INIT_DATA))
        .and(body_json(json!({"keywords": ["платье", "платье летнее"]})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "task_id": "c0ffee",
            "queue": "normal",
            "position": 3,
            "is_priority": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/seo/queue/c0ffee"))
        .and(header(TELEGRAM_INIT_DATA_HEADER, INIT_DATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"position": 1, "queue": "normal"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/seo/result/c0ffee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "PENDING",
            "info": "Clustering 2 keywords"
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/seo/result/c0ffee"))
        .and(header(TELEGRAM_INIT_DATA_HEADER, INIT_DATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "data": {"clusters": [["платье", "платье летнее"]]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .request(
            JobKind::KeywordClustering,
            json!({"keywords": ["платье", "платье летнее"]}),
        )
        .unwrap();

    let job = match client.submit(&request, &headers).await.unwrap() {
        Submission::Accepted(job) => job,
        Submission::Resolved(outcome) => panic!("unexpected immediate outcome: {:?}", outcome),
    };
    assert_eq!(job.id(), "c0ffee");
    assert_eq!(job.initial_status().position, Some(3));

    let infos = Arc::new(Mutex::new(Vec::new()));
    let positions = Arc::new(Mutex::new(Vec::new()));
    let (info_sink, position_sink) = (infos.clone(), positions.clone());
    let options = fast(10)
        .on_info(move |msg| info_sink.lock().unwrap().push(msg.to_string()))
        .on_status(move |s| position_sink.lock().unwrap().push(s.position));

    let outcome = client.poll(&job, options).await;

    assert_eq!(
        outcome,
        JobOutcome::success(json!({"clusters": [["платье", "платье летнее"]]}))
    );
    assert_eq!(infos.lock().unwrap().len(), 2);
    assert_eq!(
        *positions.lock().unwrap(),
        vec![Some(3), Some(1), Some(1), Some(1)]
    );
}

#[tokio::test]
async fn test_server_errors_while_polling_are_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/queue/t-9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/result/t-9"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/result/t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "FAILURE",
            "result": {"error": "WB API unavailable"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let endpoints = JobKind::ReviewAnalysis.endpoints(&server.uri()).unwrap();
    let job = wba_tasks::Job::new("t-9", JobKind::ReviewAnalysis, endpoints, AuthHeaders::new());

    let outcome = client.poll(&job, fast(10)).await;
    assert_eq!(outcome, JobOutcome::failure("WB API unavailable"));

    let requests = server.received_requests().await.unwrap();
    let result_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/analysis/result/t-9")
        .count();
    assert_eq!(result_calls, 3);
}
