//! Retry/backoff behavior of the HTTP client against failing endpoints.

use std::time::{Duration, Instant};

use comic_crawler::{FetchError, HttpClient, HttpClientOptions, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(policy: RetryPolicy) -> HttpClient {
    HttpClient::with_options(HttpClientOptions {
        retry_policy: policy,
        connect_timeout_secs: 2,
        read_timeout_secs: 5,
        ..HttpClientOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_always_failing_url_gets_exactly_five_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/0.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(5, Duration::from_millis(20));
    let budget = policy.total_backoff();
    assert_eq!(budget, Duration::from_millis(20 + 40 + 80 + 160));

    let started = Instant::now();
    let result = client(policy)
        .fetch(&format!("{}/img/0.jpg", server.uri()))
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(FetchError::HttpStatus { status: 503, .. })
    ));
    assert!(elapsed >= budget, "returned before backoff completed: {elapsed:?}");
    assert!(
        elapsed < budget + Duration::from_secs(5),
        "took too long: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_refused_connection_gets_five_attempts_then_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let policy = RetryPolicy::new(5, Duration::from_millis(10));
    let budget = policy.total_backoff();
    assert_eq!(budget, Duration::from_millis(10 + 20 + 40 + 80));

    let started = Instant::now();
    let result = client(policy)
        .fetch(&format!("http://127.0.0.1:{port}/cover.jpg"))
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(FetchError::Network { .. } | FetchError::Timeout { .. })
    ));
    assert!(elapsed >= budget, "returned before backoff completed: {elapsed:?}");
    assert!(
        elapsed < budget + Duration::from_secs(5),
        "took too long: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_success_on_last_attempt_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(4)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .mount(&server)
        .await;

    let body = client(RetryPolicy::new(5, Duration::from_millis(1)))
        .fetch_text(&format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "finally");
}
