//! Publisher integration tests against mock store and webhook servers

use speedtest_monitor::{
    logging::{LogFormat, LogLevel, Logger},
    models::{SpeedTestResult, TestServer},
    publish::{InfluxWriter, Notifier, PointWriter, ResultPublisher, WebhookNotifier},
    AppError,
};
use std::sync::Arc;
use wiremock::{
    matchers::{basic_auth, body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn quiet_logger() -> Logger {
    Logger::new(LogLevel::Critical, false, LogFormat::Console)
}

fn sample_result() -> SpeedTestResult {
    SpeedTestResult {
        download_bps: 93_457_812.0,
        upload_bps: 10_218_456.0,
        latency_ms: 18.345,
        server: TestServer {
            id: 1234,
            name: "Amsterdam".to_string(),
            country: "Netherlands".to_string(),
            sponsor: "ExampleNet".to_string(),
            host: "ams.example.net:8080".to_string(),
            url: "http://ams.example.net/speedtest/upload.php".to_string(),
            lat: 52.37,
            lon: 4.89,
            distance_km: Some(3.2),
            latency_ms: 18.345,
        },
    }
}

fn writer_for(server: &MockServer, credentials: Option<(String, String)>) -> InfluxWriter {
    InfluxWriter::with_base_url(
        &server.uri(),
        "mock-store",
        "speedtests",
        credentials,
        true,
        &quiet_logger(),
    )
    .unwrap()
}

#[tokio::test]
async fn connect_succeeds_against_healthy_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    assert!(writer.connect().await.is_ok());
}

#[tokio::test]
async fn connect_sends_configured_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(basic_auth("monitor", "secret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(
        &server,
        Some(("monitor".to_string(), "secret".to_string())),
    );
    assert!(writer.connect().await.is_ok());
}

#[tokio::test]
async fn connect_distinguishes_rejected_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let err = writer.connect().await.unwrap_err();

    assert!(matches!(err, AppError::StoreAuthRejected(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn connect_distinguishes_unreachable_host() {
    // Nothing listens here; the connection is refused
    let writer = InfluxWriter::with_base_url(
        "http://127.0.0.1:1",
        "127.0.0.1",
        "speedtests",
        None,
        true,
        &quiet_logger(),
    )
    .unwrap();

    let err = writer.connect().await.unwrap_err();

    assert!(matches!(err, AppError::StoreUnreachable(_)));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("127.0.0.1"));
}

#[tokio::test]
async fn connect_reports_unexpected_status_distinctly() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let err = writer.connect().await.unwrap_err();

    assert!(matches!(err, AppError::StoreConnect(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn write_point_sends_line_protocol() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("db", "speedtests"))
        .and(wiremock::matchers::body_string_contains(
            "speed_test_results,server=1234",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let point = ResultPublisher::build_point(&sample_result());

    assert!(writer.write_point(&point).await.is_ok());
}

#[tokio::test]
async fn missing_database_triggers_create_and_single_retry() {
    let server = MockServer::start().await;

    // First write attempt: the database does not exist yet
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"error":"database not found: \"speedtests\""}"#),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Exactly one create-database query
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // The retried write succeeds
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let point = ResultPublisher::build_point(&sample_result());

    assert!(writer.write_point(&point).await.is_ok());
}

#[tokio::test]
async fn second_write_failure_is_not_retried_again() {
    let server = MockServer::start().await;

    // Every write reports a missing database: one original attempt plus
    // exactly one retry, never more
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"error":"database not found: \"speedtests\""}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let point = ResultPublisher::build_point(&sample_result());

    let err = writer.write_point(&point).await.unwrap_err();
    assert!(matches!(err, AppError::StoreWrite(_)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn other_write_failures_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let writer = writer_for(&server, None);
    let point = ResultPublisher::build_point(&sample_result());

    let err = writer.write_point(&point).await.unwrap_err();
    assert!(matches!(err, AppError::StoreWrite(_)));
}

#[tokio::test]
async fn webhook_posts_scaled_payload_to_keyed_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger/speedtest/with/key/testkey"))
        .and(body_json(serde_json::json!({
            "value1": 18.345,
            "value2": 93.46,
            "value3": 10.22,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri(), "testkey", &quiet_logger()).unwrap();
    assert!(notifier.notify(&sample_result()).await.is_ok());
}

#[tokio::test]
async fn webhook_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri(), "testkey", &quiet_logger()).unwrap();
    let err = notifier.notify(&sample_result()).await.unwrap_err();

    assert!(matches!(err, AppError::Notify(_)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn publisher_writes_store_point_even_when_webhook_is_down() {
    let store = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&store)
        .await;

    let writer = Arc::new(writer_for(&store, None));
    // Nothing listens on the webhook side
    let notifier: Arc<dyn Notifier> = Arc::new(
        WebhookNotifier::new("http://127.0.0.1:1", "testkey", &quiet_logger()).unwrap(),
    );

    let publisher = ResultPublisher::new(writer, Some(notifier), &quiet_logger());

    // Both failures are swallowed; publish never panics or errors
    publisher.publish(&sample_result()).await;
}

#[tokio::test]
async fn publisher_notifies_webhook_even_when_store_is_down() {
    let webhook = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger/speedtest/with/key/testkey"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;

    let writer: Arc<dyn PointWriter> = Arc::new(
        InfluxWriter::with_base_url(
            "http://127.0.0.1:1",
            "127.0.0.1",
            "speedtests",
            None,
            true,
            &quiet_logger(),
        )
        .unwrap(),
    );
    let notifier: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(&webhook.uri(), "testkey", &quiet_logger()).unwrap());

    let publisher = ResultPublisher::new(writer, Some(notifier), &quiet_logger());
    publisher.publish(&sample_result()).await;
}
