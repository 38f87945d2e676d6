//! End-to-end coverage of the typed fetch pipeline against a local
//! fixture server speaking canned HTTP.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use forecast_core::{
    ApiClient, ApiError, CurrentWeather, Endpoint, FromJson, Icon, InlineExecutor, JsonObject,
    SerialExecutor,
};
use reqwest::StatusCode;
use tracing_subscriber::fmt::MakeWriter;

const CURRENT_BODY: &str = r#"{"currently": {"temperature": 72.5, "humidity": 0.40, "precipProbability": 0.10, "summary": "Clear", "icon": "clear-day"}}"#;

/// Serve the same canned response to `hits` connections on an ephemeral
/// local port, then exit. Returns the base URL to point an endpoint at.
fn serve(hits: usize, status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("fixture can bind");
    let addr = listener.local_addr().expect("fixture has a local addr");

    thread::spawn(move || {
        for _ in 0..hits {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            read_request(&mut stream);
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

/// Drain the request head; the client only ever sends body-less GETs.
fn read_request(stream: &mut std::net::TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Serve a response head that promises more body bytes than are written,
/// then close the stream, so reading the body fails mid-transfer.
fn serve_truncated_body() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("fixture can bind");
    let addr = listener.local_addr().expect("fixture has a local addr");

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{{\"currently\"",
            CURRENT_BODY.len()
        );
        let _ = stream.write_all(response.as_bytes());
    });

    format!("http://{addr}")
}

/// A base URL freshly bound and immediately released, so connecting to it
/// fails before any response line exists.
fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("fixture can bind");
    let addr = listener.local_addr().expect("fixture has a local addr");
    drop(listener);

    format!("http://{addr}")
}

struct FixtureEndpoint {
    base: String,
}

impl Endpoint for FixtureEndpoint {
    fn base_url(&self) -> &str {
        &self.base
    }

    fn path(&self) -> String {
        "/forecast/test-key/41.066366,29.017375".to_string()
    }
}

fn inline_client() -> ApiClient {
    ApiClient::with_executor(Arc::new(InlineExecutor))
}

fn parse_weather(envelope: &JsonObject) -> Option<CurrentWeather> {
    let currently = envelope.get("currently")?.as_object()?;
    CurrentWeather::from_json(currently)
}

/// Collects formatted subscriber output so a test can assert on what was
/// (and was not) logged.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("capture mutex is not poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("capture mutex is not poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn raw_json_task_resolves_to_the_envelope() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let endpoint = FixtureEndpoint { base };

    let envelope = inline_client()
        .request_json(&endpoint)
        .await
        .expect("fixture serves a JSON object");

    assert!(envelope.contains_key("currently"));
}

// The request path embeds the API key, so it must never appear in log
// output.
#[tokio::test]
async fn request_logging_omits_the_key_bearing_path() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(capture.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    inline_client()
        .request_json(&FixtureEndpoint { base })
        .await
        .expect("fixture serves a JSON object");

    let logs = capture.contents();
    assert!(logs.contains("issuing request"));
    assert!(!logs.contains("test-key"));
}

#[tokio::test]
async fn typed_fetch_resolves_to_the_parsed_value() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let endpoint = FixtureEndpoint { base };

    let weather = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect("fixture serves a complete data point");

    assert_eq!(weather.temperature, 72.5);
    assert_eq!(weather.humidity, 0.40);
    assert_eq!(weather.precipitation_probability, 0.10);
    assert_eq!(weather.summary, "Clear");
    assert_eq!(weather.icon, Icon::ClearDay);
}

#[tokio::test]
async fn missing_required_fields_resolve_to_unexpected_response() {
    let base = serve(1, "HTTP/1.1 200 OK", r#"{"currently": {"temperature": 72.5}}"#);
    let endpoint = FixtureEndpoint { base };

    let err = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect_err("data point is incomplete");

    assert!(matches!(err, ApiError::UnexpectedResponse));
}

#[tokio::test]
async fn non_json_bodies_surface_the_decode_error() {
    let base = serve(1, "HTTP/1.1 200 OK", "<html>service moved</html>");
    let endpoint = FixtureEndpoint { base };

    let err = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect_err("body is not JSON");

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn truncated_bodies_resolve_to_the_transport_error() {
    let endpoint = FixtureEndpoint { base: serve_truncated_body() };

    let err = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect_err("fixture closes mid-body");

    assert!(matches!(err, ApiError::Transport(_)));
}

// Non-200 responses must surface to the caller as errors, never vanish
// silently.
#[tokio::test]
async fn non_200_statuses_resolve_to_unexpected_status() {
    let base = serve(1, "HTTP/1.1 500 Internal Server Error", r#"{"error": "boom"}"#);
    let endpoint = FixtureEndpoint { base };

    let err = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect_err("fixture answers 500");

    match err {
        ApiError::UnexpectedStatus { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("boom"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_failure_resolves_to_missing_response() {
    let endpoint = FixtureEndpoint { base: dead_base_url() };

    let err = inline_client()
        .fetch(&endpoint, parse_weather)
        .await
        .expect_err("nothing listens on the dead port");

    assert!(matches!(err, ApiError::MissingResponse(_)));
}

#[tokio::test]
async fn identical_fetches_yield_independent_equal_values() {
    let base = serve(2, "HTTP/1.1 200 OK", CURRENT_BODY);
    let endpoint = FixtureEndpoint { base };
    let client = inline_client();

    let first = client
        .fetch(&endpoint, parse_weather)
        .await
        .expect("first fetch succeeds");
    let second = client
        .fetch(&endpoint, parse_weather)
        .await
        .expect("second fetch succeeds");

    assert_eq!(first, second);
}

#[tokio::test]
async fn callback_fetch_delivers_exactly_one_completion_inline() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let (tx, rx) = tokio::sync::oneshot::channel();

    inline_client().fetch_with(FixtureEndpoint { base }, parse_weather, move |result| {
        tx.send(result).expect("test is still listening");
    });

    let result = rx.await.expect("completion was delivered");
    let weather = result.expect("fixture serves a complete data point");
    assert_eq!(weather.summary, "Clear");
}

#[tokio::test]
async fn callback_fetch_marshals_onto_the_serial_executor() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let client = ApiClient::with_executor(Arc::new(SerialExecutor::new()));
    let (tx, rx) = tokio::sync::oneshot::channel();

    let test_thread = thread::current().id();
    client.fetch_with(FixtureEndpoint { base }, parse_weather, move |result| {
        tx.send((thread::current().id(), result)).expect("test is still listening");
    });

    let (callback_thread, result) = rx.await.expect("completion was delivered");
    assert!(result.is_ok());
    assert_ne!(callback_thread, test_thread);
}

// Fire-and-forget consumers let the completion own the last client
// handle, so the executor may be torn down from its own worker thread.
#[tokio::test]
async fn completion_owning_the_last_client_handle_tears_down_cleanly() {
    let base = serve(1, "HTTP/1.1 200 OK", CURRENT_BODY);
    let client = ApiClient::with_executor(Arc::new(SerialExecutor::new()));
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = client.clone();
    client.fetch_with(FixtureEndpoint { base }, parse_weather, move |result| {
        drop(handle);
        tx.send(result.is_ok()).expect("test is still listening");
    });
    drop(client);

    assert!(rx.await.expect("completion was delivered"));
}
