use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use crate::dispatch::{SerialExecutor, UiExecutor};
use crate::error::ApiError;

/// The untyped JSON envelope: the top-level object of a response body,
/// before any field-level parsing.
pub type JsonObject = serde_json::Map<String, Value>;

/// Capability of being constructed from a JSON object.
///
/// Implemented once per domain type. Returns `None` when a required field
/// is missing or of the wrong type; the typed fetch surfaces that as
/// [`ApiError::UnexpectedResponse`].
pub trait FromJson: Sized {
    fn from_json(json: &JsonObject) -> Option<Self>;
}

/// Pure description of one HTTP request: method, base location and path.
///
/// Building the request is a deterministic function of the descriptor with
/// no side effects and no error conditions for well-formed inputs.
pub trait Endpoint {
    /// HTTP method; forecast queries are plain GETs.
    fn method(&self) -> Method {
        Method::GET
    }

    /// Scheme and authority, e.g. `https://api.forecast.io`.
    fn base_url(&self) -> &str;

    /// Path below the base URL, starting with `/`.
    fn path(&self) -> String;

    /// Full request URL.
    fn url(&self) -> String {
        format!("{}{}", self.base_url(), self.path())
    }
}

/// Generic fetch client.
///
/// Issues the request described by an [`Endpoint`], validates the
/// transport-level response, decodes the JSON envelope, and maps it
/// through a caller-supplied parser into a typed result. Each call fires
/// one independent request; there is no retry, caching or cancellation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    ui: Arc<dyn UiExecutor>,
}

impl ApiClient {
    /// Client with a fresh connection pool, delivering callbacks on its
    /// own dedicated serial executor.
    pub fn new() -> Self {
        Self::with_executor(Arc::new(SerialExecutor::new()))
    }

    /// Client delivering callbacks on the given executor.
    pub fn with_executor(ui: Arc<dyn UiExecutor>) -> Self {
        Self { http: Client::new(), ui }
    }

    /// Raw JSON task: the sole unit of HTTP I/O.
    ///
    /// Issues the request exactly once and resolves to the decoded
    /// envelope, or to the first failure along the way: a connection-level
    /// failure maps to [`ApiError::MissingResponse`], an unreadable body to
    /// [`ApiError::Transport`], a status other than 200 to
    /// [`ApiError::UnexpectedStatus`], and a body that is not a JSON object
    /// to [`ApiError::Decode`].
    pub async fn request_json(&self, endpoint: &impl Endpoint) -> Result<JsonObject, ApiError> {
        // The request path embeds the API key, so logs carry the base
        // URL only.
        debug!(method = %endpoint.method(), base_url = endpoint.base_url(), "issuing request");

        let response = self
            .http
            .request(endpoint.method(), endpoint.url())
            .send()
            .await
            .map_err(ApiError::MissingResponse)?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;
        debug!(%status, bytes = body.len(), "response received");

        envelope_from_parts(status, &body)
    }

    /// Typed fetch: raw JSON task plus a caller-supplied parse function.
    ///
    /// A parse returning `None` means the envelope decoded but did not
    /// have the expected shape, which resolves to
    /// [`ApiError::UnexpectedResponse`].
    pub async fn fetch<T, E, P>(&self, endpoint: &E, parse: P) -> Result<T, ApiError>
    where
        E: Endpoint,
        P: FnOnce(&JsonObject) -> Option<T>,
    {
        let result = self
            .request_json(endpoint)
            .await
            .and_then(|envelope| parse(&envelope).ok_or(ApiError::UnexpectedResponse));

        if let Err(err) = &result {
            error!(error = %err, "fetch failed");
        }

        result
    }

    /// Callback form of the typed fetch.
    ///
    /// The fetch runs on the Tokio runtime and the completion callback is
    /// marshaled onto this client's UI executor, so the consumer may
    /// update its state from inside the callback without further
    /// dispatching. The network operation starts only once parse and
    /// completion are both captured by the spawned task; exactly one
    /// completion is delivered per call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context.
    pub fn fetch_with<T, E, P, C>(&self, endpoint: E, parse: P, completion: C)
    where
        E: Endpoint + Send + Sync + 'static,
        T: Send + 'static,
        P: FnOnce(&JsonObject) -> Option<T> + Send + 'static,
        C: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.fetch(&endpoint, parse).await;
            client.ui.execute(Box::new(move || completion(result)));
        });
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Status and decode branch of the raw JSON task, factored out of the
/// transport so it is exercisable without a socket.
fn envelope_from_parts(status: StatusCode, body: &[u8]) -> Result<JsonObject, ApiError> {
    if status != StatusCode::OK {
        return Err(ApiError::unexpected_status(status, body));
    }

    let envelope: JsonObject = serde_json::from_slice(body)?;
    Ok(envelope)
}
