use tracing::info;

use crate::client::{ApiClient, Endpoint, FromJson, JsonObject};
use crate::error::ApiError;
use crate::model::{Coordinate, CurrentWeather};

/// Base location of the forecast API.
const FORECAST_BASE_URL: &str = "https://api.forecast.io";

/// Forecast queries, one variant per supported request shape.
///
/// Each variant carries only the data needed to build its request, so
/// request construction stays an exhaustive match over variants.
#[derive(Debug, Clone)]
pub enum Forecast {
    /// Current conditions at a coordinate.
    Current { api_key: String, coordinate: Coordinate },
}

impl Endpoint for Forecast {
    fn base_url(&self) -> &str {
        FORECAST_BASE_URL
    }

    fn path(&self) -> String {
        match self {
            Forecast::Current { api_key, coordinate } => {
                // Debug float formatting keeps the fractional digit on
                // whole-number coordinates, e.g. 41.0 renders as "41.0".
                format!("/forecast/{}/{:?},{:?}", api_key, coordinate.latitude, coordinate.longitude)
            }
        }
    }
}

/// Client for the forecast API.
///
/// Constructed once with its API key and handed to consumers; there is no
/// ambient key state and nothing is rebuilt lazily per call.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    api: ApiClient,
    api_key: String,
}

impl ForecastClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(ApiClient::new(), api_key)
    }

    /// Reuse an existing fetch client, e.g. one whose executor is shared
    /// with other consumers.
    pub fn with_client(api: ApiClient, api_key: impl Into<String>) -> Self {
        Self { api, api_key: api_key.into() }
    }

    fn current_endpoint(&self, coordinate: Coordinate) -> Forecast {
        Forecast::Current { api_key: self.api_key.clone(), coordinate }
    }

    /// Fetch current conditions at `coordinate`.
    pub async fn current_weather(
        &self,
        coordinate: Coordinate,
    ) -> Result<CurrentWeather, ApiError> {
        info!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "fetching current conditions"
        );

        let endpoint = self.current_endpoint(coordinate);
        self.api.fetch(&endpoint, parse_current).await
    }

    /// Callback form of [`Self::current_weather`]; the completion runs on
    /// the client's UI executor.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context.
    pub fn fetch_current_weather<C>(&self, coordinate: Coordinate, completion: C)
    where
        C: FnOnce(Result<CurrentWeather, ApiError>) + Send + 'static,
    {
        info!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "fetching current conditions"
        );

        let endpoint = self.current_endpoint(coordinate);
        self.api.fetch_with(endpoint, parse_current, completion);
    }
}

/// Extract the `"currently"` data point from the envelope and build the
/// typed value; `None` on any shape mismatch.
fn parse_current(envelope: &JsonObject) -> Option<CurrentWeather> {
    let currently = envelope.get("currently")?.as_object()?;
    CurrentWeather::from_json(currently)
}
