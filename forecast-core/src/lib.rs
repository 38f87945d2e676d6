//! Client library for the forecast.io current-conditions API.
//!
//! This crate defines:
//! - A pure endpoint descriptor and a generic JSON fetch client
//! - The typed weather model and the concrete forecast client
//! - The error taxonomy and the UI-executor dispatch primitive
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod model;

pub use client::{ApiClient, Endpoint, FromJson, JsonObject};
pub use dispatch::{InlineExecutor, SerialExecutor, Task, UiExecutor};
pub use error::ApiError;
pub use forecast::{Forecast, ForecastClient};
pub use model::{Coordinate, CurrentWeather, Icon};
