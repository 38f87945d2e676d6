use serde::Serialize;

use crate::client::{FromJson, JsonObject};

/// A geographic point. Immutable value, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Machine-readable icon identifier from a forecast data point.
///
/// The API documents a fixed set of identifiers; anything outside it
/// resolves to [`Icon::Default`] so a consumer always has something to
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    ClearDay,
    ClearNight,
    Rain,
    Snow,
    Sleet,
    Wind,
    Fog,
    Cloudy,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Default,
}

impl Icon {
    /// Map a wire identifier to an icon, falling back to `Default` for
    /// identifiers the API may add in the future.
    pub fn from_name(name: &str) -> Self {
        match name {
            "clear-day" => Icon::ClearDay,
            "clear-night" => Icon::ClearNight,
            "rain" => Icon::Rain,
            "snow" => Icon::Snow,
            "sleet" => Icon::Sleet,
            "wind" => Icon::Wind,
            "fog" => Icon::Fog,
            "cloudy" => Icon::Cloudy,
            "partly-cloudy-day" => Icon::PartlyCloudyDay,
            "partly-cloudy-night" => Icon::PartlyCloudyNight,
            _ => Icon::Default,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Icon::ClearDay => "clear-day",
            Icon::ClearNight => "clear-night",
            Icon::Rain => "rain",
            Icon::Snow => "snow",
            Icon::Sleet => "sleet",
            Icon::Wind => "wind",
            Icon::Fog => "fog",
            Icon::Cloudy => "cloudy",
            Icon::PartlyCloudyDay => "partly-cloudy-day",
            Icon::PartlyCloudyNight => "partly-cloudy-night",
            Icon::Default => "default",
        }
    }

    /// File name of the image asset a UI layer would display for this
    /// icon. Loading the image is the consumer's concern.
    pub fn asset_name(&self) -> String {
        format!("{}.png", self.name())
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Current conditions at one coordinate, decoded from the `"currently"`
/// member of the response envelope. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    /// Temperature in degrees.
    pub temperature: f64,
    /// Relative humidity, between 0 and 1.
    pub humidity: f64,
    /// Probability of precipitation, between 0 and 1.
    pub precipitation_probability: f64,
    /// Human-readable summary of the conditions.
    pub summary: String,
    pub icon: Icon,
}

impl FromJson for CurrentWeather {
    fn from_json(json: &JsonObject) -> Option<Self> {
        Some(Self {
            temperature: json.get("temperature")?.as_f64()?,
            humidity: json.get("humidity")?.as_f64()?,
            precipitation_probability: json.get("precipProbability")?.as_f64()?,
            summary: json.get("summary")?.as_str()?.to_string(),
            icon: Icon::from_name(json.get("icon")?.as_str()?),
        })
    }
}

impl CurrentWeather {
    /// Temperature label, rounded to the nearest degree: `"73°"`.
    pub fn temperature_string(&self) -> String {
        format!("{}°", self.temperature.round() as i64)
    }

    /// Humidity label as a whole percentage: `"40%"`.
    pub fn humidity_string(&self) -> String {
        format!("{}%", (self.humidity * 100.0).round() as i64)
    }

    /// Precipitation-probability label as a whole percentage: `"10%"`.
    pub fn precipitation_probability_string(&self) -> String {
        format!("{}%", (self.precipitation_probability * 100.0).round() as i64)
    }
}
