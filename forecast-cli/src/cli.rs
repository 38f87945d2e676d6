use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{Coordinate, CurrentWeather, ForecastClient};

use crate::config::Config;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Current conditions from the forecast.io API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the forecast.io API key in the platform config directory.
    Configure,

    /// Show current conditions at a coordinate.
    Show {
        /// Latitude in decimal degrees.
        latitude: f64,

        /// Longitude in decimal degrees.
        longitude: f64,

        /// Use this API key instead of the configured one.
        #[arg(long)]
        api_key: Option<String>,

        /// Print the value as JSON instead of labels.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { latitude, longitude, api_key, json } => {
                show(latitude, longitude, api_key, json).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Text::new("forecast.io API key:").prompt()?;
    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    latitude: f64,
    longitude: f64,
    api_key: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => Config::load()?.require_api_key()?.to_string(),
    };

    // One client per invocation, constructed with its key up front.
    let client = ForecastClient::new(api_key);
    let coordinate = Coordinate { latitude, longitude };

    let weather = client
        .current_weather(coordinate)
        .await
        .context("Unable to retrieve forecast")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&weather)?);
    } else {
        print!("{}", display(&weather));
    }

    Ok(())
}

/// The summary line with the icon name, then one row per reading.
fn display(weather: &CurrentWeather) -> String {
    format!(
        "{summary}  [{icon}]\n\
         Temperature    {temperature}\n\
         Humidity       {humidity}\n\
         Precipitation  {precipitation}\n",
        summary = weather.summary,
        icon = weather.icon,
        temperature = weather.temperature_string(),
        humidity = weather.humidity_string(),
        precipitation = weather.precipitation_probability_string(),
    )
}
