use crate::config::Config;
use crate::context::Lookup;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    pub temperature_celsius: f64,
    pub condition: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainReading,
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    main: String,
    description: String,
}

/// Current weather for `city`, or `Absent` when the key is missing or the call fails.
pub fn fetch_weather(config: &Config, city: &str) -> Lookup<WeatherSnapshot> {
    let Some(api_key) = config.resolve_weather_api_key() else {
        debug!("weather API key not configured. skipping lookup");
        return Lookup::Absent;
    };

    match request_weather(config, &api_key, city) {
        Ok(snapshot) => Lookup::Found(snapshot),
        Err(error) => {
            warn!(error = %error, city, "weather lookup failed");
            Lookup::Absent
        }
    }
}

fn request_weather(config: &Config, api_key: &str, city: &str) -> Result<WeatherSnapshot> {
    let city = city.trim();
    if city.is_empty() {
        bail!("city is empty");
    }

    let endpoint = format!(
        "{}/weather",
        config.weather_api_base_url.trim_end_matches('/')
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(config.lookup_timeout_seconds.max(1)))
        .build()
        .context("Failed to create weather HTTP client")?;

    let response = client
        .get(endpoint)
        .query(&[
            ("q", city),
            ("appid", api_key),
            ("units", "metric"),
            ("lang", config.weather_lang.as_str()),
        ])
        .send()
        .context("Weather API request failed")?;

    let status = response.status();
    let body = response
        .text()
        .context("Failed to read weather response body")?;

    if !status.is_success() {
        bail!("Weather API error {}: {}", status, body);
    }

    parse_weather(&body)
}

fn parse_weather(body: &str) -> Result<WeatherSnapshot> {
    let parsed: CurrentWeatherResponse = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse weather response: {body}"))?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Weather response did not include a condition"))?;

    Ok(WeatherSnapshot {
        description: condition.description,
        temperature_celsius: parsed.main.temp,
        condition: condition.main,
    })
}
