use crate::config::Config;
use crate::context::Lookup;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionImage {
    pub image_url: String,
    pub breed_label: String,
}

#[derive(Debug, Deserialize)]
struct RandomImageResponse {
    message: String,
    status: Option<String>,
}

/// Random dog picture of the day, or `Absent` on any failure.
pub fn fetch_companion(config: &Config) -> Lookup<CompanionImage> {
    match request_companion(config) {
        Ok(image) => Lookup::Found(image),
        Err(error) => {
            warn!(error = %error, "companion image lookup failed");
            Lookup::Absent
        }
    }
}

fn request_companion(config: &Config) -> Result<CompanionImage> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.lookup_timeout_seconds.max(1)))
        .build()
        .context("Failed to create companion HTTP client")?;

    let response = client
        .get(&config.companion_api_url)
        .send()
        .context("Companion image request failed")?;

    let status = response.status();
    let body = response
        .text()
        .context("Failed to read companion response body")?;

    if !status.is_success() {
        bail!("Companion image API error {}: {}", status, body);
    }

    let parsed: RandomImageResponse = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse companion response: {body}"))?;

    if parsed
        .status
        .as_deref()
        .is_some_and(|status| status != "success")
    {
        bail!("Companion image API reported failure: {body}");
    }

    let breed_label = breed_label_from_url(&parsed.message)?;

    Ok(CompanionImage {
        image_url: parsed.message,
        breed_label,
    })
}

/// `.../breeds/hound-afghan/n02088094_1003.jpg` becomes `Hound Afghan`.
pub fn breed_label_from_url(image_url: &str) -> Result<String> {
    let url = Url::parse(image_url).with_context(|| format!("Invalid image URL: {image_url}"))?;
    let segments = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let breed = segments
        .len()
        .checked_sub(2)
        .and_then(|index| segments.get(index))
        .ok_or_else(|| anyhow!("Image URL has no breed segment: {image_url}"))?;

    Ok(title_case(&breed.replace('-', " ")))
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
