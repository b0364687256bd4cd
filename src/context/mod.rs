pub mod companion;
pub mod weather;

use crate::config::Config;
use crate::context::companion::CompanionImage;
use crate::context::weather::WeatherSnapshot;
use serde::Serialize;
use std::thread;
use tracing::warn;

pub const UNKNOWN_WEATHER: &str = "unknown";
pub const FALLBACK_BREED: &str = "Mixed Breed";

const RAIN_MISSION: &str = "Meditate while watching the rain";
const HOT_MISSION: &str = "Drink 2 liters of cool water";
const DEFAULT_MISSION: &str = "Stretch for 10 minutes";
const HOT_THRESHOLD_CELSIUS: f64 = 25.0;

/// Result of a best-effort external lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatheredContext {
    pub city: String,
    pub weather: Lookup<WeatherSnapshot>,
    pub companion: Lookup<CompanionImage>,
}

impl GatheredContext {
    pub fn mission(&self) -> &'static str {
        suggest_mission(&self.weather)
    }

    pub fn weather_text(&self) -> String {
        self.weather
            .found()
            .map(|weather| {
                format!(
                    "{} ({:.1}°C)",
                    weather.description, weather.temperature_celsius
                )
            })
            .unwrap_or_else(|| UNKNOWN_WEATHER.to_string())
    }

    pub fn breed_label(&self) -> &str {
        self.companion
            .found()
            .map(|companion| companion.breed_label.as_str())
            .unwrap_or(FALLBACK_BREED)
    }
}

/// Runs the weather and companion lookups side by side.
///
/// Each lookup owns its thread; a failure or panic in one never touches the other.
pub fn gather(config: &Config, city: &str) -> GatheredContext {
    let (weather, companion) = thread::scope(|scope| {
        let weather = scope.spawn(|| weather::fetch_weather(config, city));
        let companion = scope.spawn(|| companion::fetch_companion(config));

        (
            weather.join().unwrap_or_else(|_| {
                warn!(city, "weather lookup thread panicked");
                Lookup::Absent
            }),
            companion.join().unwrap_or_else(|_| {
                warn!("companion lookup thread panicked");
                Lookup::Absent
            }),
        )
    });

    GatheredContext {
        city: city.to_string(),
        weather,
        companion,
    }
}

pub fn suggest_mission(weather: &Lookup<WeatherSnapshot>) -> &'static str {
    match weather.found() {
        Some(snapshot) if snapshot.condition.contains("Rain") => RAIN_MISSION,
        Some(snapshot) if snapshot.temperature_celsius > HOT_THRESHOLD_CELSIUS => HOT_MISSION,
        _ => DEFAULT_MISSION,
    }
}
