use crate::analyzer::persona::CoachPersona;
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = ".HabitCoach";
const CONFIG_FILE: &str = "config.json";
const AI_KEY_ENV: &str = "HABITCOACH_AI_API_KEY";
const WEATHER_KEY_ENV: &str = "HABITCOACH_WEATHER_API_KEY";
pub const MAX_SEED_DAYS: u32 = 366;

/// Where credentials are looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variables first, then the config file.
    #[default]
    Environment,
    ConfigFileOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub habits: Vec<String>,
    pub city: String,
    pub coach_persona: CoachPersona,
    pub weather_api_key: Option<String>,
    pub weather_api_base_url: String,
    pub weather_lang: String,
    pub companion_api_url: String,
    pub lookup_timeout_seconds: u64,
    pub seed_days: u32,
    pub api_port: u16,
    pub ai_api_key: Option<String>,
    pub ai_api_base_url: String,
    pub ai_model: String,
    pub ai_temperature: f32,
    pub ai_timeout_seconds: u64,
    #[serde(skip)]
    pub secret_source: SecretSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            habits: default_habits(),
            city: "Seoul".to_string(),
            coach_persona: CoachPersona::Spartan,
            weather_api_key: None,
            weather_api_base_url: "http://api.openweathermap.org/data/2.5".to_string(),
            weather_lang: "en".to_string(),
            companion_api_url: "https://dog.ceo/api/breeds/image/random".to_string(),
            lookup_timeout_seconds: 5,
            seed_days: 0,
            api_port: 7891,
            ai_api_key: None,
            ai_api_base_url: "https://api.openai.com/v1".to_string(),
            ai_model: "gpt-4o-mini".to_string(),
            ai_temperature: 0.8,
            ai_timeout_seconds: 30,
            secret_source: SecretSource::Environment,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        if config.seed_days > MAX_SEED_DAYS {
            warn!(
                seed_days = config.seed_days,
                max = MAX_SEED_DAYS,
                "seed_days in config file is too large. capping"
            );
            config.seed_days = MAX_SEED_DAYS;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    /// AI credential, environment first, blank values treated as missing.
    pub fn resolve_ai_api_key(&self) -> Option<String> {
        resolve_secret(self.secret_source, AI_KEY_ENV, self.ai_api_key.as_deref())
    }

    pub fn resolve_weather_api_key(&self) -> Option<String> {
        resolve_secret(
            self.secret_source,
            WEATHER_KEY_ENV,
            self.weather_api_key.as_deref(),
        )
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "habits" => {
                let habits = value
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(ToOwned::to_owned)
                    .collect::<Vec<_>>();

                if habits.is_empty() {
                    bail!("habits requires at least one habit");
                }
                self.habits = habits;
            }
            "city" => {
                let city = value.trim();
                if city.is_empty() {
                    bail!("city must not be empty");
                }
                self.city = city.to_string();
            }
            "coach_persona" => {
                self.coach_persona = CoachPersona::parse(value);
            }
            "weather_api_key" => {
                self.weather_api_key = (!value.trim().is_empty()).then_some(value.to_string());
            }
            "weather_api_base_url" => {
                self.weather_api_base_url = value.trim().trim_end_matches('/').to_string();
            }
            "weather_lang" => {
                self.weather_lang = value.trim().to_string();
            }
            "companion_api_url" => {
                self.companion_api_url = value.trim().to_string();
            }
            "lookup_timeout_seconds" => {
                self.lookup_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("lookup_timeout_seconds must be a number"))?
                    .max(1);
            }
            "seed_days" => {
                let days = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("seed_days must be a number"))?;
                if days > MAX_SEED_DAYS {
                    bail!("seed_days must be at most {MAX_SEED_DAYS}");
                }
                self.seed_days = days;
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "ai_api_key" => {
                self.ai_api_key = (!value.trim().is_empty()).then_some(value.to_string());
            }
            "ai_api_base_url" => {
                self.ai_api_base_url = value.trim().trim_end_matches('/').to_string();
            }
            "ai_model" => {
                self.ai_model = value.trim().to_string();
            }
            "ai_temperature" => {
                let temperature = value
                    .parse::<f32>()
                    .map_err(|_| anyhow!("ai_temperature must be a number"))?;
                if !(0.0..=2.0).contains(&temperature) {
                    bail!("ai_temperature must be between 0.0 and 2.0");
                }
                self.ai_temperature = temperature;
            }
            "ai_timeout_seconds" => {
                self.ai_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("ai_timeout_seconds must be a number"))?
                    .max(5);
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: habits|habit.list, city|weather.city, coach_persona|coach.persona, weather_api_key|weather.api_key, weather_api_base_url|weather.base_url, weather_lang|weather.lang, companion_api_url|companion.url, lookup_timeout_seconds|lookup.timeout_seconds, seed_days|session.seed_days, api_port|api.port, ai_api_key|ai.api_key, ai_api_base_url|ai.base_url, ai_model|ai.model, ai_temperature|ai.temperature, ai_timeout_seconds|ai.timeout_seconds"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "habits" => Some(self.habits.join(",")),
            "city" => Some(self.city.clone()),
            "coach_persona" => Some(self.coach_persona.key().to_string()),
            "weather_api_key" => Some(mask_secret(self.weather_api_key.as_deref())),
            "weather_api_base_url" => Some(self.weather_api_base_url.clone()),
            "weather_lang" => Some(self.weather_lang.clone()),
            "companion_api_url" => Some(self.companion_api_url.clone()),
            "lookup_timeout_seconds" => Some(self.lookup_timeout_seconds.to_string()),
            "seed_days" => Some(self.seed_days.to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "ai_api_key" => Some(mask_secret(self.ai_api_key.as_deref())),
            "ai_api_base_url" => Some(self.ai_api_base_url.clone()),
            "ai_model" => Some(self.ai_model.clone()),
            "ai_temperature" => Some(self.ai_temperature.to_string()),
            "ai_timeout_seconds" => Some(self.ai_timeout_seconds.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "habits" | "habit.list" => "habits",
        "city" | "weather.city" => "city",
        "coach_persona" | "coach.persona" => "coach_persona",
        "weather_api_key" | "weather.api_key" => "weather_api_key",
        "weather_api_base_url" | "weather.base_url" => "weather_api_base_url",
        "weather_lang" | "weather.lang" => "weather_lang",
        "companion_api_url" | "companion.url" => "companion_api_url",
        "lookup_timeout_seconds" | "lookup.timeout_seconds" => "lookup_timeout_seconds",
        "seed_days" | "session.seed_days" => "seed_days",
        "api_port" | "api.port" => "api_port",
        "ai_api_key" | "ai.api_key" => "ai_api_key",
        "ai_api_base_url" | "ai.base_url" => "ai_api_base_url",
        "ai_model" | "ai.model" => "ai_model",
        "ai_temperature" | "ai.temperature" => "ai_temperature",
        "ai_timeout_seconds" | "ai.timeout_seconds" => "ai_timeout_seconds",
        _ => key,
    }
}

pub fn is_secret_key(key: &str) -> bool {
    matches!(
        normalize_config_key(key),
        "ai_api_key" | "weather_api_key"
    )
}

fn resolve_secret(source: SecretSource, env_key: &str, configured: Option<&str>) -> Option<String> {
    let from_env = match source {
        SecretSource::Environment => std::env::var(env_key).ok(),
        SecretSource::ConfigFileOnly => None,
    };

    from_env
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|value| !value.trim().is_empty())
                .map(ToOwned::to_owned)
        })
}

fn mask_secret(value: Option<&str>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|_| "***set***".to_string())
        .unwrap_or_else(|| "not_set".to_string())
}

fn default_habits() -> Vec<String> {
    vec![
        "Miracle morning".to_string(),
        "{mission} (today's mission)".to_string(),
        "Read or study for 30 minutes".to_string(),
        "Exercise or take a walk".to_string(),
        "Eat a healthy diet".to_string(),
    ]
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, MAX_SEED_DAYS, SecretSource};
    use crate::analyzer::persona::CoachPersona;

    #[test]
    fn save_and_load_round_trip_keeps_settings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set_value("weather.city", "Busan").expect("set city");
        config.set_value("coach.persona", "게임 마스터").expect("set persona");
        config.save_to(&path).expect("save config");

        let loaded = Config::load_from(&path).expect("load config");
        assert_eq!(loaded.city, "Busan");
        assert_eq!(loaded.coach_persona, CoachPersona::GameMaster);
        assert_eq!(loaded.habits.len(), 5);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"city":"Jeju","coach_persona":"pirate"}"#).expect("write");

        let loaded = Config::load_from(&path).expect("load config");
        assert_eq!(loaded.city, "Jeju");
        assert_eq!(loaded.coach_persona, CoachPersona::Standard);
        assert_eq!(loaded.ai_model, "gpt-4o-mini");
    }

    #[test]
    fn oversized_seed_days_in_file_is_capped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"seed_days": 4000000000}"#).expect("write");

        let loaded = Config::load_from(&path).expect("load config");
        assert_eq!(loaded.seed_days, MAX_SEED_DAYS);
    }

    #[test]
    fn file_only_source_ignores_environment() {
        let config = Config {
            ai_api_key: Some("  ".to_string()),
            weather_api_key: None,
            secret_source: SecretSource::ConfigFileOnly,
            ..Config::default()
        };
        assert_eq!(config.resolve_ai_api_key(), None);
        assert_eq!(config.resolve_weather_api_key(), None);

        let configured = Config {
            ai_api_key: Some("sk-file".to_string()),
            ..config
        };
        assert_eq!(configured.resolve_ai_api_key().as_deref(), Some("sk-file"));
    }

    #[test]
    fn habits_are_split_and_trimmed() {
        let mut config = Config::default();
        config
            .set_value("habits", " Run , ,Read ,Sleep before midnight")
            .expect("set habits");

        assert_eq!(config.habits, vec!["Run", "Read", "Sleep before midnight"]);
        assert!(config.set_value("habits", " , ").is_err());
    }

    #[test]
    fn secrets_are_masked_and_blank_keys_are_cleared() {
        let mut config = Config::default();
        assert_eq!(config.get_value("ai.api_key").as_deref(), Some("not_set"));

        config.set_value("ai.api_key", "sk-test").expect("set key");
        assert_eq!(config.get_value("ai_api_key").as_deref(), Some("***set***"));

        config.set_value("ai.api_key", "   ").expect("clear key");
        assert!(config.ai_api_key.is_none());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_numbers() {
        let mut config = Config::default();
        assert!(config.set_value("polling_seconds", "300").is_err());
        assert!(config.set_value("seed_days", "many").is_err());
        assert!(config.set_value("seed_days", "1000").is_err());
        assert!(config.set_value("ai.temperature", "3.5").is_err());

        config.set_value("ai.timeout_seconds", "1").expect("timeout");
        assert_eq!(config.ai_timeout_seconds, 5);
    }
}
