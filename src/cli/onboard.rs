use crate::analyzer::persona::CoachPersona;
use crate::config::{Config, MAX_SEED_DAYS};
use anyhow::{Context, Result};
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to HabitCoach onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();
    let current = Config::load().unwrap_or_default();

    println!("\n[1/5] OpenAI API key");
    println!("  Required for the AI coach report. Leave empty to keep the current value.");
    let ai_api_key = Password::with_theme(&theme)
        .with_prompt("  OpenAI API key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read OpenAI API key")?;
    let ai_api_key = non_blank(ai_api_key).or(current.ai_api_key.clone());
    println!(
        "  ✓ {}",
        if ai_api_key.is_some() {
            "AI key configured"
        } else {
            "No AI key. Check-ins are recorded without a report"
        }
    );

    println!("\n[2/5] OpenWeatherMap API key");
    println!("  Optional. Without it the weather is reported as unknown.");
    let weather_api_key = Password::with_theme(&theme)
        .with_prompt("  OpenWeatherMap API key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read weather API key")?;
    let weather_api_key = non_blank(weather_api_key).or(current.weather_api_key.clone());

    println!("\n[3/5] City for the weather lookup");
    let city: String = Input::with_theme(&theme)
        .with_prompt("  City")
        .default(current.city.clone())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("City must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read city")?;
    println!("  ✓ {}", city.trim());

    println!("\n[4/5] Choose your coach");
    let names = CoachPersona::ALL
        .iter()
        .map(|persona| persona.display_name())
        .collect::<Vec<_>>();
    let default_index = CoachPersona::ALL
        .iter()
        .position(|persona| *persona == current.coach_persona)
        .unwrap_or_default();
    let selected = Select::with_theme(&theme)
        .with_prompt("  Coach style")
        .default(default_index)
        .items(&names)
        .interact()
        .context("Failed to select coach")?;
    let coach_persona = CoachPersona::ALL
        .get(selected)
        .copied()
        .unwrap_or_default();
    println!("  ✓ {}", coach_persona.display_name());

    println!("\n[5/5] Sample history");
    println!("  Pre-fill the session calendar with random past days (0 to disable).");
    let seed_days: u32 = Input::with_theme(&theme)
        .with_prompt("  Days of sample history")
        .default(current.seed_days)
        .validate_with(|input: &u32| -> std::result::Result<(), String> {
            if *input > MAX_SEED_DAYS {
                Err(format!("Use at most {MAX_SEED_DAYS} days"))
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read sample history length")?;

    let config = Config {
        ai_api_key,
        weather_api_key,
        city: city.trim().to_string(),
        coach_persona,
        seed_days,
        ..current
    };
    config.save()?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run HabitCoach checkin to record today.");
    println!("──────────────────────────────────────────");

    Ok(config)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
