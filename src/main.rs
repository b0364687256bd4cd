mod ai;
mod analyzer;
mod api;
mod cli;
mod config;
mod context;
mod session;
#[cfg(test)]
mod test_support;

use crate::analyzer::history;
use crate::analyzer::persona::CoachPersona;
use crate::cli::onboard::run_onboarding;
use crate::cli::prompt::{self, SessionAction};
use crate::cli::{AiCommands, Cli, Commands, ConfigCommands};
use crate::config::{Config, SecretSource};
use crate::session::{CheckInInput, CompletedHabits, Session};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Doctor => handle_doctor(),
        Commands::Personas => handle_personas(),
        Commands::Context { city } => handle_context(city).await,
        Commands::Checkin {
            done,
            mood,
            city,
            persona,
        } => {
            let mut session = Session::start(load_or_default_config()?);
            run_check_in(
                &mut session,
                CheckInArgs {
                    done,
                    mood,
                    city,
                    persona: persona.as_deref().map(CoachPersona::parse),
                },
            )
            .await
        }
        Commands::Session => handle_session().await,
        Commands::Serve => handle_serve().await,
        Commands::Ai { command } => handle_ai_command(command),
    }
}

#[derive(Debug, Default)]
struct CheckInArgs {
    done: Option<Vec<usize>>,
    mood: Option<u8>,
    city: Option<String>,
    persona: Option<CoachPersona>,
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.save()?;

            let masked = if config::is_secret_key(&key) {
                "***hidden***".to_string()
            } else {
                value
            };
            println!("Config saved: {key} = {masked}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    if ai::has_api_key(&config) {
        println!("[OK] AI API key is configured (model: {})", config.ai_model);
    } else {
        println!("[WARN] AI API key is missing. Check-ins will be recorded without a report");
        issues.push("ai api key missing".to_string());
    }

    if config.resolve_weather_api_key().is_some() {
        println!("[OK] weather API key is configured (city: {})", config.city);
    } else {
        println!("[WARN] weather API key is missing. Weather will be reported as unknown");
        issues.push("weather api key missing".to_string());
    }

    if config.habits.is_empty() {
        println!("[WARN] no habits configured");
        issues.push("no habits".to_string());
    } else {
        println!("[OK] {} habit(s) configured", config.habits.len());
    }

    println!(
        "[OK] coach persona: {}",
        config.coach_persona.display_name()
    );

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn handle_personas() -> Result<()> {
    for persona in CoachPersona::ALL {
        println!("{} ({})", persona.display_name(), persona.key());
        println!("  {}", persona.instruction());
    }
    Ok(())
}

async fn handle_context(city: Option<String>) -> Result<()> {
    let config = load_or_default_config()?;
    let city = city.unwrap_or_else(|| config.city.clone());

    let prepared = tokio::task::spawn_blocking(move || session::prepare(&config, &city))
        .await
        .context("Context lookup task failed")?;

    println!("{}", prompt::describe_context(&prepared));
    Ok(())
}

async fn run_check_in(session: &mut Session, args: CheckInArgs) -> Result<()> {
    let config = session.config().clone();
    let city = args.city.unwrap_or_else(|| config.city.clone());

    let prepared = tokio::task::spawn_blocking(move || session::prepare(&config, &city))
        .await
        .context("Context lookup task failed")?;
    println!("{}\n", prompt::describe_context(&prepared));

    let answers = prompt::ask_check_in(
        &prepared,
        args.done,
        args.mood,
        args.persona,
        session.config().coach_persona,
    )?;

    if !ai::has_api_key(session.config()) {
        println!(
            "[WARN] An OpenAI API key is required for the AI report. The check-in is recorded without it."
        );
    }

    let input = CheckInInput {
        date: session::today(),
        completed: CompletedHabits::Indices(answers.done),
        mood: answers.mood,
        persona: answers.persona,
    };
    let config = session.config().clone();
    let outcome =
        tokio::task::spawn_blocking(move || session::evaluate(&config, prepared, input))
            .await
            .context("Check-in task failed")??;
    session.record(&outcome);

    println!("{}", outcome.render());
    info!(days = session.store().len(), "check-in saved for this session");

    Ok(())
}

async fn handle_session() -> Result<()> {
    let mut session = Session::start(load_or_default_config()?);
    println!("Session started. Records live only until you quit.\n");

    loop {
        match prompt::ask_session_action()? {
            SessionAction::CheckIn => {
                if let Err(error) = run_check_in(&mut session, CheckInArgs::default()).await {
                    println!("[WARN] check-in failed: {error:#}");
                }
            }
            SessionAction::Calendar => {
                println!("{}\n", history::render_chart(session.store().all()));
            }
            SessionAction::Stats => {
                let stats = history::stats(session.store().all());
                println!(
                    "Tracked {} day(s) so far. Average achievement {:.0}%, average mood {:.1}, {} day(s) above target.\n",
                    stats.days_tracked, stats.average_rate, stats.average_mood, stats.high_days
                );
            }
            SessionAction::Quit => break,
        }
    }

    println!("Session ended.");
    Ok(())
}

async fn handle_serve() -> Result<()> {
    let session = Session::start(load_or_default_config()?);
    let port = session.config().api_port;
    println!("Dashboard API: http://127.0.0.1:{port}/api/v1/status");

    tokio::select! {
        api_result = api::run_server(session) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn handle_ai_command(command: AiCommands) -> Result<()> {
    match command {
        AiCommands::Test {
            key,
            base_url,
            model,
        } => {
            let mut config = load_or_default_config()?;

            if let Some(value) = key {
                config.ai_api_key = Some(value);
                config.secret_source = SecretSource::ConfigFileOnly;
            }
            if let Some(value) = base_url {
                config.ai_api_base_url = value;
            }
            if let Some(value) = model {
                config.ai_model = value;
            }

            let response = ai::test_connection(&config)?;
            println!("AI API connection successful");
            println!("{response}");

            Ok(())
        }
    }
}

fn load_or_default_config() -> Result<Config> {
    if Config::config_path()?.exists() {
        return Config::load();
    }

    let config = Config::default();
    config.save()?;
    Ok(config)
}
