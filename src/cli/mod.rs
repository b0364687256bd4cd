pub mod onboard;
pub mod prompt;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "HabitCoach",
    about = "Daily Habit Check-in & AI Coach Report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Doctor,
    Personas,
    /// Preview today's weather, companion dog and suggested mission
    Context {
        #[arg(long)]
        city: Option<String>,
    },
    /// Record one check-in and request a coach report
    Checkin {
        /// Completed habits as 1-based indices, e.g. 1,3,4
        #[arg(long, value_delimiter = ',')]
        done: Option<Vec<usize>>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        mood: Option<u8>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        persona: Option<String>,
    },
    /// Interactive session: check in repeatedly and browse the history
    Session,
    /// Serve the session dashboard API on localhost
    Serve,
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum AiCommands {
    Test {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn parses_checkin_flags() {
        let cli = Cli::parse_from([
            "HabitCoach",
            "checkin",
            "--done",
            "1,3,4",
            "--mood",
            "7",
            "--persona",
            "스파르타",
        ]);

        match cli.command {
            Commands::Checkin {
                done, mood, persona, ..
            } => {
                assert_eq!(done, Some(vec![1, 3, 4]));
                assert_eq!(mood, Some(7));
                assert_eq!(persona.as_deref(), Some("스파르타"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_mood_outside_range() {
        assert!(Cli::try_parse_from(["HabitCoach", "checkin", "--mood", "11"]).is_err());
        assert!(Cli::try_parse_from(["HabitCoach", "checkin", "--mood", "0"]).is_err());
    }
}
