use crate::analyzer::metrics::{MAX_MOOD, MIN_MOOD, MoodScore};
use crate::analyzer::persona::CoachPersona;
use crate::session::PreparedCheckIn;
use anyhow::{Context, Result, bail};
use dialoguer::{MultiSelect, Select, theme::ColorfulTheme};

#[derive(Debug, Clone)]
pub struct CheckInAnswers {
    pub done: Vec<usize>,
    pub mood: MoodScore,
    pub persona: CoachPersona,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    CheckIn,
    Calendar,
    Stats,
    Quit,
}

/// Fills in whatever the command line left out by asking the user.
pub fn ask_check_in(
    prepared: &PreparedCheckIn,
    done: Option<Vec<usize>>,
    mood: Option<u8>,
    persona: Option<CoachPersona>,
    default_persona: CoachPersona,
) -> Result<CheckInAnswers> {
    let theme = ColorfulTheme::default();

    let done = match done {
        Some(indices) => one_based_to_indices(&indices, prepared.habits.len())?,
        None => MultiSelect::with_theme(&theme)
            .with_prompt("  Which habits did you complete today? (space to toggle)")
            .items(&prepared.habits)
            .interact()
            .context("Failed to read habit selection")?,
    };

    let mood = match mood {
        Some(value) => MoodScore::new(value)?,
        None => {
            let options = (MIN_MOOD..=MAX_MOOD).collect::<Vec<_>>();
            let selected = Select::with_theme(&theme)
                .with_prompt("  How is your condition today? (1-10)")
                .default(4)
                .items(&options)
                .interact()
                .context("Failed to read mood")?;
            MoodScore::new(options.get(selected).copied().unwrap_or(MIN_MOOD))?
        }
    };

    let persona = match persona {
        Some(persona) => persona,
        None => {
            let names = CoachPersona::ALL
                .iter()
                .map(|persona| persona.display_name())
                .collect::<Vec<_>>();
            let default_index = CoachPersona::ALL
                .iter()
                .position(|persona| *persona == default_persona)
                .unwrap_or_default();
            let selected = Select::with_theme(&theme)
                .with_prompt("  Choose your coach")
                .default(default_index)
                .items(&names)
                .interact()
                .context("Failed to select coach")?;
            CoachPersona::ALL
                .get(selected)
                .copied()
                .unwrap_or(default_persona)
        }
    };

    Ok(CheckInAnswers {
        done,
        mood,
        persona,
    })
}

pub fn ask_session_action() -> Result<SessionAction> {
    let actions = [
        (SessionAction::CheckIn, "Check in today's habits"),
        (SessionAction::Calendar, "Show habit calendar"),
        (SessionAction::Stats, "Show statistics"),
        (SessionAction::Quit, "Quit (session data is discarded)"),
    ];
    let labels = actions.iter().map(|(_, label)| *label).collect::<Vec<_>>();

    let selected = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What next?")
        .default(0)
        .items(&labels)
        .interact()
        .context("Failed to read session action")?;

    Ok(actions
        .get(selected)
        .map(|(action, _)| *action)
        .unwrap_or(SessionAction::Quit))
}

pub fn describe_context(prepared: &PreparedCheckIn) -> String {
    let companion = prepared
        .context
        .companion
        .found()
        .map(|image| format!("{} ({})", image.breed_label, image.image_url))
        .unwrap_or_else(|| "unavailable".to_string());

    format!(
        "Weather in {}: {}\nToday's partner: {}\nSuggested mission: {}",
        prepared.context.city,
        prepared.context.weather_text(),
        companion,
        prepared.mission
    )
}

fn one_based_to_indices(indices: &[usize], habit_count: usize) -> Result<Vec<usize>> {
    indices
        .iter()
        .map(|index| match index.checked_sub(1) {
            Some(zero_based) if zero_based < habit_count => Ok(zero_based),
            _ => bail!("habit number {index} is out of range (1-{habit_count})"),
        })
        .collect()
}
