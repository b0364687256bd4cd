use crate::ai;
use crate::analyzer::metrics::DayMetrics;
use crate::analyzer::persona::CoachPersona;
use crate::config::Config;
use crate::context::GatheredContext;
use serde::Serialize;
use tracing::{info, warn};

pub const FAILURE_PREFIX: &str = "Report generation failed";

pub const SECTION_TITLES: [&str; 5] = [
    "Condition Grade",
    "Habit Analysis",
    "Weather Commentary",
    "Tomorrow's Mission",
    "Closing Remark",
];

#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub metrics: DayMetrics,
    pub context: GatheredContext,
    pub persona: CoachPersona,
    pub mission: String,
}

impl ReportRequest {
    pub fn new(metrics: DayMetrics, context: GatheredContext, persona: CoachPersona) -> Self {
        let mission = context.mission().to_string();
        Self {
            metrics,
            context,
            persona,
            mission,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ReportOutcome {
    Generated(String),
    MissingCredential,
    Failed(String),
}

impl ReportOutcome {
    pub fn message(&self) -> String {
        match self {
            ReportOutcome::Generated(text) => text.clone(),
            ReportOutcome::MissingCredential => "An OpenAI API key is required for the AI report. Set it with `HabitCoach config set ai.api_key <KEY>` or `HABITCOACH_AI_API_KEY`.".to_string(),
            ReportOutcome::Failed(reason) => format!("{FAILURE_PREFIX}: {reason}"),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ReportOutcome::Generated(_))
    }
}

/// Sends the request once and returns the generated text verbatim.
///
/// Never fails: a missing key or a collaborator error becomes a `ReportOutcome` variant.
pub fn compose(config: &Config, request: &ReportRequest) -> ReportOutcome {
    let Some(api_key) = config.resolve_ai_api_key() else {
        warn!("AI API key missing. report generation skipped");
        return ReportOutcome::MissingCredential;
    };

    let prompt = build_prompt(request);

    match ai::chat_completion(config, &api_key, request.persona.instruction(), &prompt) {
        Ok(text) => {
            info!(
                persona = request.persona.key(),
                chars = text.len(),
                "coach report generated"
            );
            ReportOutcome::Generated(text)
        }
        Err(error) => {
            warn!(error = %error, "coach report generation failed");
            ReportOutcome::Failed(format!("{error:#}"))
        }
    }
}

pub fn build_prompt(request: &ReportRequest) -> String {
    let metrics = &request.metrics;
    let completed = if metrics.completed.is_empty() {
        "none".to_string()
    } else {
        metrics.completed.join(", ")
    };
    let sections = SECTION_TITLES
        .iter()
        .enumerate()
        .map(|(index, title)| format!("{}. {title}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "User data for today:\n- Habit achievement rate: {:.0}%\n- Completed habits ({}/{}): {}\n- Mood: {}\n- Weather in {}: {}\n- Today's companion dog: {}\n- Today's suggested mission: {}\n- Coach style: {}\n\nRequest:\nConnect the companion dog's breed traits with the weather to analyze the user's day. Stay in the {} voice throughout.\nAnswer with exactly these five labeled sections:\n{}\n\nThe Condition Grade must be a single letter on the scale S, A, B, C, D. Tomorrow's Mission must be one concrete action.",
        metrics.achievement_rate,
        metrics.completed.len(),
        metrics.total,
        completed,
        metrics.mood,
        request.context.city,
        request.context.weather_text(),
        request.context.breed_label(),
        request.mission,
        request.persona.display_name(),
        request.persona.display_name(),
        sections,
    )
}

pub fn render_summary(request: &ReportRequest, outcome: &ReportOutcome) -> String {
    let completed = if request.metrics.completed.is_empty() {
        "- None".to_string()
    } else {
        request
            .metrics
            .completed
            .iter()
            .map(|name| format!("- {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let companion = request
        .context
        .companion
        .found()
        .map(|image| format!("{} ({})", image.breed_label, image.image_url))
        .unwrap_or_else(|| request.context.breed_label().to_string());

    format!(
        "# Daily Check-in\n\n## Summary\n- Achievement: {:.0}% ({}/{})\n- Mood: {}\n- Weather ({}): {}\n- Suggested mission: {}\n- Today's partner: {}\n\n## Completed Habits\n{}\n\n## {} Report\n{}\n",
        request.metrics.achievement_rate,
        request.metrics.completed.len(),
        request.metrics.total,
        request.metrics.mood,
        request.context.city,
        request.context.weather_text(),
        request.mission,
        companion,
        completed,
        request.persona.display_name(),
        outcome.message(),
    )
}
