pub mod store;

use crate::analyzer::metrics::{self, DayMetrics, HabitFlags, MoodScore};
use crate::analyzer::persona::CoachPersona;
use crate::analyzer::report::{self, ReportOutcome, ReportRequest};
use crate::config::{Config, MAX_SEED_DAYS};
use crate::context::{self, GatheredContext};
use crate::session::store::{DayRecord, HabitRecordStore};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

/// Context gathered before the user ticks any habit.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedCheckIn {
    pub context: GatheredContext,
    pub mission: String,
    pub habits: Vec<String>,
}

/// Which habits were completed, as submitted by a surface.
#[derive(Debug, Clone)]
pub enum CompletedHabits {
    Indices(Vec<usize>),
    Names(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct CheckInInput {
    pub date: NaiveDate,
    pub completed: CompletedHabits,
    pub mood: MoodScore,
    pub persona: CoachPersona,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
    pub record: DayRecord,
    pub metrics: DayMetrics,
    pub request: ReportRequest,
    pub report: ReportOutcome,
}

impl CheckInOutcome {
    pub fn render(&self) -> String {
        report::render_summary(&self.request, &self.report)
    }
}

pub fn prepare(config: &Config, city: &str) -> PreparedCheckIn {
    let context = context::gather(config, city);
    info!(
        city,
        weather = !context.weather.is_absent(),
        companion = !context.companion.is_absent(),
        "check-in context gathered"
    );
    let mission = context.mission().to_string();
    let habits = metrics::resolve_habit_names(&config.habits, &mission);

    PreparedCheckIn {
        context,
        mission,
        habits,
    }
}

/// Scores the check-in and asks the coach for a report. Touches no store.
pub fn evaluate(
    config: &Config,
    prepared: PreparedCheckIn,
    input: CheckInInput,
) -> Result<CheckInOutcome> {
    let flags = match &input.completed {
        CompletedHabits::Indices(indices) => HabitFlags::from_indices(&prepared.habits, indices)?,
        CompletedHabits::Names(names) => HabitFlags::from_names(&prepared.habits, names)?,
    };
    let day_metrics = metrics::calculate(&flags, input.mood);
    let record = DayRecord::new(input.date, day_metrics.achievement_rate, input.mood);

    let request = ReportRequest::new(day_metrics.clone(), prepared.context, input.persona);
    let report = report::compose(config, &request);

    Ok(CheckInOutcome {
        record,
        metrics: day_metrics,
        request,
        report,
    })
}

/// One interactive session: its settings and the records submitted so far.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    store: HabitRecordStore,
}

impl Session {
    pub fn start(config: Config) -> Self {
        let seed_days = config.seed_days.min(MAX_SEED_DAYS);
        let store = if seed_days > 0 {
            HabitRecordStore::seeded(
                &mut rand::rng(),
                today(),
                seed_days,
                config.habits.len(),
            )
        } else {
            HabitRecordStore::new()
        };
        if !store.is_empty() {
            info!(seeded = store.len(), "session pre-filled with sample history");
        }

        Self { config, store }
    }

    #[cfg(test)]
    pub fn with_store(config: Config, store: HabitRecordStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &HabitRecordStore {
        &self.store
    }

    /// Appends the day, whatever the report outcome.
    pub fn record(&mut self, outcome: &CheckInOutcome) {
        self.store.append(outcome.record.clone());
        info!(
            date = %outcome.record.date,
            rate = outcome.record.achievement_rate,
            report = outcome.report.is_generated(),
            days = self.store.len(),
            "check-in recorded"
        );
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
