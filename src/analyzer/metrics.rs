use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder in a habit label replaced by the day's suggested mission.
pub const MISSION_PLACEHOLDER: &str = "{mission}";

pub const MIN_MOOD: u8 = 1;
pub const MAX_MOOD: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodScore(u8);

impl MoodScore {
    pub fn new(value: u8) -> Result<Self> {
        if !(MIN_MOOD..=MAX_MOOD).contains(&value) {
            bail!("mood must be between {MIN_MOOD} and {MAX_MOOD}, got {value}");
        }
        Ok(Self(value))
    }

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_MOOD), i64::from(MAX_MOOD)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MoodScore {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MoodScore> for u8 {
    fn from(value: MoodScore) -> Self {
        value.0
    }
}

impl fmt::Display for MoodScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, MAX_MOOD)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitFlag {
    pub name: String,
    pub done: bool,
}

/// Habit check-boxes for one day, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitFlags(Vec<HabitFlag>);

impl HabitFlags {
    pub fn from_values(names: &[String], values: &[bool]) -> Result<Self> {
        if names.len() != values.len() {
            bail!(
                "expected {} habit values, got {}",
                names.len(),
                values.len()
            );
        }

        Ok(Self(
            names
                .iter()
                .zip(values)
                .map(|(name, done)| HabitFlag {
                    name: name.clone(),
                    done: *done,
                })
                .collect(),
        ))
    }

    /// Builds flags from zero-based indices of the completed habits.
    pub fn from_indices(names: &[String], done: &[usize]) -> Result<Self> {
        if let Some(index) = done.iter().find(|index| **index >= names.len()) {
            bail!(
                "habit index {} is out of range (1-{})",
                index + 1,
                names.len()
            );
        }

        let values = (0..names.len())
            .map(|index| done.contains(&index))
            .collect::<Vec<_>>();
        Self::from_values(names, &values)
    }

    /// Builds flags from completed habit names, matched case-insensitively.
    pub fn from_names(names: &[String], done: &[String]) -> Result<Self> {
        let indices = done
            .iter()
            .map(|wanted| {
                let normalized = wanted.trim().to_lowercase();
                names
                    .iter()
                    .position(|name| name.to_lowercase() == normalized)
                    .ok_or_else(|| anyhow::anyhow!("unknown habit: {}", wanted.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_indices(names, &indices)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HabitFlag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn done_count(&self) -> usize {
        self.0.iter().filter(|flag| flag.done).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMetrics {
    pub achievement_rate: f64,
    pub completed: Vec<String>,
    pub total: usize,
    pub mood: MoodScore,
}

/// Expands the mission placeholder in configured habit labels.
pub fn resolve_habit_names(labels: &[String], mission: &str) -> Vec<String> {
    labels
        .iter()
        .map(|label| label.replace(MISSION_PLACEHOLDER, mission))
        .collect()
}

pub fn achievement_rate(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let rate = (done.min(total) * 100) as f64 / total as f64;
    (rate * 100.0).round() / 100.0
}

pub fn calculate(flags: &HabitFlags, mood: MoodScore) -> DayMetrics {
    let completed = flags
        .iter()
        .filter(|flag| flag.done)
        .map(|flag| flag.name.clone())
        .collect::<Vec<_>>();

    DayMetrics {
        achievement_rate: achievement_rate(flags.done_count(), flags.len()),
        completed,
        total: flags.len(),
        mood,
    }
}
