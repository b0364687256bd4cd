use crate::analyzer::metrics::{MAX_MOOD, MIN_MOOD, MoodScore, achievement_rate};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;

pub const HIGH_ACHIEVEMENT_THRESHOLD: f64 = 70.0;
pub const HIGH_COLOR: &str = "#00ff00";
pub const LOW_COLOR: &str = "#ff4b4b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTag {
    High,
    Low,
}

impl AchievementTag {
    pub fn for_rate(rate: f64) -> Self {
        if rate > HIGH_ACHIEVEMENT_THRESHOLD {
            Self::High
        } else {
            Self::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::High => HIGH_COLOR,
            Self::Low => LOW_COLOR,
        }
    }
}

/// One submitted check-in. Never edited once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub achievement_rate: f64,
    pub mood: MoodScore,
    pub tag: AchievementTag,
}

impl DayRecord {
    pub fn new(date: NaiveDate, achievement_rate: f64, mood: MoodScore) -> Self {
        let achievement_rate = achievement_rate.clamp(0.0, 100.0);
        Self {
            date,
            achievement_rate,
            mood,
            tag: AchievementTag::for_rate(achievement_rate),
        }
    }

    pub fn title(&self) -> String {
        format!("{:.0}%", self.achievement_rate)
    }

    pub fn color(&self) -> &'static str {
        self.tag.color()
    }
}

/// Append-only, session-lifetime list of day records in submission order.
#[derive(Debug, Clone, Default)]
pub struct HabitRecordStore {
    records: Vec<DayRecord>,
}

impl HabitRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic history for the `days` days before `today`, oldest first.
    pub fn seeded<R: Rng>(
        rng: &mut R,
        today: NaiveDate,
        days: u32,
        habit_count: usize,
    ) -> Self {
        let habit_count = habit_count.max(1);
        let records = (1..=i64::from(days))
            .rev()
            .map(|offset| {
                let done = rng.random_range(0..=habit_count);
                let mood = MoodScore::clamped(i64::from(rng.random_range(MIN_MOOD..=MAX_MOOD)));
                DayRecord::new(
                    today - Duration::days(offset),
                    achievement_rate(done, habit_count),
                    mood,
                )
            })
            .collect();

        Self { records }
    }

    pub fn append(&mut self, record: DayRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
