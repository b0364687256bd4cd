use crate::session::store::{AchievementTag, DayRecord};
use serde::Serialize;

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub days_tracked: usize,
    pub average_rate: f64,
    pub average_mood: f64,
    pub high_days: usize,
    pub latest: Option<DayRecord>,
}

pub fn calendar_events(records: &[DayRecord]) -> Vec<CalendarEvent> {
    records
        .iter()
        .map(|record| CalendarEvent {
            title: record.title(),
            start: record.date.format("%Y-%m-%d").to_string(),
            color: record.color().to_string(),
        })
        .collect()
}

pub fn stats(records: &[DayRecord]) -> HistoryStats {
    let days_tracked = records.len();
    let average = |sum: f64| {
        if days_tracked == 0 {
            0.0
        } else {
            ((sum / days_tracked as f64) * 100.0).round() / 100.0
        }
    };

    HistoryStats {
        days_tracked,
        average_rate: average(records.iter().map(|record| record.achievement_rate).sum()),
        average_mood: average(
            records
                .iter()
                .map(|record| f64::from(record.mood.value()))
                .sum(),
        ),
        high_days: records
            .iter()
            .filter(|record| record.tag == AchievementTag::High)
            .count(),
        latest: records.last().cloned(),
    }
}

/// Terminal bar chart, one line per record in submission order.
pub fn render_chart(records: &[DayRecord]) -> String {
    if records.is_empty() {
        return "No check-ins yet. Run `HabitCoach checkin` to record your first day.".to_string();
    }

    let rows = records
        .iter()
        .map(|record| {
            let filled = ((record.achievement_rate / 100.0) * BAR_WIDTH as f64).round() as usize;
            format!(
                "{}  {}{} {:>4}  mood {:>2}",
                record.date.format("%Y-%m-%d"),
                "█".repeat(filled.min(BAR_WIDTH)),
                "░".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
                record.title(),
                record.mood.value()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let summary = stats(records);
    format!(
        "{rows}\n\nTracked {} day(s). Average achievement {:.0}%, average mood {:.1}. Keep going!",
        summary.days_tracked, summary.average_rate, summary.average_mood
    )
}
