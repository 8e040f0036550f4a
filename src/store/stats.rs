use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::Todo;

/// Task counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    /// Day label, `MM/dd`.
    pub date: String,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Summary figures shown on the statistics dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded percentage of completed tasks, 0 when there are none.
    pub completion_rate: u32,
    /// Tasks created on each day of the Monday-to-Sunday week containing `now`.
    pub this_week: Vec<DayBucket>,
}

impl TodoStats {
    pub fn compute<Tz: TimeZone>(todos: &[Todo], now: DateTime<Tz>) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|todo| todo.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };

        let today = now.with_timezone(&Local).date_naive();
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let this_week = (0..7)
            .map(|offset| Self::day_bucket(todos, monday + Duration::days(offset)))
            .collect();

        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
            this_week,
        }
    }

    fn day_bucket(todos: &[Todo], day: NaiveDate) -> DayBucket {
        let created_that_day: Vec<&Todo> = todos
            .iter()
            .filter(|todo| todo.created_at.with_timezone(&Local).date_naive() == day)
            .collect();
        let completed = created_that_day.iter().filter(|todo| todo.completed).count();

        DayBucket {
            date: day.format("%m/%d").to_string(),
            total: created_that_day.len(),
            completed,
            pending: created_that_day.len() - completed,
        }
    }
}
