use crate::model::{PersonId, TaskId};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How much weekend work a person accepts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekendPreference {
    /// No weekend work at all; weekend-attributable hours are redistributed
    /// to weekdays.
    None,
    /// Weekend days count at half weight.
    Light,
    /// Weekend days count the same as weekdays.
    Full,
}

impl WeekendPreference {
    /// Allocation weight for one calendar day under this preference.
    pub fn day_weight(&self, day: NaiveDate) -> f64 {
        if !is_weekend(day) {
            return 1.0;
        }
        match self {
            WeekendPreference::None => 0.0,
            WeekendPreference::Light => 0.5,
            WeekendPreference::Full => 1.0,
        }
    }
}

/// A recurring window a person prefers for focused work, e.g. Tue 09:00-12:00.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FocusWindow {
    pub weekday: Weekday,
    pub start_hour: u8,
    pub end_hour: u8,
}

/// One person's weekly capacity profile.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TeamCapacity {
    pub person: PersonId,
    pub available_hours_per_week: f64,
    pub weekend_preference: WeekendPreference,
    pub focus_windows: Vec<FocusWindow>,
    pub skills: Vec<String>,
}

impl TeamCapacity {
    pub fn new(person: impl Into<PersonId>, available_hours_per_week: f64) -> Self {
        Self {
            person: person.into(),
            available_hours_per_week,
            weekend_preference: WeekendPreference::Full,
            focus_windows: Vec::new(),
            skills: Vec::new(),
        }
    }

    pub fn with_weekend_preference(mut self, preference: WeekendPreference) -> Self {
        self.weekend_preference = preference;
        self
    }
}

/// One week of one person's committed hours on one task.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CapacityAllocation {
    pub person: PersonId,
    pub task_id: TaskId,
    /// Monday of the ISO week this row covers.
    pub week_start: NaiveDate,
    pub allocated_hours: f64,
    /// Fraction of the person's weekly capacity committed that week, summed
    /// across all of their concurrent allocations.
    pub utilization_rate: f64,
}

/// Inclusive calendar window a task is scheduled into.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScheduledWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start must not be after its end");
        Self { start, end }
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    pub fn num_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Iterate the calendar days in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.num_days()).map(|offset| self.start + Days::new(offset))
    }

    /// True if any day in the window falls on a Saturday or Sunday.
    pub fn touches_weekend(&self) -> bool {
        // Any window of 6+ days necessarily spans a weekend.
        self.num_days() >= 6 || self.days().any(is_weekend)
    }
}

/// True for Saturday and Sunday.
pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the ISO week containing `day`.
pub fn iso_week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(day.weekday().num_days_from_monday() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_is_monday() {
        // 2026-08-23 is a Sunday; its ISO week starts Monday 2026-08-17.
        assert_eq!(iso_week_start(date(2026, 8, 23)), date(2026, 8, 17));
        assert_eq!(iso_week_start(date(2026, 8, 17)), date(2026, 8, 17));
    }

    #[test]
    fn window_day_iteration() {
        let window = ScheduledWindow::new(date(2026, 8, 21), date(2026, 8, 24));
        let days: Vec<NaiveDate> = window.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], date(2026, 8, 21));
        assert_eq!(days[3], date(2026, 8, 24));
        assert!(window.touches_weekend());
    }

    #[test]
    fn weekday_only_window() {
        let window = ScheduledWindow::new(date(2026, 8, 17), date(2026, 8, 19));
        assert!(!window.touches_weekend());
    }

    #[test]
    fn weekend_weights() {
        let saturday = date(2026, 8, 22);
        let monday = date(2026, 8, 17);
        assert_eq!(WeekendPreference::None.day_weight(saturday), 0.0);
        assert_eq!(WeekendPreference::Light.day_weight(saturday), 0.5);
        assert_eq!(WeekendPreference::Full.day_weight(saturday), 1.0);
        assert_eq!(WeekendPreference::None.day_weight(monday), 1.0);
    }
}
