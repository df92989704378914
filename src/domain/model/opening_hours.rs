use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Open/close time of one weekday as fractional hours, e.g. 9.5 = 09:30.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: f32,
    pub close: f32,
}

impl OpeningHours {
    /// Reading for weekdays without a schedule entry.
    pub const CLOSED: OpeningHours = OpeningHours {
        open: 0.0,
        close: 0.0,
    };

    pub fn new(open: f32, close: f32) -> Self {
        Self { open, close }
    }

    pub fn is_closed(&self) -> bool {
        *self == Self::CLOSED
    }
}

/// Per-weekday opening hours derived from a textual schedule.
///
/// Weekdays the schedule never mentioned are absent and read as
/// [`OpeningHours::CLOSED`]. A re-scrape replaces the table wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyOpeningHours {
    // indexed by Weekday::num_days_from_monday
    days: [Option<OpeningHours>; 7],
}

impl WeeklyOpeningHours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, day: Weekday, hours: OpeningHours) {
        self.days[day.num_days_from_monday() as usize] = Some(hours);
    }

    pub fn get(&self, day: Weekday) -> OpeningHours {
        self.days[day.num_days_from_monday() as usize].unwrap_or(OpeningHours::CLOSED)
    }

    pub fn on_date(&self, date: NaiveDate) -> OpeningHours {
        self.get(date.weekday())
    }

    /// True if no weekday has a schedule entry at all.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_weekday_reads_as_closed() {
        let table = WeeklyOpeningHours::new();
        assert_eq!(table.get(Weekday::Wed), OpeningHours::CLOSED);
        assert!(table.get(Weekday::Wed).is_closed());
    }

    #[test]
    fn set_weekday_is_returned() {
        let mut table = WeeklyOpeningHours::new();
        table.set(Weekday::Sat, OpeningHours::new(9.5, 14.0));

        assert_eq!(table.get(Weekday::Sat), OpeningHours::new(9.5, 14.0));
        assert_eq!(table.get(Weekday::Sun), OpeningHours::CLOSED);
    }

    #[test]
    fn on_date_resolves_the_weekday() {
        let mut table = WeeklyOpeningHours::new();
        table.set(Weekday::Wed, OpeningHours::new(8.0, 18.0));

        // 2024-08-07 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();
        assert_eq!(table.on_date(date), OpeningHours::new(8.0, 18.0));
    }
}
