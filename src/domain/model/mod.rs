mod canteen;
mod meal;
mod opening_hours;

pub use canteen::CanteenInfo;
pub use meal::{Meal, Prices};
pub use opening_hours::{OpeningHours, WeeklyOpeningHours};

use chrono::NaiveDate;

/// Canonical date dimension of all caches and lookups: `YYYY-MM-DD`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn day_key_is_iso_formatted() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();
        assert_eq!(day_key(date), "2024-08-07");
    }

    #[test]
    fn day_key_pads_single_digits() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(day_key(date), "2024-01-03");
    }
}
