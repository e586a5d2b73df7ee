use std::collections::BTreeSet;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, Result};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub fn date_of(day: u32, month: u32, year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PresenceError::validation(format!("{:04}-{:02}-{:02} is not a valid date", year, month, day)))
}

pub fn days_in_month(month: u32, year: i32) -> Result<u32> {
    date_of(1, month, year)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| PresenceError::validation(format!("month {:04}-{:02} is out of range", year, month)))?;
    Ok(last.day())
}

/// Weekday of a calendar day, 0 = Sunday through 6 = Saturday.
///
/// Both tracked-day selection and excuse matching go through this function,
/// so "Monday" always means the same thing to both.
pub fn weekday_of(day: u32, month: u32, year: i32) -> Result<u8> {
    Ok(weekday_of_date(date_of(day, month, year)?))
}

pub fn weekday_of_date(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Monday through Friday.
pub fn is_weekday(weekday: u8) -> bool {
    (1..=5).contains(&weekday)
}

pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES.get(weekday as usize).copied().unwrap_or("?")
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// The set of days under tracking for one month.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackedDays {
    pub month: u32,
    pub year: i32,
    days: BTreeSet<u32>,
}

impl Default for TrackedDays {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            month: today.month(),
            year: today.year(),
            days: BTreeSet::new(),
        }
    }
}

impl TrackedDays {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        days_in_month(month, year)?;
        Ok(Self {
            month,
            year,
            days: BTreeSet::new(),
        })
    }

    pub fn with_days(month: u32, year: i32, days: &[u32]) -> Result<Self> {
        let mut tracked = Self::new(month, year)?;
        let limit = tracked.days_in_month();
        for &day in days {
            if day == 0 || day > limit {
                return Err(PresenceError::validation(format!(
                    "day {} is outside {} {}", day, month_name(month), year
                )));
            }
            tracked.days.insert(day);
        }
        Ok(tracked)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.month, self.year).unwrap_or(0)
    }

    pub fn contains(&self, day: u32) -> bool {
        self.days.contains(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.days.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn date(&self, day: u32) -> Result<NaiveDate> {
        date_of(day, self.month, self.year)
    }

    /// Adds the day if absent, removes it otherwise. Returns whether the day
    /// is tracked afterwards.
    pub fn toggle(&mut self, day: u32) -> Result<bool> {
        if day == 0 || day > self.days_in_month() {
            return Err(PresenceError::validation(format!(
                "day {} is outside {} {}", day, month_name(self.month), self.year
            )));
        }
        if self.days.remove(&day) {
            Ok(false)
        } else {
            self.days.insert(day);
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.days = (1..=self.days_in_month()).collect();
    }

    pub fn select_weekdays(&mut self) {
        let (month, year) = (self.month, self.year);
        self.days = (1..=self.days_in_month())
            .filter(|&day| weekday_of(day, month, year).map(is_weekday).unwrap_or(false))
            .collect();
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    pub fn next_month(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
        self.normalize();
    }

    pub fn previous_month(&mut self) {
        if self.month == 1 {
            self.month = 12;
            self.year -= 1;
        } else {
            self.month -= 1;
        }
        self.normalize();
    }

    pub fn set_month(&mut self, month: u32, year: i32) -> Result<()> {
        days_in_month(month, year)?;
        self.month = month;
        self.year = year;
        self.normalize();
        Ok(())
    }

    /// Drops days that do not exist in the current month. Returns how many
    /// were removed.
    pub fn normalize(&mut self) -> usize {
        let limit = self.days_in_month();
        let before = self.days.len();
        self.days.retain(|&d| d >= 1 && d <= limit);
        before - self.days.len()
    }

    pub fn label(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1, 2025).unwrap(), 31);
        assert_eq!(days_in_month(2, 2024).unwrap(), 29);
        assert_eq!(days_in_month(2, 2023).unwrap(), 28);
        assert_eq!(days_in_month(4, 2025).unwrap(), 30);
        assert_eq!(days_in_month(12, 2025).unwrap(), 31);
        assert!(days_in_month(13, 2025).is_err());
        assert!(days_in_month(0, 2025).is_err());
    }

    #[test]
    fn test_weekday_of() {
        // 2025-09-01 is a Monday, 2025-01-01 a Wednesday
        assert_eq!(weekday_of(1, 9, 2025).unwrap(), 1);
        assert_eq!(weekday_of(1, 1, 2025).unwrap(), 3);
        assert_eq!(weekday_of(7, 9, 2025).unwrap(), 0);
        assert!(weekday_of(30, 2, 2024).is_err());
    }

    #[test]
    fn test_select_weekdays_matches_weekday_of() {
        let mut tracked = TrackedDays::new(9, 2025).unwrap();
        tracked.select_weekdays();
        assert_eq!(tracked.len(), 22);
        for day in tracked.iter() {
            assert!(is_weekday(weekday_of(day, 9, 2025).unwrap()));
        }
        assert!(!tracked.contains(6));
        assert!(!tracked.contains(7));
    }

    #[test]
    fn test_toggle_and_range() {
        let mut tracked = TrackedDays::new(2, 2023).unwrap();
        assert!(tracked.toggle(5).unwrap());
        assert!(!tracked.toggle(5).unwrap());
        assert!(tracked.toggle(29).is_err());
        assert!(tracked.toggle(0).is_err());
        assert!(TrackedDays::with_days(2, 2023, &[1, 30]).is_err());
    }

    #[test]
    fn test_month_navigation_wraps_year() {
        let mut tracked = TrackedDays::with_days(12, 2024, &[1, 31]).unwrap();
        tracked.next_month();
        assert_eq!((tracked.month, tracked.year), (1, 2025));
        assert_eq!(tracked.iter().collect::<Vec<_>>(), vec![1, 31]);

        tracked.previous_month();
        tracked.previous_month();
        assert_eq!((tracked.month, tracked.year), (11, 2024));
        // November has no 31st
        assert_eq!(tracked.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut tracked = TrackedDays::new(2, 2024).unwrap();
        tracked.select_all();
        assert_eq!(tracked.len(), 29);
        tracked.clear();
        assert!(tracked.is_empty());
    }
}
