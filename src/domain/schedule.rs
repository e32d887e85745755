//! Weekday labels and the static weekday → village delivery table.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::SalesError;

/// Gregorian weekday, serialized with its full English name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayOfWeek {
    type Err = SalesError;

    /// Accepts full or three-letter names in any case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        DayOfWeek::ALL
            .iter()
            .copied()
            .find(|day| {
                let label = day.label().to_ascii_lowercase();
                label == needle || (needle.len() == 3 && label.starts_with(&needle))
            })
            .ok_or_else(|| SalesError::invalid(format!("unknown day `{}`", value.trim())))
    }
}

/// Returns the weekday of `date`.
pub fn day_of_week(date: NaiveDate) -> DayOfWeek {
    DayOfWeek::of(date)
}

/// A fixed delivery day for a village.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAssignment {
    pub day: DayOfWeek,
    pub village: String,
}

impl DayAssignment {
    pub fn new(day: DayOfWeek, village: impl Into<String>) -> Self {
        Self {
            day,
            village: village.into(),
        }
    }
}

/// Static weekday → village defaults. Days without an entry have no forced
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DayVillageTable {
    entries: Vec<DayAssignment>,
}

impl DayVillageTable {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DayAssignment>,
    {
        let mut table = Self::default();
        for entry in entries {
            table.entries.retain(|existing| existing.day != entry.day);
            table.entries.push(entry);
        }
        table
    }

    pub fn default_village(&self, day: DayOfWeek) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.day == day)
            .map(|entry| entry.village.as_str())
    }

    /// Looks up by day name; unparseable names yield `None`.
    pub fn default_village_for(&self, day_name: &str) -> Option<&str> {
        day_name
            .parse::<DayOfWeek>()
            .ok()
            .and_then(|day| self.default_village(day))
    }

    pub fn entries(&self) -> &[DayAssignment] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(day_of_week(date), DayOfWeek::Monday);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(day_of_week(date).label(), "Thursday");
    }

    #[test]
    fn parses_full_and_short_names() {
        assert_eq!("monday".parse::<DayOfWeek>(), Ok(DayOfWeek::Monday));
        assert_eq!(" SAT ".parse::<DayOfWeek>(), Ok(DayOfWeek::Saturday));
        assert!("Moonday".parse::<DayOfWeek>().is_err());
        assert!("mo".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn later_assignment_for_same_day_wins() {
        let table = DayVillageTable::new([
            DayAssignment::new(DayOfWeek::Monday, "A"),
            DayAssignment::new(DayOfWeek::Monday, "B"),
        ]);
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.default_village(DayOfWeek::Monday), Some("B"));
        assert_eq!(table.default_village_for("Tuesday"), None);
    }
}
