use chrono::NaiveDate;

use crate::domain::{day_of_week, DayOfWeek, DayVillageTable};

/// Day and village defaults proposed for a sale date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySelection {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    /// Village the weekday table assigns to `day`, if any.
    pub forced_village: Option<String>,
    /// Village to preselect: the forced one, else the first configured village.
    pub suggested_village: Option<String>,
}

impl DaySelection {
    /// Days without a table entry need the caller to pick a village.
    pub fn requires_selection(&self) -> bool {
        self.forced_village.is_none()
    }
}

pub struct ScheduleService;

impl ScheduleService {
    pub fn resolve(
        table: &DayVillageTable,
        villages: &[String],
        date: NaiveDate,
        day_override: Option<DayOfWeek>,
    ) -> DaySelection {
        let day = day_override.unwrap_or_else(|| day_of_week(date));
        let forced_village = table.default_village(day).map(str::to_string);
        let suggested_village = forced_village
            .clone()
            .or_else(|| villages.first().cloned());
        DaySelection {
            date,
            day,
            forced_village,
            suggested_village,
        }
    }
}
