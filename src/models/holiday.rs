use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::HolidayConfig;
use crate::error::{Result, TimesheetError};

/// Read-only set of non-working public holidays, built once per run.
///
/// A federal calendar also answers for years other than the one it was built
/// for, computing that year's holidays when a date in it is looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, String>,
    expand: bool,
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let last_of_month = first_of_next.pred_opt()?;

    (0..7)
        .map(|back| last_of_month - Duration::days(back))
        .find(|day| day.weekday() == weekday)
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

/// US federal holidays of `year`, including their observed days.
fn federal_days(year: i32) -> BTreeMap<NaiveDate, String> {
    let fixed = [
        (1, 1, "New Year's Day"),
        (6, 19, "Juneteenth National Independence Day"),
        (7, 4, "Independence Day"),
        (11, 11, "Veterans Day"),
        (12, 25, "Christmas Day"),
    ];

    let floating = [
        (nth_weekday(year, 1, Weekday::Mon, 3), "Martin Luther King Jr. Day"),
        (nth_weekday(year, 2, Weekday::Mon, 3), "Washington's Birthday"),
        (last_weekday(year, 5, Weekday::Mon), "Memorial Day"),
        (nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day"),
        (nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day"),
        (nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving"),
    ];

    let mut days = BTreeMap::new();

    for (month, day, name) in fixed {
        // Juneteenth became a federal holiday in 2021
        if month == 6 && year < 2021 {
            continue;
        }

        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };

        days.entry(date).or_insert_with(|| name.to_string());

        if let Some(shifted) = observed(date) {
            // New Year's Day on a Saturday is observed in the previous year
            if shifted.year() == year {
                days.entry(shifted).or_insert_with(|| format!("{name} (observed)"));
            }
        }
    }

    if let Some(next_new_year) = NaiveDate::from_ymd_opt(year + 1, 1, 1) {
        if next_new_year.weekday() == Weekday::Sat {
            days.entry(next_new_year - Duration::days(1))
                .or_insert_with(|| "New Year's Day (observed)".to_string());
        }
    }

    for (date, name) in floating.into_iter().filter_map(|(d, n)| Some((d?, n))) {
        days.entry(date).or_insert_with(|| name.to_string());
    }

    days
}

impl HolidayCalendar {
    /// US federal holidays, preloaded for `year` and computed for any other
    /// year on lookup.
    pub fn us_federal(year: i32) -> Self {
        debug!("Building US federal holidays for {}", year);
        Self {
            days: federal_days(year),
            expand: true,
        }
    }

    /// Build the calendar described by the `[holidays]` config section.
    pub fn from_config(config: &HolidayConfig) -> Result<Self> {
        let mut calendar = Self::us_federal(config.year);

        for extra in &config.extra {
            let date = NaiveDate::parse_from_str(extra, "%Y-%m-%d").map_err(|e| {
                TimesheetError::Config(format!("invalid holiday date {extra:?}: {e}"))
            })?;
            calendar.insert(date, "Additional closure");
        }

        info!(
            "Loaded holiday calendar for {} with {} day(s)",
            config.year,
            calendar.len()
        );

        Ok(calendar)
    }

    pub fn insert(&mut self, date: NaiveDate, name: &str) {
        debug!("Registering holiday {} ({})", date, name);
        self.days.entry(date).or_insert_with(|| name.to_string());
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.name_of(date).is_some()
    }

    pub fn name_of(&self, date: NaiveDate) -> Option<String> {
        if let Some(name) = self.days.get(&date) {
            return Some(name.clone());
        }

        if !self.expand {
            return None;
        }

        federal_days(date.year()).remove(&date)
    }

    /// Number of preloaded days; years computed on lookup are not counted.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
