use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::holiday::HolidayCalendar;
use crate::models::timesheet::{DAYS_PER_WEEK, WeekAllocation};

/// Number of calendar days, counted from the week start, that may receive hours.
pub const WORKWEEK_SPAN: usize = 5;

/// Hours assigned to a single workday at most.
pub const MAX_DAILY_HOURS: f64 = 8.0;

pub fn is_workday(date: NaiveDate, holidays: &HolidayCalendar) -> bool {
    date.weekday().num_days_from_monday() < 5 && !holidays.contains(date)
}

/// Weekdays among the five days starting at `start` that are not holidays.
pub fn workdays(start: NaiveDate, holidays: &HolidayCalendar) -> Vec<NaiveDate> {
    (0..WORKWEEK_SPAN as i64)
        .map(|offset| start + Duration::days(offset))
        .filter(|&date| {
            let keep = is_workday(date, holidays);
            if !keep {
                debug!("Skipping {} - weekend or holiday", date);
            }
            keep
        })
        .collect()
}

/// Fill workdays in order with up to eight hours each.
///
/// Whatever does not fit into the given days is left out of the result.
pub fn split_hours(workdays: usize, total_hours: f64) -> Vec<f64> {
    let mut hours_per_day = vec![0.0; workdays];
    let mut remaining = total_hours;

    for hours in hours_per_day.iter_mut() {
        if remaining > MAX_DAILY_HOURS {
            *hours = MAX_DAILY_HOURS;
            remaining -= MAX_DAILY_HOURS;
        } else {
            *hours = remaining;
            break;
        }
    }

    hours_per_day
}

/// Spread `total_hours` over the week starting at `start`.
pub fn allocate_week(
    start: NaiveDate,
    total_hours: f64,
    holidays: &HolidayCalendar,
) -> WeekAllocation {
    let days = workdays(start, holidays);
    let per_day = split_hours(days.len(), total_hours);

    let mut hours = [0.0; DAYS_PER_WEEK];
    for (date, allotted) in days.iter().zip(per_day) {
        // workdays are at most four days past `start`
        let slot = (*date - start).num_days() as usize;
        hours[slot] = allotted;
    }

    let allocated: f64 = hours.iter().sum();
    let dropped = (total_hours - allocated).max(0.0);

    if dropped > 0.0 {
        debug!(
            "Week of {}: {} hour(s) exceed the capacity of {} workday(s) and are dropped",
            start,
            dropped,
            days.len()
        );
    }

    WeekAllocation {
        start,
        hours,
        dropped,
    }
}
