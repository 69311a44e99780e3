use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::config::FormConfig;
use crate::helpers::{slots, workweek};
use crate::models::holiday::HolidayCalendar;
use crate::models::payroll::PayPeriod;

pub const DAYS_PER_WEEK: usize = 7;

/// Day labels used by the form, in slot order.
pub const FORM_DAYS: [&str; DAYS_PER_WEEK] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Form field name to value, one per rendered document.
pub type FieldMap = BTreeMap<String, String>;

/// Synthesized clock times of one day, empty strings when nothing was worked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeSlot {
    pub am_in: String,
    pub pm_out: String,
    pub lunch_out: String,
    pub lunch_in: String,
}

impl TimeSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_lunch(&self) -> bool {
        !self.lunch_out.is_empty() && !self.lunch_in.is_empty()
    }
}

/// Hours per day for the seven days starting at `start`.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekAllocation {
    pub start: NaiveDate,
    pub hours: [f64; DAYS_PER_WEEK],
    /// Hours that did not fit into the week's workdays
    pub dropped: f64,
}

impl WeekAllocation {
    pub fn dates(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        std::array::from_fn(|i| self.start + Duration::days(i as i64))
    }

    pub fn total(&self) -> f64 {
        self.hours.iter().sum()
    }

    pub fn slots(&self) -> [TimeSlot; DAYS_PER_WEEK] {
        std::array::from_fn(|i| slots::synthesize(self.hours[i]))
    }
}

/// Split a period total between its two weeks.
///
/// An odd whole total gives the first week the extra hour; anything else is
/// halved.
pub fn split_period_hours(total_hours: f64) -> (f64, f64) {
    let half = total_hours / 2.0;

    if total_hours % 2.0 == 1.0 {
        (half + 0.5, half - 0.5)
    } else {
        (half, half)
    }
}

/// Render hours the way they appear on the form: `8`, `4.5`, `0`.
pub fn format_hours(hours: f64) -> String {
    if hours == 0.0 {
        "0".to_string()
    } else {
        hours.to_string()
    }
}

/// Everything printed on one employee's timesheet for one pay period.
#[derive(Clone, Debug, PartialEq)]
pub struct TimesheetRecord {
    pub employee: String,
    pub period: PayPeriod,
    pub title: String,
    pub supervisor: String,
    pub week1: WeekAllocation,
    pub week2: WeekAllocation,
}

impl TimesheetRecord {
    /// Build the record for `employee`, or `None` when there are no hours to report.
    pub fn assemble(
        employee: &str,
        period: PayPeriod,
        total_hours: f64,
        holidays: &HolidayCalendar,
        form: &FormConfig,
    ) -> Option<Self> {
        if total_hours.is_nan() || total_hours <= 0.0 {
            return None;
        }

        let (week1_hours, week2_hours) = split_period_hours(total_hours);

        Some(Self {
            employee: employee.to_string(),
            period,
            title: form.title.clone(),
            supervisor: form.supervisor.clone(),
            week1: workweek::allocate_week(period.week1_start, week1_hours, holidays),
            week2: workweek::allocate_week(period.week2_start, week2_hours, holidays),
        })
    }

    pub fn total_hours(&self) -> f64 {
        self.week1.total() + self.week2.total()
    }

    /// Hours of the period that did not fit into either week.
    pub fn dropped_hours(&self) -> f64 {
        self.week1.dropped + self.week2.dropped
    }

    pub fn pay_date(&self) -> String {
        self.period.pay_date.format("%Y-%m-%d").to_string()
    }

    /// `<pay date>_<name>_timesheet_<pay date>.pdf`
    pub fn file_name(&self) -> String {
        let pay_date = self.pay_date();
        let name = self.employee.replace(['/', '\\'], "-");

        format!("{pay_date}_{name}_timesheet_{pay_date}.pdf")
    }

    pub fn to_field_map(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        let mut set = |key: String, value: String| {
            fields.insert(key, value);
        };

        set("Name".to_string(), self.employee.clone());
        set("Title".to_string(), self.title.clone());
        set("Employee Signature".to_string(), self.employee.clone());
        set("Supervisor".to_string(), self.supervisor.clone());
        set("Supervisor Signature".to_string(), self.supervisor.clone());
        set("Pay Date".to_string(), self.pay_date());

        for (week, suffix) in [(&self.week1, ""), (&self.week2, "_2")] {
            let dates = week.dates();
            let slots = week.slots();

            for (i, day) in FORM_DAYS.iter().enumerate() {
                set(
                    format!("Date{day}{suffix}"),
                    dates[i].format("%Y-%m-%d").to_string(),
                );
                set(
                    format!("Hours Worked{day}{suffix}"),
                    format_hours(week.hours[i]),
                );
            }

            // the form only has clock fields for Monday to Friday
            for i in 1..=5 {
                let day = FORM_DAYS[i];
                let slot = &slots[i];

                set(format!("AM In{day}{suffix}"), slot.am_in.clone());
                set(format!("PM Out{day}{suffix}"), slot.pm_out.clone());
                set(format!("Out{day}{suffix}"), slot.lunch_out.clone());
                set(format!("In{day}{suffix}"), slot.lunch_in.clone());
            }

            set(
                format!("Hours WorkedTotal for the Week{suffix}"),
                format_hours(week.total()),
            );
        }

        set(
            "Hours WorkedTotal for the Period".to_string(),
            format_hours(self.total_hours()),
        );

        fields
    }
}
