use chrono::{Duration, NaiveTime};

use crate::models::timesheet::TimeSlot;

/// Every synthesized day starts at 09:00.
pub const CLOCK_IN: (u32, u32) = (9, 0);

/// Days with at least this many hours get a one hour lunch break.
pub const LUNCH_THRESHOLD: f64 = 6.0;

const CLOCK_FORMAT: &str = "%I:%M %p";

fn clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Invent plausible clock times for a day worked for `hours`.
///
/// The times are illustrative only: the day starts at 09:00 and, from six
/// hours on, a lunch hour is placed after half the hours (rounded down) and
/// the end of the day moves back by that hour.
pub fn synthesize(hours: f64) -> TimeSlot {
    if hours.is_nan() || hours <= 0.0 {
        return TimeSlot::empty();
    }

    let Some(am_in) = NaiveTime::from_hms_opt(CLOCK_IN.0, CLOCK_IN.1, 0) else {
        return TimeSlot::empty();
    };
    let worked = Duration::seconds((hours * 3600.0).round() as i64);
    let out = am_in + worked;

    if hours >= LUNCH_THRESHOLD {
        let lunch_out = am_in + Duration::hours((hours / 2.0).floor() as i64);
        let lunch_in = lunch_out + Duration::hours(1);

        TimeSlot {
            am_in: clock(am_in),
            pm_out: clock(out + Duration::hours(1)),
            lunch_out: clock(lunch_out),
            lunch_in: clock(lunch_in),
        }
    } else {
        TimeSlot {
            am_in: clock(am_in),
            pm_out: clock(out),
            lunch_out: String::new(),
            lunch_in: String::new(),
        }
    }
}
