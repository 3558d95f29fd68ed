use chrono::{Datelike, Days, Local, NaiveDate};

use monitor_core::{DateRange, Period};

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Default reporting window for `period`, always ending at `today`.
pub fn default_range_for_period(period: Period, today: NaiveDate) -> DateRange {
    let start = match period {
        Period::Daily => today.with_day(1).unwrap_or(today),
        // Monday-anchored calendar week; Sunday reaches back six days.
        Period::Weekly => today
            .checked_sub_days(Days::new(u64::from(
                today.weekday().num_days_from_monday(),
            )))
            .unwrap_or(today),
        Period::Monthly => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
    };
    DateRange { start, end: today }
}

/// Caps both endpoints at `max_date` and never lets `end` precede `start`.
pub fn clamp_range(range: DateRange, max_date: NaiveDate) -> DateRange {
    let start = range.start.min(max_date);
    let end = range.end.min(max_date).max(start);
    DateRange { start, end }
}

/// Moves the window by `delta_days` and re-clamps it against `today`.
pub fn shift_range(range: DateRange, delta_days: i64, today: NaiveDate) -> DateRange {
    let shifted = DateRange {
        start: shift_date(range.start, delta_days),
        end: shift_date(range.end, delta_days),
    };
    clamp_range(shifted, today)
}

fn shift_date(date: NaiveDate, delta_days: i64) -> NaiveDate {
    let days = Days::new(delta_days.unsigned_abs());
    let shifted = if delta_days >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.unwrap_or(if delta_days >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Inclusive day count between two dates; an inverted pair still yields 1.
pub fn days_between_inclusive(start: NaiveDate, end: NaiveDate) -> u64 {
    let span = end.signed_duration_since(start).num_days();
    u64::try_from(span.saturating_add(1)).unwrap_or(0).max(1)
}

/// Fills missing bounds from the period default and clamps to `today`.
pub fn range_from_bounds(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    period: Period,
    today: NaiveDate,
) -> DateRange {
    let default = default_range_for_period(period, today);
    let range = DateRange {
        start: start.unwrap_or(default.start),
        end: end.unwrap_or(default.end),
    };
    clamp_range(range, today)
}

pub fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
