use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

pub fn day_of(ts: &NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// Monday of the ISO week containing `ts`.
pub fn week_of(ts: &NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn month_of(ts: &NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    date.with_day(1).unwrap_or(date)
}
