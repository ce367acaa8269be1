use chrono::{Days, Local, NaiveDate};

/// Number of trailing days of history kept for the contribution calendar.
pub const RETENTION_DAYS: u64 = 365;

pub type DayString = String;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

/// Oldest date still kept when `reference` is the latest event.
pub fn retention_cutoff(reference: NaiveDate) -> Option<NaiveDate> {
    reference.checked_sub_days(Days::new(RETENTION_DAYS))
}

pub fn day_string(date: NaiveDate) -> DayString {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_day(day: &str) -> Option<NaiveDate> {
    let day = day.trim();
    if day.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
