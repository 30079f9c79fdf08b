//! Parsing of the naive local timestamps used by the agenda.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::utils::error::AppError;

const SCHEDULE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a client supplied date and time. Fractional seconds and timezone
/// suffixes are not accepted; schedules are wall-clock local times.
pub fn parse_scheduled_at(raw: &str) -> Result<NaiveDateTime, AppError> {
    let trimmed = raw.trim();
    SCHEDULE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| {
            AppError::ValidationError(format!(
                "Invalid date '{}', expected YYYY-MM-DD HH:MM",
                trimmed
            ))
        })
}

/// Returns the half-open range `[first day of month, first day of next month)`
/// for a `YYYY-MM` string.
pub fn month_bounds(month: &str) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    let invalid =
        || AppError::ValidationError(format!("Invalid month '{}', expected YYYY-MM", month));

    let (year, month_number) = month.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month_number: u32 = month_number.parse().map_err(|_| invalid())?;

    let start = NaiveDate::from_ymd_opt(year, month_number, 1).ok_or_else(invalid)?;
    let next = if month_number == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_number + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((start.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN)))
}

pub fn current_month() -> String {
    let today = Local::now().date_naive();
    format!("{:04}-{:02}", today.year(), today.month())
}
