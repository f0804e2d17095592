use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

const ISDAYOFF_URL: &str = "https://isdayoff.ru/api/getdata";
const FETCH_TIMEOUT_SECS: u64 = 5;

const HOLIDAY_CODE: char = '1';

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("production calendar request failed: {0}")]
    Fetch(String),
    #[error("unexpected isdayoff.ru response: expected {expected} day codes, got {got}")]
    BadResponse { expected: usize, got: usize },
    #[error("invalid holiday date {0:?} (expected YYYY-MM-DD)")]
    BadDate(String),
}

/// All dates of the given month, in order.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(mut day) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(31);
    while day.month() == month {
        out.push(day);
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    out
}

pub fn is_weekend(day: NaiveDate) -> bool {
    day.weekday().num_days_from_monday() >= 5
}

/// Working days of the month per the production calendar.
pub fn production_days(year: i32, month: u32, holidays: &BTreeSet<NaiveDate>) -> u32 {
    month_days(year, month)
        .into_iter()
        .filter(|d| !is_weekend(*d) && !holidays.contains(d))
        .count() as u32
}

/// Fetch non-working days (weekends + holidays) from isdayoff.ru.
///
/// The API answers with one character per day of the month, `'1'` marking a
/// non-working day.
pub fn fetch_holidays(year: i32, month: u32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
    let agent = ureq::AgentBuilder::new()
        .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build();
    let response = agent
        .get(ISDAYOFF_URL)
        .query("year", &year.to_string())
        .query("month", &month.to_string())
        .query("cc", "ru")
        .call()
        .map_err(|err| CalendarError::Fetch(err.to_string()))?;
    let body = response
        .into_string()
        .map_err(|err| CalendarError::Fetch(err.to_string()))?;

    let days = month_days(year, month);
    let codes: Vec<char> = body.trim().chars().collect();
    if codes.len() != days.len() {
        return Err(CalendarError::BadResponse {
            expected: days.len(),
            got: codes.len(),
        });
    }

    let holidays: BTreeSet<NaiveDate> = days
        .into_iter()
        .zip(codes)
        .filter(|(_, code)| *code == HOLIDAY_CODE)
        .map(|(day, _)| day)
        .collect();

    info!(year, month, count = holidays.len(), "production calendar fetched");
    Ok(holidays)
}

/// Parse a manual `YYYY-MM-DD,YYYY-MM-DD,...` holiday list.
///
/// Dates outside the requested month are skipped with a warning; malformed
/// dates are an error.
pub fn parse_manual_holidays(
    raw: &str,
    year: i32,
    month: u32,
) -> Result<BTreeSet<NaiveDate>, CalendarError> {
    let mut holidays = BTreeSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day = NaiveDate::parse_from_str(part, "%Y-%m-%d")
            .map_err(|_| CalendarError::BadDate(part.to_string()))?;
        if day.year() != year || day.month() != month {
            warn!(date = part, "holiday outside the requested month skipped");
            continue;
        }
        holidays.insert(day);
    }
    Ok(holidays)
}

/// Fallback calendar: Saturdays and Sundays only.
pub fn weekends_only(year: i32, month: u32) -> BTreeSet<NaiveDate> {
    month_days(year, month)
        .into_iter()
        .filter(|d| is_weekend(*d))
        .collect()
}
