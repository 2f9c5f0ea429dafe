//! Lenient date parsing for values typed by officers.
//!
//! Accepted shapes:
//!
//! | Input | Example |
//! |-------|---------|
//! | dashed date | `2018-2-6` |
//! | dashed date and time | `2018-2-6 14:05`, `2018-02-06T14:05:09.123` |
//! | slashed date | `2/6/2018` |
//! | slashed date and time | `2/6/2018 2:05` |
//! | RFC 3339 | `2018-02-06T14:05:09-05:00` |
//!
//! Naive values are taken to be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};

fn invalid(input: &str) -> AppError {
    AppError::Validation(format!("Incorrectly formatted date string: '{}'", input))
}

/// Parse `M/D/YYYY` into a date. An empty string is `None`.
pub fn convert_slash_date_to_iso(date_string: &str) -> Result<Option<NaiveDate>> {
    let trimmed = date_string.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return Err(invalid(date_string));
    };

    let (year, month, day) = (
        year.parse::<i32>().map_err(|_| invalid(date_string))?,
        month.parse::<u32>().map_err(|_| invalid(date_string))?,
        day.parse::<u32>().map_err(|_| invalid(date_string))?,
    );

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| invalid(date_string))
}

fn parse_dashed_date(input: &str, original: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = input.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(invalid(original));
    };

    let (year, month, day) = (
        year.parse::<i32>().map_err(|_| invalid(original))?,
        month.parse::<u32>().map_err(|_| invalid(original))?,
        day.parse::<u32>().map_err(|_| invalid(original))?,
    );

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(original))
}

/// Parse `H:M`, `H:M:S` or `H:M:S.fff`
fn parse_time(input: &str, original: &str) -> Result<NaiveTime> {
    let (clock, fraction) = match input.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (input, None),
    };

    let parts = clock
        .split(':')
        .map(|p| p.parse::<u32>().map_err(|_| invalid(original)))
        .collect::<Result<Vec<u32>>>()?;

    let nanos = match fraction {
        Some(digits) if !digits.is_empty() && digits.len() <= 9 => {
            let value = digits.parse::<u32>().map_err(|_| invalid(original))?;
            value * 10u32.pow(9 - digits.len() as u32)
        }
        Some(_) => return Err(invalid(original)),
        None => 0,
    };

    let time = match parts.as_slice() {
        [hour, minute] if fraction.is_none() => NaiveTime::from_hms_opt(*hour, *minute, 0),
        [hour, minute, second] => NaiveTime::from_hms_nano_opt(*hour, *minute, *second, nanos),
        _ => None,
    };

    time.ok_or_else(|| invalid(original))
}

/// Parse a date string with an optional time. Midnight is used when the time is omitted.
pub fn parse_date_string(date_string: &str) -> Result<Option<NaiveDateTime>> {
    let trimmed = date_string.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.naive_utc()));
    }

    let normalized = trimmed.replacen('T', " ", 1);
    let mut pieces = normalized.split_whitespace();
    let date_part = pieces.next().ok_or_else(|| invalid(date_string))?;
    let time_part = pieces.next();
    if pieces.next().is_some() {
        return Err(invalid(date_string));
    }

    let date = if date_part.contains('/') {
        convert_slash_date_to_iso(date_part)?.ok_or_else(|| invalid(date_string))?
    } else {
        parse_dashed_date(date_part, date_string)?
    };

    let time = match time_part {
        Some(t) => parse_time(t, date_string)?,
        None => NaiveTime::MIN,
    };

    Ok(Some(date.and_time(time)))
}

/// Parse a date-only value, discarding any time component
pub fn parse_date(date_string: &str) -> Result<Option<NaiveDate>> {
    Ok(parse_date_string(date_string)?.map(|dt| dt.date()))
}

pub fn make_aware(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// A datetime as sent by API clients: either a single string, or the
/// separate date and time inputs of the web form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DateTimeInput {
    Text(String),
    Parts {
        date: String,
        #[serde(default)]
        time: Option<String>,
    },
}

impl DateTimeInput {
    /// Resolve to a UTC timestamp; blank input is `None`
    pub fn resolve(&self) -> Result<Option<DateTime<Utc>>> {
        let naive = match self {
            DateTimeInput::Text(text) => parse_date_string(text)?,
            DateTimeInput::Parts { date, time } => {
                let time = time.as_deref().map(str::trim).unwrap_or("");
                if time.is_empty() {
                    parse_date_string(date)?
                } else {
                    parse_date_string(&format!("{} {}", date.trim(), time))?
                }
            }
        };
        Ok(naive.map(make_aware))
    }
}

impl From<DateTime<Utc>> for DateTimeInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateTimeInput::Text(value.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_dashed_date_no_time() {
        assert_eq!(
            parse_date_string("2018-2-6").unwrap(),
            Some(ymd_hm(2018, 2, 6, 0, 0))
        );
    }

    #[test]
    fn test_slashed_date_no_time() {
        assert_eq!(
            parse_date_string("12/25/1999").unwrap(),
            Some(ymd_hm(1999, 12, 25, 0, 0))
        );
    }

    #[test]
    fn test_dashed_date_with_time() {
        assert_eq!(
            parse_date_string("2018-2-6 7:5").unwrap(),
            Some(ymd_hm(2018, 2, 6, 7, 5))
        );
        assert_eq!(
            parse_date_string("2018-02-06T14:05:09").unwrap().unwrap().second(),
            9
        );
    }

    #[test]
    fn test_fractional_seconds() {
        let parsed = parse_date_string("2018-02-06T14:05:09.123").unwrap().unwrap();
        assert_eq!(parsed.second(), 9);
        assert_eq!(parsed.nanosecond(), 123_000_000);
        assert!(parse_date_string("2018-02-06 14:05:09.").is_err());
        assert!(parse_date_string("2018-02-06 14:05.5").is_err());
    }

    #[test]
    fn test_slashed_date_with_time() {
        assert_eq!(
            parse_date_string("2/6/2018 23:59").unwrap(),
            Some(ymd_hm(2018, 2, 6, 23, 59))
        );
    }

    #[test]
    fn test_rfc3339_is_converted_to_utc() {
        let parsed = parse_date_string("2018-02-06T20:00:00-05:00")
            .unwrap()
            .unwrap();
        assert_eq!(parsed, ymd_hm(2018, 2, 7, 1, 0));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(parse_date_string("").unwrap(), None);
        assert_eq!(parse_date_string("   ").unwrap(), None);
        assert_eq!(convert_slash_date_to_iso("").unwrap(), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_date_string("yesterday").is_err());
        assert!(parse_date_string("2018-13-01").is_err());
        assert!(parse_date_string("2/30/2018").is_err());
        assert!(parse_date_string("2018-2-6 25:00").is_err());
        assert!(convert_slash_date_to_iso("2018-02-06").is_err());
    }

    #[test]
    fn test_convert_slash_date_to_iso() {
        let date = convert_slash_date_to_iso("2/6/2018").unwrap().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2018, 2, 6));
    }

    #[test]
    fn test_datetime_input_shapes() {
        let text: DateTimeInput = serde_json::from_str("\"2018-02-06 10:30\"").unwrap();
        let parts: DateTimeInput =
            serde_json::from_str(r#"{"date": "2/6/2018", "time": "10:30"}"#).unwrap();
        let date_only: DateTimeInput = serde_json::from_str(r#"{"date": "2/6/2018"}"#).unwrap();

        let expected = make_aware(ymd_hm(2018, 2, 6, 10, 30));
        assert_eq!(text.resolve().unwrap(), Some(expected));
        assert_eq!(parts.resolve().unwrap(), Some(expected));
        assert_eq!(
            date_only.resolve().unwrap(),
            Some(make_aware(ymd_hm(2018, 2, 6, 0, 0)))
        );
    }
}
