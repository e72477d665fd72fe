//! Date filters available to every template.
//!
//! - `ms_date`: ISO-8601 string → epoch milliseconds
//! - `ns_date`: ISO-8601 string → epoch milliseconds × 1 000 000
//!
//! Output depends only on the input string; nothing reads the clock.

use minijinja::{Error, ErrorKind};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Parse an ISO-8601 timestamp into epoch milliseconds.
///
/// Accepts RFC 3339, date-times without an offset (taken as UTC) and bare
/// dates (midnight UTC).
pub fn epoch_millis(input: &str) -> Option<i128> {
    let input = input.trim();

    let instant = OffsetDateTime::parse(input, &Rfc3339)
        .or_else(|_| {
            PrimitiveDateTime::parse(
                input,
                format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
                ),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| {
            Date::parse(input, format_description!("[year]-[month]-[day]"))
                .map(|date| date.midnight().assume_utc())
        })
        .ok()?;

    Some(instant.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI))
}

fn parse_or_fail(value: &str) -> Result<i128, Error> {
    epoch_millis(value).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("'{value}' is not an ISO-8601 date"),
        )
    })
}

/// `{{ value | ms_date }}`
pub fn ms_date(value: &str) -> Result<String, Error> {
    parse_or_fail(value).map(|ms| ms.to_string())
}

/// `{{ value | ns_date }}`
pub fn ns_date(value: &str) -> Result<String, Error> {
    parse_or_fail(value).map(|ms| (ms * NANOS_PER_MILLI).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        assert_eq!(ms_date("2020-01-01T00:00:00Z").unwrap(), "1577836800000");
        assert_eq!(ms_date("2020-01-01T00:00:00.250Z").unwrap(), "1577836800250");
        assert_eq!(ms_date("2020-01-01T02:00:00+02:00").unwrap(), "1577836800000");
    }

    #[test]
    fn test_date_only_and_naive() {
        assert_eq!(ms_date("2020-01-01").unwrap(), "1577836800000");
        assert_eq!(ms_date("2020-01-01T00:00:01").unwrap(), "1577836801000");
    }

    #[test]
    fn test_ns_is_millis_scaled() {
        assert_eq!(
            ns_date("2020-01-01T00:00:00.250Z").unwrap(),
            "1577836800250000000"
        );
    }

    #[test]
    fn test_before_epoch() {
        assert_eq!(ms_date("1969-12-31T23:59:59.999Z").unwrap(), "-1");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(ms_date("yesterday").is_err());
        assert!(ns_date("null").is_err());
    }
}
