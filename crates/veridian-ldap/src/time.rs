//! Directory timestamp codecs
//!
//! Conversions between generalized-time strings (`YYYYMMDDHHMMSS[.fff]Z`),
//! the Windows file-time integer encoding (100-nanosecond ticks since
//! 1601-01-01T00:00:00Z, used by Active Directory attributes such as
//! pwdLastSet and accountExpires), and epoch milliseconds.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::error::{LdapValueError, LdapValueResult};

/// 100-nanosecond ticks between 1601-01-01T00:00:00Z and the Unix epoch.
pub const WINDOWS_EPOCH_OFFSET: i64 = 116_444_736_000_000_000;

const TICKS_PER_MILLI: i64 = 10_000;

/// Render an epoch-millisecond instant as a generalized-time string.
///
/// With `with_fraction` the millisecond group is always emitted
/// (`20230615120000.000Z`); without it, sub-second precision is dropped
/// before emission, so a subsequent decode yields the instant rounded down
/// to the whole second. Directories without sub-second support are queried
/// with the truncated form.
///
/// Instants outside years 0000-9999 cannot be expressed in the four-digit
/// year grammar and fail with [`LdapValueError::TimestampRange`].
pub fn encode_generalized_time(millis: i64, with_fraction: bool) -> LdapValueResult<String> {
    let utc = millis_to_datetime(millis)?;
    encode_generalized_time_utc(&utc, with_fraction)
}

/// Render a UTC instant as a generalized-time string.
pub fn encode_generalized_time_utc(
    utc: &DateTime<Utc>,
    with_fraction: bool,
) -> LdapValueResult<String> {
    if !(0..=9999).contains(&utc.year()) {
        return Err(LdapValueError::timestamp_range(
            utc.timestamp_millis().to_string(),
            "instant not expressible with a four-digit year",
        ));
    }
    let base = utc.format("%Y%m%d%H%M%S");
    if with_fraction {
        Ok(format!("{}.{:03}Z", base, utc.timestamp_subsec_millis()))
    } else {
        Ok(format!("{base}Z"))
    }
}

/// Parse a generalized-time string to epoch milliseconds.
///
/// Accepts the full `YYYYMMDDHHMMSS` form with an optional fractional group
/// (`.` or `,` separator; precision beyond milliseconds is dropped) and a
/// `Z` or explicit `±HHMM`/`±HH` offset. Anything else is
/// [`LdapValueError::MalformedTimestamp`].
pub fn decode_generalized_time(text: &str) -> LdapValueResult<i64> {
    decode_generalized_time_utc(text).map(|utc| utc.timestamp_millis())
}

/// Parse a generalized-time string to a UTC instant.
pub fn decode_generalized_time_utc(text: &str) -> LdapValueResult<DateTime<Utc>> {
    let malformed =
        |message: &str| LdapValueError::malformed_timestamp(text, message.to_string());

    let bytes = text.as_bytes();
    if bytes.len() < 15 {
        return Err(malformed("too short for YYYYMMDDHHMMSS with a zone"));
    }

    let year = parse_digits(text, 0, 4)?;
    let month = parse_digits(text, 4, 6)?;
    let day = parse_digits(text, 6, 8)?;
    let hour = parse_digits(text, 8, 10)?;
    let minute = parse_digits(text, 10, 12)?;
    let second = parse_digits(text, 12, 14)?;

    let mut pos = 14;

    // Optional fractional seconds; kept at millisecond granularity.
    let mut millis = 0u32;
    if bytes[pos] == b'.' || bytes[pos] == b',' {
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == frac_start {
            return Err(malformed("fractional separator without digits"));
        }
        let mut scale = 100u32;
        for &digit in &bytes[frac_start..pos.min(frac_start + 3)] {
            millis += u32::from(digit - b'0') * scale;
            scale /= 10;
        }
    }

    // Zone designator: Z, or an explicit offset of hours and optional minutes.
    if pos >= bytes.len() {
        return Err(malformed("missing zone designator"));
    }
    let offset_seconds: i64 = match bytes[pos] {
        b'Z' => {
            pos += 1;
            0
        }
        sign @ (b'+' | b'-') => {
            pos += 1;
            let digits = bytes.len() - pos;
            if digits != 2 && digits != 4 {
                return Err(malformed("offset must be +HHMM or +HH"));
            }
            let hours = parse_digits(text, pos, pos + 2)?;
            let minutes = if digits == 4 {
                parse_digits(text, pos + 2, pos + 4)?
            } else {
                0
            };
            pos = bytes.len();
            if hours > 23 || minutes > 59 {
                return Err(malformed("offset out of range"));
            }
            let magnitude = i64::from(hours) * 3600 + i64::from(minutes) * 60;
            if sign == b'-' {
                -magnitude
            } else {
                magnitude
            }
        }
        _ => return Err(malformed("invalid zone designator")),
    };

    if pos != bytes.len() {
        return Err(malformed("trailing characters after zone designator"));
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| malformed("invalid calendar date"))?;
    let local = date
        .and_hms_milli_opt(hour, minute, second, millis)
        .ok_or_else(|| malformed("invalid time of day"))?;

    let epoch_millis = local.and_utc().timestamp_millis() - offset_seconds * 1000;
    millis_to_datetime(epoch_millis)
}

/// Convert a Windows file-time attribute value to epoch milliseconds.
///
/// `(ticks - WINDOWS_EPOCH_OFFSET) / 10_000` with truncating division: any
/// sub-millisecond tick remainder in the input is discarded and cannot be
/// recovered by [`millis_to_windows_time`].
pub fn windows_time_to_millis(windows_time: &str) -> LdapValueResult<i64> {
    let ticks: i64 = windows_time.trim().parse().map_err(|_| {
        LdapValueError::malformed_timestamp(windows_time, "not a 64-bit integer tick count")
    })?;
    let delta = ticks.checked_sub(WINDOWS_EPOCH_OFFSET).ok_or_else(|| {
        LdapValueError::timestamp_range(windows_time, "tick arithmetic underflow")
    })?;
    Ok(delta / TICKS_PER_MILLI)
}

/// Convert epoch milliseconds to a Windows file-time attribute value.
///
/// `millis * 10_000 + WINDOWS_EPOCH_OFFSET`; overflow of the 64-bit tick
/// count is a defined failure, not wraparound.
pub fn millis_to_windows_time(millis: i64) -> LdapValueResult<String> {
    let ticks = millis
        .checked_mul(TICKS_PER_MILLI)
        .and_then(|ticks| ticks.checked_add(WINDOWS_EPOCH_OFFSET))
        .ok_or_else(|| {
            LdapValueError::timestamp_range(millis.to_string(), "tick arithmetic overflow")
        })?;
    Ok(ticks.to_string())
}

/// Convert a Windows file-time attribute value to a UTC instant.
pub fn windows_time_to_datetime(windows_time: &str) -> LdapValueResult<DateTime<Utc>> {
    millis_to_datetime(windows_time_to_millis(windows_time)?)
}

/// Convert a UTC instant to a Windows file-time attribute value.
pub fn datetime_to_windows_time(utc: &DateTime<Utc>) -> LdapValueResult<String> {
    millis_to_windows_time(utc.timestamp_millis())
}

fn millis_to_datetime(millis: i64) -> LdapValueResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        LdapValueError::timestamp_range(millis.to_string(), "epoch milliseconds out of range")
    })
}

fn parse_digits(text: &str, start: usize, end: usize) -> LdapValueResult<u32> {
    let slice = &text.as_bytes()[start..end];
    if !slice.iter().all(u8::is_ascii_digit) {
        return Err(LdapValueError::malformed_timestamp(
            text,
            format!("non-digit characters at positions {start}..{end}"),
        ));
    }
    // all-digit, at most 4 bytes: cannot fail or overflow
    Ok(text[start..end].parse().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-06-15T12:00:00Z
    const JUNE_15_2023_NOON: i64 = 1_686_830_400_000;

    #[test]
    fn test_decode_without_fraction() {
        assert_eq!(
            decode_generalized_time("20230615120000Z").unwrap(),
            JUNE_15_2023_NOON
        );
    }

    #[test]
    fn test_encode_without_fraction() {
        assert_eq!(
            encode_generalized_time(JUNE_15_2023_NOON, false).unwrap(),
            "20230615120000Z"
        );
    }

    #[test]
    fn test_encode_with_fraction() {
        assert_eq!(
            encode_generalized_time(JUNE_15_2023_NOON + 123, true).unwrap(),
            "20230615120000.123Z"
        );
        assert_eq!(
            encode_generalized_time(JUNE_15_2023_NOON, true).unwrap(),
            "20230615120000.000Z"
        );
    }

    #[test]
    fn test_round_trip_with_fraction_is_exact() {
        for millis in [0, JUNE_15_2023_NOON + 987, -1, 1_700_000_000_123] {
            let text = encode_generalized_time(millis, true).unwrap();
            assert_eq!(decode_generalized_time(&text).unwrap(), millis, "{text}");
        }
    }

    #[test]
    fn test_round_trip_without_fraction_rounds_down() {
        let millis = JUNE_15_2023_NOON + 987;
        let text = encode_generalized_time(millis, false).unwrap();
        assert_eq!(decode_generalized_time(&text).unwrap(), JUNE_15_2023_NOON);

        // rounding is downward also before the epoch
        let text = encode_generalized_time(-1, false).unwrap();
        assert_eq!(decode_generalized_time(&text).unwrap(), -1000);
    }

    #[test]
    fn test_decode_fraction_variants() {
        assert_eq!(
            decode_generalized_time("20230615120000.5Z").unwrap(),
            JUNE_15_2023_NOON + 500
        );
        assert_eq!(
            decode_generalized_time("20230615120000,25Z").unwrap(),
            JUNE_15_2023_NOON + 250
        );
        // precision beyond milliseconds is dropped
        assert_eq!(
            decode_generalized_time("20230615120000.12345Z").unwrap(),
            JUNE_15_2023_NOON + 123
        );
    }

    #[test]
    fn test_decode_explicit_offset() {
        assert_eq!(
            decode_generalized_time("20230615140000+0200").unwrap(),
            JUNE_15_2023_NOON
        );
        assert_eq!(
            decode_generalized_time("20230615070000-0500").unwrap(),
            JUNE_15_2023_NOON
        );
        assert_eq!(
            decode_generalized_time("20230615140000+02").unwrap(),
            JUNE_15_2023_NOON
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for text in [
            "",
            "2023",
            "20230615120000",
            "2023061512000xZ",
            "20230615120000.Z",
            "20230615120000X",
            "20231315120000Z",
            "20230615126000Z",
            "20230615120000+2",
            "20230615120000+2500",
            "20230615120000Zjunk",
        ] {
            let err = decode_generalized_time(text).unwrap_err();
            assert_eq!(err.error_code(), "MALFORMED_TIMESTAMP", "input {text:?}");
        }
    }

    #[test]
    fn test_encode_rejects_unrepresentable_year() {
        // year 10000 and beyond does not fit the four-digit grammar
        let err = encode_generalized_time(260_000_000_000_000, false).unwrap_err();
        assert_eq!(err.error_code(), "TIMESTAMP_RANGE");
    }

    #[test]
    fn test_windows_epoch_mapping() {
        assert_eq!(
            millis_to_windows_time(0).unwrap(),
            "116444736000000000"
        );
        assert_eq!(windows_time_to_millis("116444736000000000").unwrap(), 0);
    }

    #[test]
    fn test_windows_round_trip_at_millisecond_granularity() {
        let millis = 1_700_000_000_123;
        let ticks = millis_to_windows_time(millis).unwrap();
        assert_eq!(windows_time_to_millis(&ticks).unwrap(), millis);
    }

    #[test]
    fn test_windows_sub_millisecond_remainder_is_discarded() {
        // 7 ticks below one millisecond are dropped by the forward conversion
        let millis = windows_time_to_millis("116444736000010007").unwrap();
        assert_eq!(millis, 1);
        assert_eq!(millis_to_windows_time(millis).unwrap(), "116444736000010000");
    }

    #[test]
    fn test_windows_time_rejects_garbage() {
        let err = windows_time_to_millis("not-a-number").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_TIMESTAMP");
    }

    #[test]
    fn test_windows_time_overflow_is_defined_failure() {
        let err = millis_to_windows_time(i64::MAX).unwrap_err();
        assert_eq!(err.error_code(), "TIMESTAMP_RANGE");

        let err = windows_time_to_millis(&i64::MIN.to_string()).unwrap_err();
        assert_eq!(err.error_code(), "TIMESTAMP_RANGE");
    }

    #[test]
    fn test_windows_time_datetime_conveniences() {
        let utc = windows_time_to_datetime("116444736000000000").unwrap();
        assert_eq!(utc.timestamp_millis(), 0);
        assert_eq!(
            datetime_to_windows_time(&utc).unwrap(),
            "116444736000000000"
        );
    }
}
