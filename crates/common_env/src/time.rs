//! ISO-8601 date/time kinds.
//!
//! | kind             | type                      | accepted text                                       |
//! |------------------|---------------------------|-----------------------------------------------------|
//! | `Date`           | [NaiveDate]               | `2023-02-08`                                        |
//! | `LocalDateTime`  | [NaiveDateTime]           | `2023-02-08T10:15`, `2023-02-08T10:15:30.123`       |
//! | `OffsetTime`     | [OffsetTime]              | `10:15+01:00`, `10:15:30.5Z`                        |
//! | `OffsetDateTime` | [DateTime]<[FixedOffset]> | `2023-02-08T10:15:30+01:00`                         |
//! | `ZonedDateTime`  | [ZonedDateTime]           | `2023-02-08T10:15:30+01:00[Europe/Berlin]`          |
//! | `Instant`        | [DateTime]<[Utc]>         | `2023-02-08T09:15:30Z`, any offset is normalised    |
//!
//! Seconds and fractions of a second are optional everywhere, fractions keep nanosecond precision.
//! Every field is zero-padded, the `T` and `Z` designators may be lowercase.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use common_errors::ConversionError;

use crate::{kind::EnvKind, value::EnvValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_SHAPE: &str = "dddd-dd-dd";
const LOCAL_TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const LOCAL_TIME_SHAPES: &[&str] = &["dd:dd", "dd:dd:dd"];
const MAX_FRACTION_DIGITS: usize = 9;

/// Largest offset accepted, in hours.
const MAX_OFFSET_HOURS: i32 = 18;

#[derive(Debug)]
pub enum Error {
    ChronoParsingError(chrono::ParseError),
    Malformed(String),
    MissingOffset,
    InvalidOffset(String),
    InvalidZone(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ChronoParsingError(err) => write!(f, "Date/time parsing error: {err}"),
            Error::Malformed(s) => write!(f, "Not an ISO-8601 value: '{s}'"),
            Error::MissingOffset => write!(f, "Offset is required: 'Z' or '+HH:MM'"),
            Error::InvalidOffset(offset) => write!(f, "Invalid offset: '{offset}'"),
            Error::InvalidZone(zone) => write!(f, "Unknown zone id: '{zone}'"),
        }
    }
}

impl std::error::Error for Error {}

impl From<chrono::ParseError> for Error {
    fn from(value: chrono::ParseError) -> Self {
        Error::ChronoParsingError(value)
    }
}

/// Time of day with a fixed offset from UTC, e.g. `10:15:30+01:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }
}

impl FromStr for OffsetTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (local, offset) = split_offset(s, 0)?;
        Ok(Self {
            time: parse_local_time(local)?,
            offset,
        })
    }
}

impl Display for OffsetTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_time(f, &self.time)?;
        write_offset(f, &self.offset)
    }
}

/// Date-time with an offset and an optional region zone,
/// e.g. `2023-02-08T10:15:30+01:00[Europe/Berlin]`.
///
/// With a zone the instant is kept and expressed with the offset the zone has at that
/// instant: `2023-06-08T10:15:30+01:00[Europe/Berlin]` becomes `11:15:30+02:00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedDateTime {
    pub date_time: DateTime<FixedOffset>,
    pub zone: Option<Tz>,
}

impl ZonedDateTime {
    pub fn new(date_time: DateTime<FixedOffset>, zone: Option<Tz>) -> Self {
        let date_time = match zone {
            Some(zone) => date_time.with_timezone(&zone).fixed_offset(),
            None => date_time,
        };
        Self { date_time, zone }
    }
}

impl FromStr for ZonedDateTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_time, zone) = match s.strip_suffix(']').and_then(|it| it.split_once('[')) {
            Some((date_time, zone)) => {
                let tz = zone
                    .parse::<Tz>()
                    .map_err(|_| Error::InvalidZone(zone.to_owned()))?;
                (date_time, Some(tz))
            }
            None => (s, None),
        };
        Ok(Self::new(parse_offset_date_time(date_time)?, zone))
    }
}

impl Display for ZonedDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}T", self.date_time.date_naive().format(DATE_FORMAT))?;
        write_time(f, &self.date_time.time())?;
        write_offset(f, self.date_time.offset())?;
        if let Some(zone) = &self.zone {
            write!(f, "[{}]", zone.name())?;
        }
        Ok(())
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    check_shape(s, &[DATE_SHAPE])?;
    Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)?)
}

pub fn parse_local_date_time(s: &str) -> Result<NaiveDateTime, Error> {
    let (date, time) = s
        .split_once(is_time_designator)
        .ok_or_else(|| Error::Malformed(s.to_owned()))?;
    Ok(parse_date(date)?.and_time(parse_local_time(time)?))
}

pub fn parse_offset_date_time(s: &str) -> Result<DateTime<FixedOffset>, Error> {
    // the offset search starts after the date part, its '-' separators are not offset signs
    let time_start = s.find(is_time_designator).unwrap_or(0);
    let (local, offset) = split_offset(s, time_start)?;
    let local = parse_local_date_time(local)?;
    local
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| Error::InvalidOffset(offset.to_string()))
}

pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, Error> {
    parse_offset_date_time(s).map(|it| it.with_timezone(&Utc))
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.f` with 1 to 9 fraction digits. No leap seconds.
fn parse_local_time(s: &str) -> Result<NaiveTime, Error> {
    let malformed = || Error::Malformed(s.to_owned());
    match s.split_once('.') {
        Some((whole, fraction)) => {
            check_shape(whole, &LOCAL_TIME_SHAPES[1..])?;
            let digits = fraction.bytes().all(|b| b.is_ascii_digit());
            if !digits || !(1..=MAX_FRACTION_DIGITS).contains(&fraction.len()) {
                return Err(malformed());
            }
        }
        None => check_shape(s, LOCAL_TIME_SHAPES)?,
    }
    let time = parse_first(s, LOCAL_TIME_FORMATS, NaiveTime::parse_from_str)?;
    // chrono keeps a leap second as a nanosecond value of one second or more
    if time.nanosecond() >= 1_000_000_000 {
        return Err(malformed());
    }
    Ok(time)
}

/// Tries each format in order, reports the error of the last one.
fn parse_first<T>(
    s: &str,
    formats: &[&str],
    parse: fn(&str, &str) -> chrono::ParseResult<T>,
) -> Result<T, Error> {
    formats
        .iter()
        .skip(1)
        .fold(parse(s, formats[0]), |result, format| {
            result.or_else(|_| parse(s, format))
        })
        .map_err(Error::from)
}

/// Checks `s` against the shapes, where `d` stands for an ASCII digit
/// and any other character for itself.
fn check_shape(s: &str, shapes: &[&str]) -> Result<(), Error> {
    let fits = |shape: &&str| {
        s.len() == shape.len()
            && s.bytes().zip(shape.bytes()).all(|(c, expected)| match expected {
                b'd' => c.is_ascii_digit(),
                _ => c == expected,
            })
    };
    if shapes.iter().any(fits) {
        Ok(())
    } else {
        Err(Error::Malformed(s.to_owned()))
    }
}

fn is_time_designator(c: char) -> bool {
    c == 'T' || c == 't'
}

fn is_utc_designator(c: char) -> bool {
    c == 'Z' || c == 'z'
}

/// Split `s` into the local part and the trailing offset (`Z` or `±HH:MM[:SS]`).
fn split_offset(s: &str, search_from: usize) -> Result<(&str, FixedOffset), Error> {
    if let Some(local) = s.strip_suffix(is_utc_designator) {
        return Ok((local, FixedOffset::east_opt(0).ok_or(Error::MissingOffset)?));
    }
    let sign_position = s[search_from..]
        .rfind(|c: char| c == '+' || c == '-')
        .map(|it| it + search_from)
        .ok_or(Error::MissingOffset)?;
    let offset = parse_offset(&s[sign_position..])?;
    Ok((&s[..sign_position], offset))
}

fn parse_offset(s: &str) -> Result<FixedOffset, Error> {
    let invalid = || Error::InvalidOffset(s.to_owned());
    let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    let parts = rest
        .split(':')
        .map(parse_two_digits)
        .collect::<Option<Vec<i32>>>()
        .ok_or_else(invalid)?;
    let (hours, minutes, seconds) = match parts[..] {
        [hours, minutes] => (hours, minutes, 0),
        [hours, minutes, seconds] => (hours, minutes, seconds),
        _ => return Err(invalid()),
    };
    if hours > MAX_OFFSET_HOURS || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    let total = hours * 3600 + minutes * 60 + seconds;
    if total > MAX_OFFSET_HOURS * 3600 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * total).ok_or_else(invalid)
}

fn parse_two_digits(s: &str) -> Option<i32> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff` with 3, 6 or 9 fraction digits.
fn write_time(f: &mut std::fmt::Formatter<'_>, time: &NaiveTime) -> std::fmt::Result {
    if time.second() == 0 && time.nanosecond() == 0 {
        write!(f, "{}", time.format("%H:%M"))
    } else {
        write!(f, "{}", time.format("%H:%M:%S%.f"))
    }
}

fn write_offset(f: &mut std::fmt::Formatter<'_>, offset: &FixedOffset) -> std::fmt::Result {
    if offset.local_minus_utc() == 0 {
        write!(f, "Z")
    } else {
        write!(f, "{offset}")
    }
}

macro_rules! impl_env_value_for_time {
    ($($ty:ty => $kind:ident, $parse:expr);* $(;)?) => {
        $(
            impl EnvValue for $ty {
                const KIND: EnvKind = EnvKind::$kind;

                fn convert(raw: &str) -> Result<Self, ConversionError> {
                    $parse(raw).map_err(|e| ConversionError::malformed(Self::KIND.name(), e))
                }
            }
        )*
    };
}

impl_env_value_for_time!(
    NaiveDate => Date, parse_date;
    NaiveDateTime => LocalDateTime, parse_local_date_time;
    OffsetTime => OffsetTime, OffsetTime::from_str;
    DateTime<FixedOffset> => OffsetDateTime, parse_offset_date_time;
    ZonedDateTime => ZonedDateTime, ZonedDateTime::from_str;
    DateTime<Utc> => Instant, parse_instant;
);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{
        DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
        TimeZone, Utc,
    };

    use chrono_tz::{America, Europe};

    use super::{
        parse_date, parse_instant, parse_local_date_time, parse_offset_date_time, OffsetTime,
        ZonedDateTime,
    };

    fn offset_hours(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    fn date_time(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, nano: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_nano_opt(h, min, s, nano)
            .unwrap()
    }

    #[test]
    fn date_valid() {
        assert_eq!(
            parse_date("2023-02-08").unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 8).unwrap()
        );
    }

    #[test]
    fn date_invalid() {
        assert!(parse_date("2023-02-30").is_err());
        assert!(parse_date("08.02.2023").is_err());
        assert!(parse_date("2023-02-08T10:00").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("2023-2-8").is_err());
        assert!(parse_date("2023-02-8").is_err());
        assert!(parse_date(" 2023-02-08").is_err());
    }

    #[test]
    fn date_round_trip_today() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(&today.to_string()).unwrap(), today);
    }

    #[test]
    fn local_date_time_optional_seconds() {
        assert_eq!(
            parse_local_date_time("2023-02-08T10:15").unwrap(),
            date_time(2023, 2, 8, 10, 15, 0, 0)
        );
        assert_eq!(
            parse_local_date_time("2023-02-08T10:15:30").unwrap(),
            date_time(2023, 2, 8, 10, 15, 30, 0)
        );
        assert_eq!(
            parse_local_date_time("2023-02-08T10:15:30.123456789").unwrap(),
            date_time(2023, 2, 8, 10, 15, 30, 123_456_789)
        );
    }

    #[test]
    fn local_date_time_invalid() {
        assert!(parse_local_date_time("2023-02-08 10:15").is_err());
        assert!(parse_local_date_time("2023-02-08T25:00").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15+01:00").is_err());
        assert!(parse_local_date_time("2023-2-8T1:5").is_err());
        assert!(parse_local_date_time("2023-02-08T10:5").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15:3").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15:60").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15:30.1234567891").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15:30.").is_err());
        assert!(parse_local_date_time("2023-02-08T10:15.5").is_err());
    }

    #[test]
    fn local_date_time_lowercase_designator() {
        assert_eq!(
            parse_local_date_time("2023-02-08t10:15").unwrap(),
            date_time(2023, 2, 8, 10, 15, 0, 0)
        );
    }

    #[test]
    fn local_date_time_round_trip_now() {
        let now = Local::now().naive_local();
        let text = now.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        assert_eq!(parse_local_date_time(&text).unwrap(), now);
    }

    #[test]
    fn offset_time_valid() {
        assert_eq!(
            OffsetTime::from_str("10:15+01:00").unwrap(),
            OffsetTime::new(NaiveTime::from_hms_opt(10, 15, 0).unwrap(), offset_hours(1))
        );
        assert_eq!(
            OffsetTime::from_str("10:15:30.5Z").unwrap(),
            OffsetTime::new(
                NaiveTime::from_hms_milli_opt(10, 15, 30, 500).unwrap(),
                offset_hours(0)
            )
        );
        assert_eq!(
            OffsetTime::from_str("23:59:59-05:30").unwrap().offset,
            FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()
        );
    }

    #[test]
    fn offset_time_invalid() {
        assert!(OffsetTime::from_str("10:15").is_err());
        assert!(OffsetTime::from_str("10:15+1:00").is_err());
        assert!(OffsetTime::from_str("10:15+19:00").is_err());
        assert!(OffsetTime::from_str("10:15+01").is_err());
        assert!(OffsetTime::from_str("+01:00").is_err());
        assert!(OffsetTime::from_str("23:59:60Z").is_err());
        assert!(OffsetTime::from_str("1:05Z").is_err());
        assert!(OffsetTime::from_str("10:15:30.1234567891Z").is_err());
    }

    #[test]
    fn offset_time_lowercase_utc() {
        assert_eq!(
            OffsetTime::from_str("10:15z").unwrap(),
            OffsetTime::from_str("10:15Z").unwrap()
        );
    }

    #[test]
    fn offset_time_display_round_trip() {
        let values = [
            OffsetTime::new(NaiveTime::from_hms_opt(10, 15, 0).unwrap(), offset_hours(2)),
            OffsetTime::new(
                NaiveTime::from_hms_nano_opt(0, 0, 1, 1).unwrap(),
                offset_hours(0),
            ),
            OffsetTime::new(
                NaiveTime::from_hms_micro_opt(12, 30, 45, 123_456).unwrap(),
                offset_hours(-8),
            ),
        ];
        for value in values {
            assert_eq!(OffsetTime::from_str(&value.to_string()).unwrap(), value);
        }
        assert_eq!(values[0].to_string(), "10:15+02:00");
        assert_eq!(values[1].to_string(), "00:00:01.000000001Z");
    }

    #[test]
    fn offset_date_time_valid() {
        let expected = offset_hours(1)
            .from_local_datetime(&date_time(2023, 2, 8, 10, 15, 30, 0))
            .unwrap();
        assert_eq!(
            parse_offset_date_time("2023-02-08T10:15:30+01:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_offset_date_time("2023-02-08T09:15:30Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_offset_date_time("2023-02-08T10:15+01:00")
                .unwrap()
                .offset()
                .local_minus_utc(),
            3600
        );
    }

    #[test]
    fn offset_date_time_invalid() {
        assert!(parse_offset_date_time("2023-02-08T10:15:30").is_err());
        assert!(parse_offset_date_time("2023-02-08").is_err());
        assert!(parse_offset_date_time("2023-02-08T10:15:30+0100").is_err());
        assert!(parse_offset_date_time("yesterday").is_err());
        assert!(parse_offset_date_time("2023-02-08T10:15:60+01:00").is_err());
        assert!(parse_offset_date_time("2023-2-08T10:15:30Z").is_err());
    }

    #[test]
    fn offset_date_time_lowercase_designators() {
        assert_eq!(
            parse_offset_date_time("2023-02-08t09:15:30z").unwrap(),
            parse_offset_date_time("2023-02-08T09:15:30Z").unwrap()
        );
    }

    #[test]
    fn offset_date_time_round_trip_now() {
        let now = Local::now().fixed_offset();
        let text = now.to_rfc3339_opts(SecondsFormat::Nanos, false);
        let parsed = parse_offset_date_time(&text).unwrap();
        assert_eq!(parsed, now);
        assert_eq!(parsed.offset(), now.offset());
    }

    #[test]
    fn zoned_date_time_with_zone() {
        let parsed =
            ZonedDateTime::from_str("2023-02-08T10:15:30+01:00[Europe/Berlin]").unwrap();
        assert_eq!(parsed.zone, Some(Europe::Berlin));
        assert_eq!(
            parsed.date_time,
            parse_offset_date_time("2023-02-08T10:15:30+01:00").unwrap()
        );
        assert_eq!(parsed.date_time.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn zoned_date_time_offset_follows_zone() {
        let parsed =
            ZonedDateTime::from_str("2023-06-08T10:15:30+01:00[Europe/Berlin]").unwrap();
        assert_eq!(
            parsed.date_time,
            parse_offset_date_time("2023-06-08T10:15:30+01:00").unwrap()
        );
        assert_eq!(parsed.date_time.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(
            parsed.date_time.time(),
            NaiveTime::from_hms_opt(11, 15, 30).unwrap()
        );
        assert_eq!(parsed.to_string(), "2023-06-08T11:15:30+02:00[Europe/Berlin]");
    }

    #[test]
    fn zoned_date_time_without_zone() {
        let parsed = ZonedDateTime::from_str("2023-02-08T10:15:30Z").unwrap();
        assert_eq!(parsed.zone, None);
    }

    #[test]
    fn zoned_date_time_invalid() {
        assert!(ZonedDateTime::from_str("2023-02-08T10:15:30+01:00[]").is_err());
        assert!(ZonedDateTime::from_str("2023-02-08T10:15:30+01:00[Europe Berlin]").is_err());
        assert!(ZonedDateTime::from_str("2023-02-08T10:15:30[Europe/Berlin]").is_err());
        assert!(ZonedDateTime::from_str("2023-02-08T10:15:30+01:00[Nowhere/Fake]").is_err());
        assert!(ZonedDateTime::from_str("2023-02-08T10:15:30+01:00[Europe/Berlin").is_err());
    }

    #[test]
    fn zoned_date_time_display_round_trip() {
        let value = ZonedDateTime::new(
            Local::now().fixed_offset(),
            Some(America::Argentina::Buenos_Aires),
        );
        assert_eq!(ZonedDateTime::from_str(&value.to_string()).unwrap(), value);
    }

    #[test]
    fn instant_normalised_to_utc() {
        let expected: DateTime<Utc> = Utc
            .from_local_datetime(&date_time(2023, 2, 8, 9, 15, 30, 0))
            .unwrap();
        assert_eq!(parse_instant("2023-02-08T09:15:30Z").unwrap(), expected);
        assert_eq!(parse_instant("2023-02-08T10:15:30+01:00").unwrap(), expected);
    }

    #[test]
    fn instant_round_trip_now() {
        let now = Utc::now();
        let text = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
        assert_eq!(parse_instant(&text).unwrap(), now);
    }
}
