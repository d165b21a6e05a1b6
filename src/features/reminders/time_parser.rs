//! Relative interval and absolute clock-time parsing
//!
//! Intervals are sequences of `<number> <unit>` pairs ("2 days 3 hours",
//! "2h30m", "1 hour and 5 mins"); clock times are 24-hour `HH:MM` with an
//! optional `±HH:MM` offset ("18:00-3:00" is 18:00 at UTC-3).
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Calendar arithmetic for months and years
//! - 1.1.0: Accept glued forms like `1h30m`
//! - 1.0.0: Initial release

use chrono::{DateTime, Duration, FixedOffset, Months, TimeZone, Utc};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Time unit accepted in an interval clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    /// Resolve a unit word or abbreviation (case-insensitive)
    pub fn from_alias(word: &str) -> Option<Unit> {
        let unit = match word.to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Unit::Second,
            "m" | "min" | "mins" | "minute" | "minutes" => Unit::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => Unit::Hour,
            "d" | "day" | "days" => Unit::Day,
            "w" | "wk" | "wks" | "week" | "weeks" => Unit::Week,
            "mo" | "mos" | "month" | "months" => Unit::Month,
            "y" | "yr" | "yrs" | "year" | "years" => Unit::Year,
            _ => return None,
        };
        Some(unit)
    }

    fn name(self) -> &'static str {
        match self {
            Unit::Second => "second",
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::Day => "day",
            Unit::Week => "week",
            Unit::Month => "month",
            Unit::Year => "year",
        }
    }
}

/// A parsed relative interval, e.g. `2 days 3 hours`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    parts: Vec<(u32, Unit)>,
}

impl Interval {
    /// Add the interval to `from`; None on overflow
    pub fn apply(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut at = from;
        for &(amount, unit) in &self.parts {
            let amount_i64 = i64::from(amount);
            at = match unit {
                Unit::Second => at.checked_add_signed(Duration::try_seconds(amount_i64)?)?,
                Unit::Minute => at.checked_add_signed(Duration::try_minutes(amount_i64)?)?,
                Unit::Hour => at.checked_add_signed(Duration::try_hours(amount_i64)?)?,
                Unit::Day => at.checked_add_signed(Duration::try_days(amount_i64)?)?,
                Unit::Week => at.checked_add_signed(Duration::try_weeks(amount_i64)?)?,
                Unit::Month => at.checked_add_months(Months::new(amount))?,
                Unit::Year => at.checked_add_months(Months::new(amount.checked_mul(12)?))?,
            };
        }
        Some(at)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|(amount, unit)| {
                let plural = if *amount == 1 { "" } else { "s" };
                format!("{amount} {}{plural}", unit.name())
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// A validated `HH:MM[±HH:MM]` clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    /// Offset east of UTC in seconds
    pub offset_seconds: i32,
}

impl ClockTime {
    /// Next occurrence is not computed: the clock time always refers to today
    /// in its own zone, which may already be past.
    pub fn on_day_of(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let zone = FixedOffset::east_opt(self.offset_seconds)?;
        let local_date = now.with_timezone(&zone).date_naive();
        let local = local_date.and_hms_opt(self.hour, self.minute, 0)?;
        let at = zone.from_local_datetime(&local).single()?;
        Some(at.with_timezone(&Utc))
    }
}

/// Outcome of resolving an expression against a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueTime {
    Future(DateTime<Utc>),
    /// At or before the reference instant
    Past(DateTime<Utc>),
}

fn glued_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:\d+[a-z]+)+$").expect("valid glued interval regex"))
}

fn glued_pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)([a-z]+)").expect("valid glued pair regex"))
}

fn clock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<h>[01]?\d|2[0-3]):(?P<m>[0-5]\d)(?:(?P<sign>[+-])?(?P<oh>[01]?\d|2[0-3]):(?P<om>[0-5]\d))?$",
        )
        .expect("valid clock time regex")
    })
}

/// Split a leading interval clause from trailing free text
///
/// Returns the normalized interval and the untouched remainder, or None when
/// the text does not start with at least one `<number> <unit>` pair.
pub fn parse_relative(text: &str) -> Option<(String, String)> {
    let (interval, remainder) = split_interval(text)?;
    Some((interval.to_string(), remainder))
}

fn split_interval(text: &str) -> Option<(Interval, String)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut parts = Vec::new();
    let mut consumed = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index].trim_end_matches(',');

        if !parts.is_empty() && (token.eq_ignore_ascii_case("and") || token.is_empty()) {
            index += 1;
            continue;
        }

        if glued_regex().is_match(token) {
            let mut glued = Vec::new();
            for caps in glued_pair_regex().captures_iter(token) {
                let Ok(amount) = caps[1].parse::<u32>() else {
                    break;
                };
                let Some(unit) = Unit::from_alias(&caps[2]) else {
                    break;
                };
                glued.push((amount, unit));
            }
            if glued.is_empty() || glued_pair_regex().captures_iter(token).count() != glued.len() {
                break;
            }
            parts.extend(glued);
            index += 1;
            consumed = index;
            continue;
        }

        let Ok(amount) = token.parse::<u32>() else {
            break;
        };
        let Some(unit) = tokens
            .get(index + 1)
            .and_then(|word| Unit::from_alias(word.trim_end_matches(',')))
        else {
            break;
        };
        parts.push((amount, unit));
        index += 2;
        consumed = index;
    }

    if parts.is_empty() {
        return None;
    }

    Some((Interval { parts }, tokens[consumed..].join(" ")))
}

/// Validate a clock token such as `18:00`, `7:30+2:00` or `18:00-3:00`
pub fn parse_absolute(token: &str) -> Option<ClockTime> {
    let caps = clock_regex().captures(token.trim())?;
    let hour = caps["h"].parse().ok()?;
    let minute = caps["m"].parse().ok()?;

    let offset_seconds = match (caps.name("oh"), caps.name("om")) {
        (Some(oh), Some(om)) => {
            let magnitude = oh.as_str().parse::<i32>().ok()? * 3600 + om.as_str().parse::<i32>().ok()? * 60;
            match caps.name("sign").map(|s| s.as_str()) {
                Some("-") => -magnitude,
                _ => magnitude,
            }
        }
        _ => 0,
    };

    Some(ClockTime {
        hour,
        minute,
        offset_seconds,
    })
}

/// Normalize a time expression: intervals get canonical unit names, anything
/// else is returned trimmed
pub fn normalize(expression: &str) -> String {
    match split_interval(expression) {
        Some((interval, remainder)) if remainder.is_empty() => interval.to_string(),
        _ => expression.trim().to_string(),
    }
}

/// Resolve an expression against `now`, trying a clock time first and a
/// relative interval second
pub fn resolve(expression: &str, now: DateTime<Utc>) -> Option<DueTime> {
    let due = match parse_absolute(expression) {
        Some(clock) => clock.on_day_of(now)?,
        None => match split_interval(expression) {
            Some((interval, remainder)) if remainder.is_empty() => interval.apply(now)?,
            _ => return None,
        },
    };

    if due <= now {
        Some(DueTime::Past(due))
    } else {
        Some(DueTime::Future(due))
    }
}
