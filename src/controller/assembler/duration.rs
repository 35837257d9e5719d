//! # Interval Durations
//!
//! Parses and formats the Go style durations Telegraf uses for `interval`.

use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

// One or more <number><unit> segments, e.g. "1h30m", "1.5s", "250ms"
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .expect("Failed to compile DURATION_REGEX - this should never happen")
});

static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<whole>\d*)(?:\.(?P<frac>\d*))?(?P<unit>ns|us|µs|μs|ms|s|m|h)")
        .expect("Failed to compile SEGMENT_REGEX - this should never happen")
});

/// Error returned for a duration string that cannot be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid duration \"{0}\"")]
pub struct DurationError(String);

/// Parse a Go style duration such as `10s`, `1m30s` or `1.5h`
///
/// A bare `0` is accepted. Negative durations are rejected since they are
/// meaningless as a scrape interval.
///
/// # Errors
///
/// Returns [`DurationError`] when the string is empty, has an unknown unit, is
/// negative or overflows.
pub fn parse_go_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError(input.to_string());
    let trimmed = input.trim();

    if trimmed == "0" || trimmed == "+0" {
        return Ok(Duration::ZERO);
    }

    if !DURATION_REGEX.is_match(trimmed) {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    for captures in SEGMENT_REGEX.captures_iter(trimmed) {
        let whole = captures.name("whole").map_or("", |m| m.as_str());
        let frac = captures.name("frac").map_or("", |m| m.as_str());
        let unit = captures.name("unit").map_or("", |m| m.as_str());

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            _ => return Err(invalid()),
        };

        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_overflow| invalid())?
        };
        total = whole_value
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(invalid)?;

        // Fractional digits beyond nanosecond precision are dropped
        let mut place = scale;
        for digit in frac.chars().filter_map(|c| c.to_digit(10)) {
            place /= 10;
            if place == 0 {
                break;
            }
            total = total
                .checked_add(u128::from(digit) * place)
                .ok_or_else(invalid)?;
        }
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_overflow| invalid())?;
    let nanos = u32::try_from(total % NANOS_PER_SECOND).map_err(|_overflow| invalid())?;
    Ok(Duration::new(secs, nanos))
}

/// Format a duration the way Go's `time.Duration` prints, e.g. `10s`, `1m0s`, `1h0m0s`, `1.5s`
pub fn format_go_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SECOND {
        let (unit, scale) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{unit}", format_scaled(nanos, scale));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = u128::from(total_secs % 60) * NANOS_PER_SECOND
        + u128::from(duration.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", format_scaled(seconds, NANOS_PER_SECOND));
    out
}

/// `value / scale` as a decimal without trailing zeros
fn format_scaled(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }

    let width = scale.to_string().len() - 1;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
