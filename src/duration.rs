//! Duration strings of the form accepted by Go's `time.ParseDuration`:
//! a signed sequence of decimal numbers, each with an optional fraction and a
//! unit suffix, such as `"72h"`, `"1h30m"`, `"1.5s"` or `"-300ms"`.
//!
//! Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.

use std::sync::LazyLock;

use regex::Regex;
use time::Duration;

use crate::error::CrlKitError;

/// Default `next_update` offset of a resigned CRL.
pub const DEFAULT_NEXT_UPDATE: &str = "72h";

static SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .unwrap_or_else(|e| unreachable!("duration grammar: {e}"))
});

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]*)(?:\.([0-9]*))?(ns|us|µs|μs|ms|s|m|h)")
        .unwrap_or_else(|e| unreachable!("duration grammar: {e}"))
});

fn unit_nanos(unit: &str) -> i128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        _ => 60 * 60 * 1_000_000_000,
    }
}

/// Parses a duration string.
///
/// `"0"` is accepted without a unit; every other value needs one per number.
/// Fractions finer than a nanosecond are truncated.
///
/// # Errors
/// `CrlKitError::InvalidDuration` if the text does not match the grammar or
/// the value does not fit in a signed 64-bit count of nanoseconds.
pub fn parse_duration(input: &str) -> Result<Duration, CrlKitError> {
    let invalid = || CrlKitError::InvalidDuration(format!("time: invalid duration \"{input}\""));

    if matches!(input, "0" | "+0" | "-0") {
        return Ok(Duration::ZERO);
    }
    if !SHAPE.is_match(input) {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    for caps in COMPONENT.captures_iter(input) {
        let unit = unit_nanos(&caps[3]);
        let whole = match &caps[1] {
            "" => 0,
            digits => digits.parse::<i128>().map_err(|_| invalid())?,
        };
        let mut value = whole.checked_mul(unit).ok_or_else(invalid)?;

        if let Some(fraction) = caps.get(2) {
            let mut scale = unit;
            for digit in fraction.as_str().bytes().take(30) {
                scale /= 10;
                if scale == 0 {
                    break;
                }
                value += i128::from(digit - b'0') * scale;
            }
        }

        total = total.checked_add(value).ok_or_else(invalid)?;
        if total > i128::from(i64::MAX) {
            return Err(invalid());
        }
    }

    if input.starts_with('-') {
        total = -total;
    }
    let nanos = i64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::nanoseconds(nanos))
}
