use std::fmt;

use docserde_core::config::ConfigurationSource;
use docserde_core::document::Timestamp;
use docserde_core::error::ConfigError;
use serde::Serialize;

use crate::keys;

const MINUTES_PER_DAY: i32 = 24 * 60;
const MILLIS_PER_MINUTE: i64 = 60_000;

/// Offset, in minutes, attached to written timestamps and assumed for read
/// timestamps that carry no zone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimestampOffset {
    pub minutes: i32,
}

impl TimestampOffset {
    pub fn new(minutes: i32) -> Self {
        Self { minutes }
    }

    /// Accepts integer minutes (`-300`), `Z`, or `+HH:MM` / `-HH:MM`.
    pub fn resolve(source: &dyn ConfigurationSource, errors: &mut Vec<ConfigError>) -> Self {
        let Some(raw) = source.get(keys::TIMESTAMP_OFFSET) else {
            return Self::default();
        };
        match parse_offset(raw.trim()) {
            Ok(minutes) => Self::new(minutes),
            Err(reason) => {
                errors.push(ConfigError::InvalidValue {
                    key: keys::TIMESTAMP_OFFSET.to_string(),
                    value: raw.to_string(),
                    reason,
                });
                Self::default()
            }
        }
    }

    /// UTC instant of a read timestamp. Zone-less values are taken to be
    /// wall-clock time at this offset.
    pub fn normalize(&self, ts: Timestamp) -> i64 {
        match ts.offset_minutes {
            Some(_) => ts.epoch_millis,
            None => ts
                .epoch_millis
                .saturating_sub(self.minutes as i64 * MILLIS_PER_MINUTE),
        }
    }

    /// Document timestamp for a UTC instant, tagged with this offset.
    pub fn attach(&self, epoch_millis: i64) -> Timestamp {
        Timestamp::new(epoch_millis, Some(self.minutes))
    }
}

impl fmt::Display for TimestampOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
    }
}

fn parse_offset(raw: &str) -> Result<i32, String> {
    if raw.eq_ignore_ascii_case("z") {
        return Ok(0);
    }
    let minutes = if let Some((hours, mins)) = raw.split_once(':') {
        let (sign, hours) = match hours.chars().next() {
            Some('+') => (1, &hours[1..]),
            Some('-') => (-1, &hours[1..]),
            _ => return Err("expected a sign before HH:MM".into()),
        };
        if !is_two_digits(hours) || !is_two_digits(mins) {
            return Err("expected +HH:MM or -HH:MM".into());
        }
        let h: i32 = hours
            .parse()
            .map_err(|_| format!("invalid hours '{}'", hours))?;
        let m: i32 = mins
            .parse()
            .map_err(|_| format!("invalid minutes '{}'", mins))?;
        if m >= 60 {
            return Err(format!("minutes '{}' must be below 60", mins));
        }
        sign * (h * 60 + m)
    } else {
        raw.parse::<i32>()
            .map_err(|_| "expected integer minutes, 'Z', or +HH:MM".to_string())?
    };
    if minutes.unsigned_abs() >= MINUTES_PER_DAY as u32 {
        return Err(format!(
            "offset must be within +/-{} minutes",
            MINUTES_PER_DAY - 1
        ));
    }
    Ok(minutes)
}

fn is_two_digits(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit())
}
