//! Elapsed recording time value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::ElapsedParseError;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;

/// Whole seconds a recording has been running.
/// Sub-second precision is truncated, never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Elapsed {
    seconds: u64,
}

impl Elapsed {
    pub const ZERO: Self = Self { seconds: 0 };

    pub const fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Truncate a monotonic duration to whole seconds
    pub const fn from_duration(duration: Duration) -> Self {
        Self {
            seconds: duration.as_secs(),
        }
    }

    pub const fn as_secs(&self) -> u64 {
        self.seconds
    }

    pub const fn hours(&self) -> u64 {
        self.seconds / SECS_PER_HOUR
    }

    pub const fn minutes(&self) -> u64 {
        (self.seconds % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    pub const fn secs(&self) -> u64 {
        self.seconds % SECS_PER_MINUTE
    }

    /// Clock-style rendering for status lines: `05:32` or `1:02:03`
    pub fn clock(&self) -> String {
        if self.hours() > 0 {
            format!("{}:{:02}:{:02}", self.hours(), self.minutes(), self.secs())
        } else {
            format!("{:02}:{:02}", self.minutes(), self.secs())
        }
    }
}

impl From<Duration> for Elapsed {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

impl FromStr for Elapsed {
    type Err = ElapsedParseError;

    /// Parse the filename form produced by `Display`.
    /// Supported formats: "05m32s", "01h02m03s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ElapsedParseError {
            input: s.to_string(),
        };

        let mut hours: Option<u64> = None;
        let mut minutes: Option<u64> = None;
        let mut seconds: Option<u64> = None;
        let mut current_num = String::new();

        for ch in s.chars() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
                continue;
            }

            // Units must appear in h, m, s order, each exactly once
            let slot = match ch {
                'h' if minutes.is_none() && seconds.is_none() => &mut hours,
                'm' if seconds.is_none() => &mut minutes,
                's' => &mut seconds,
                _ => return Err(err()),
            };
            if slot.is_some() || current_num.len() != 2 {
                return Err(err());
            }
            *slot = Some(current_num.parse().map_err(|_| err())?);
            current_num.clear();
        }

        if !current_num.is_empty() {
            return Err(err());
        }

        match (minutes, seconds) {
            (Some(m), Some(s)) if m < 60 && s < 60 => Ok(Self::from_secs(
                hours.unwrap_or(0) * SECS_PER_HOUR + m * SECS_PER_MINUTE + s,
            )),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Elapsed {
    /// Filename form: `05m32s`, or `01h02m03s` from one hour on
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours() > 0 {
            write!(
                f,
                "{:02}h{:02}m{:02}s",
                self.hours(),
                self.minutes(),
                self.secs()
            )
        } else {
            write!(f, "{:02}m{:02}s", self.minutes(), self.secs())
        }
    }
}
