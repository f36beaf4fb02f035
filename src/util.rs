use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{GfillError, Result};

/// Time zone used both for "today" and for fabricated commit timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    pub fn today(&self) -> NaiveDate {
        match self {
            Zone::Local => Local::now().date_naive(),
            Zone::Fixed(offset) => Utc::now().with_timezone(offset).date_naive(),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => {
                let now = Local::now();
                now.with_timezone(&now.offset().fix())
            }
            Zone::Fixed(offset) => Utc::now().with_timezone(offset),
        }
    }

    /// Attach this zone to a wall-clock time. `None` when the time falls in a DST gap.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        }
    }
}

impl FromStr for Zone {
    type Err = GfillError;

    /// Accepts `local`, `UTC`/`Z`, or a fixed offset such as `+09:00`, `-0530`, `+8`.
    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Zone::utc());
        }
        parse_offset(trimmed)
            .map(Zone::Fixed)
            .ok_or_else(|| {
                GfillError::Config(format!(
                    "Invalid timezone '{input}'; expected 'local', 'UTC' or an offset like +09:00."
                ))
            })
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

fn parse_offset(input: &str) -> Option<FixedOffset> {
    let (sign, rest) = match input.as_bytes().first()? {
        b'+' => (1, &input[1..]),
        b'-' => (-1, &input[1..]),
        _ => return None,
    };
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| GfillError::InvalidDate {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Render a command line the way a shell would accept it back.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(program);
    words.extend(args.iter().map(String::as_str));
    shell_words::join(words)
}
