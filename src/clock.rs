//! Time-of-day source and the fixed-width line a broadcaster writes.

use chrono::{Local, NaiveTime};

/// Length in bytes of one `HH:MM:SS\n` line.
///
/// Pollers read exactly this many bytes per reading, so the wire format and
/// the read buffer have to change together.
pub const STAMP_LEN: usize = 9;

const STAMP_FORMAT: &str = "%H:%M:%S";

/// Where a broadcaster gets the current time of day from.
pub trait WallClock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// The machine's local time. Honours `TZ`, so several broadcasters on one host
/// can serve different zones.
pub struct LocalClock;

impl WallClock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock stuck at one instant.
#[cfg(test)]
pub struct FixedClock(pub NaiveTime);

#[cfg(test)]
impl FixedClock {
    pub fn at(h: u32, m: u32, s: u32) -> Self {
        Self(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }
}

#[cfg(test)]
impl WallClock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

/// Format `time` as one newline-terminated wire line.
pub fn format_stamp(time: NaiveTime) -> String {
    let mut line = time.format(STAMP_FORMAT).to_string();
    line.push('\n');
    line
}

/// Parse a reading, with or without its trailing newline.
pub fn parse_stamp(reading: &str) -> Option<NaiveTime> {
    let text = reading.strip_suffix('\n').unwrap_or(reading);
    if text.len() != STAMP_LEN - 1 {
        return None;
    }
    NaiveTime::parse_from_str(text, STAMP_FORMAT).ok()
}
