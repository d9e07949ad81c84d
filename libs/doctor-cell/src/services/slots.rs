//! Working-hours parsing and 30 minute slot arithmetic.

use chrono::{Duration, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Fixed consultation slot length used for all slot math.
pub const SLOT_MINUTES: i64 = 30;

/// Slot count assumed when working hours cannot be parsed (an 8 hour day).
pub const DEFAULT_TOTAL_SLOTS: u32 = 16;

static WORKING_HOURS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(AM|PM)?\s*-\s*(\d{1,2})(?::(\d{2}))?\s*(AM|PM)?")
        .expect("working hours pattern is valid")
});

/// A doctor's working interval within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Parses `H[:MM] [AM|PM] - H[:MM] [AM|PM]`, 12 or 24 hour.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = WORKING_HOURS.captures(text)?;

        let start = to_time(
            caps.get(1)?.as_str(),
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        )?;
        let end = to_time(
            caps.get(4)?.as_str(),
            caps.get(5).map(|m| m.as_str()),
            caps.get(6).map(|m| m.as_str()),
        )?;

        Some(Self { start, end })
    }

    /// Signed length of the range. Negative when `end` is before `start`.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn slot_count(&self, slot_minutes: i64) -> u32 {
        let minutes = self.minutes();
        if minutes <= 0 || slot_minutes <= 0 {
            return 0;
        }
        u32::try_from(minutes / slot_minutes).unwrap_or(u32::MAX)
    }

    /// Start time of every whole slot in the range.
    pub fn slot_starts(&self, slot_minutes: i64) -> Vec<NaiveTime> {
        let step = Duration::minutes(slot_minutes);
        (0..self.slot_count(slot_minutes))
            .map(|i| self.start + step * i as i32)
            .collect()
    }
}

fn to_time(hour: &str, minute: Option<&str>, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = match minute {
        Some(m) => m.parse().ok()?,
        None => 0,
    };

    let hour = match meridiem.map(str::to_ascii_uppercase).as_deref() {
        Some("PM") if hour != 12 => hour + 12,
        Some("AM") if hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Bookable 30 minute slots in a working-hours string, or
/// [`DEFAULT_TOTAL_SLOTS`] when it cannot be parsed.
pub fn total_slots(working_hours: &str) -> u32 {
    match TimeRange::parse(working_hours) {
        Some(range) => range.slot_count(SLOT_MINUTES),
        None => {
            warn!(
                "Unparseable working hours '{}', assuming {} slots",
                working_hours, DEFAULT_TOTAL_SLOTS
            );
            DEFAULT_TOTAL_SLOTS
        }
    }
}
