use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use shared_config::AppConfig;

/// Converts between UTC instants and the clinic's local calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicCalendar {
    tz: Tz,
}

impl ClinicCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.clinic_timezone)
    }

    /// Local calendar date at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Instant of local wall-clock `time` on `date`.
    ///
    /// Ambiguous times (clock set back) resolve to the earlier instant; times
    /// skipped by a forward jump resolve to the first valid instant after them.
    pub fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => self.after_gap(naive),
        }
    }

    /// Local midnight of `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, NaiveTime::MIN)
    }

    /// `[start of date, start of next date)` as UTC instants.
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(date);
        (self.start_of_day(date), self.start_of_day(next))
    }

    fn after_gap(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        // DST gaps are at most a few hours; walk forward a minute at a time.
        let mut candidate = naive;
        for _ in 0..(24 * 60) {
            candidate += Duration::minutes(1);
            if let Some(dt) = self.tz.from_local_datetime(&candidate).earliest() {
                return dt.with_timezone(&Utc);
            }
        }
        Utc.from_utc_datetime(&naive)
    }
}

impl Default for ClinicCalendar {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
