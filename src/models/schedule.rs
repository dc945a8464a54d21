use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
    Weekday,
};
use serde::Serialize;

/// Opening hours of the salon. Slots are hourly, starting at `open_hour` and
/// ending with the slot that starts one hour before `close_hour`.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub open_hour: u32,
    pub close_hour: u32,
    #[serde(serialize_with = "serialize_weekday")]
    pub closed_day: Weekday,
    pub horizon_days: i64,
    #[serde(skip)]
    pub utc_offset: FixedOffset,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 19,
            closed_day: Weekday::Sun,
            horizon_days: 90,
            utc_offset: Utc.fix(),
        }
    }
}

impl Schedule {
    pub fn slots(&self) -> Vec<String> {
        (self.open_hour..self.close_hour)
            .map(|h| format!("{h:02}:00"))
            .collect()
    }

    pub fn is_slot(&self, time: &str) -> bool {
        self.slots().iter().any(|s| s == time)
    }

    pub fn slot_start(&self, time: &str) -> Option<NaiveTime> {
        if !self.is_slot(time) {
            return None;
        }
        NaiveTime::parse_from_str(time, "%H:%M").ok()
    }

    /// Wall-clock time at the salon.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.utc_offset).naive_local()
    }

    pub fn last_bookable_day(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.horizon_days)
    }

    /// Slots that can still be booked on `date`. Past dates, dates beyond
    /// the horizon and the closed day have none; on the current day only
    /// slots starting after `now` remain.
    pub fn available_slots(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<String> {
        let today = now.date();
        if date < today || date > self.last_bookable_day(today) {
            return Vec::new();
        }
        if date.weekday() == self.closed_day {
            return Vec::new();
        }

        self.slots()
            .into_iter()
            .filter(|slot| {
                date != today
                    || self
                        .slot_start(slot)
                        .map(|start| date.and_time(start) > now)
                        .unwrap_or(false)
            })
            .collect()
    }

    pub fn closed_day_label(&self) -> &'static str {
        match self.closed_day {
            Weekday::Mon => "Mondays",
            Weekday::Tue => "Tuesdays",
            Weekday::Wed => "Wednesdays",
            Weekday::Thu => "Thursdays",
            Weekday::Fri => "Fridays",
            Weekday::Sat => "Saturdays",
            Weekday::Sun => "Sundays",
        }
    }
}

fn serialize_weekday<S: serde::Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&day.to_string().to_lowercase())
}
