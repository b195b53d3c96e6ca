use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A recurring weekly open window for a job. `day_of_week` follows the
/// 0=Sunday..6=Saturday convention; times are `HH:MM` strings compared
/// lexically over the half-open interval `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

impl AvailabilityWindow {
    pub fn covers(&self, day_of_week: u32, time: &str) -> bool {
        u32::from(self.day_of_week) == day_of_week
            && self.start_time.as_str() <= time
            && time < self.end_time.as_str()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.day_of_week > 6 {
            return Err(format!("invalid day of week: {}", self.day_of_week));
        }
        parse_time(&self.start_time)?;
        parse_time(&self.end_time)?;
        if self.start_time >= self.end_time {
            return Err(format!(
                "window start {} must be before end {}",
                self.start_time, self.end_time
            ));
        }
        Ok(())
    }
}

/// True if any window covers the requested date+time. An empty slice is
/// NOT covered; the caller decides what zero windows means (booking
/// creation treats it as always available, the advisory listing as never).
pub fn slot_covered(windows: &[AvailabilityWindow], date: NaiveDate, time: &str) -> bool {
    let dow = date.weekday().num_days_from_sunday();
    windows.iter().any(|w| w.covers(dow, time))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid date format: {s}"))
}

pub fn parse_time(s: &str) -> Result<(), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 || parts[0].len() != 2 || parts[1].len() != 2 {
        return Err(format!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| format!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| format!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time out of range: {s}"));
    }
    Ok(())
}
