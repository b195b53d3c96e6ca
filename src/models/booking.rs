use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub pet_id: String,
    pub job_id: String,
    pub booking_date: NaiveDate,
    /// `HH:MM`, validated at creation.
    pub booking_time: String,
    pub status: BookingStatus,
    /// Fixed at creation from the job's tier for the pet's size.
    pub price: Decimal,
    pub real_start: Option<NaiveDateTime>,
    pub real_end: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Booking {
    /// The scheduled start as a single timestamp.
    pub fn starts_at(&self) -> NaiveDateTime {
        let (h, m) = self
            .booking_time
            .split_once(':')
            .and_then(|(h, m)| Some((h.parse().ok()?, m.parse().ok()?)))
            .unwrap_or((0, 0));
        let time = chrono::NaiveTime::from_hms_opt(h, m, 0).unwrap_or(chrono::NaiveTime::MIN);
        self.booking_date.and_time(time)
    }
}

/// The one closed status type. Earlier iterations of the shop mixed
/// Portuguese and English literals across layers; `parse` still accepts
/// the legacy spellings but serialization is always canonical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" | "agendado" => Some(BookingStatus::Scheduled),
            "completed" | "concluido" => Some(BookingStatus::Completed),
            "cancelled" | "cancelado" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}
