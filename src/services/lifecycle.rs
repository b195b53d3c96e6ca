use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::auth::Actor;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::policy::{self, Action};

const REAL_TIME_FMT: &str = "%Y-%m-%d %H:%M";

/// scheduled -> cancelled. Owner or admin; only future bookings.
pub fn cancel(conn: &Connection, actor: &Actor, booking_id: &str) -> Result<Booking, AppError> {
    let booking = load(conn, booking_id)?;
    policy::authorize(actor, Action::CancelBooking, Some(&booking.user_id))?;

    match booking.status {
        BookingStatus::Cancelled => {
            return Err(AppError::validation("booking is already cancelled"))
        }
        BookingStatus::Completed => {
            return Err(AppError::validation("cannot cancel a completed booking"))
        }
        BookingStatus::Scheduled => {}
    }

    if booking.starts_at() <= Utc::now().naive_utc() {
        return Err(AppError::validation(
            "cannot cancel a booking that is in the past or already started",
        ));
    }

    queries::update_booking_status(conn, booking_id, BookingStatus::Cancelled)?;
    tracing::info!(booking_id = %booking_id, "booking cancelled");
    load(conn, booking_id)
}

/// scheduled -> completed, or cancelled -> completed. Admin only; the
/// admin path deliberately overrides a cancellation.
pub fn complete(
    conn: &Connection,
    actor: &Actor,
    booking_id: &str,
    real_start: Option<&str>,
    real_end: Option<&str>,
) -> Result<Booking, AppError> {
    policy::authorize(actor, Action::CompleteBooking, None)?;
    let booking = load(conn, booking_id)?;

    let start = parse_real_time(real_start)?;
    let end = parse_real_time(real_end)?;
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(AppError::validation("real start must be before real end"));
        }
    }

    match booking.status {
        BookingStatus::Completed => {
            return Err(AppError::validation("booking is already completed"))
        }
        BookingStatus::Scheduled | BookingStatus::Cancelled => {}
    }

    queries::complete_booking(conn, booking_id, start.as_ref(), end.as_ref())?;
    tracing::info!(booking_id = %booking_id, "booking completed");
    load(conn, booking_id)
}

/// Any state -> scheduled. Admin only; clears the actual service times.
pub fn reopen(conn: &Connection, actor: &Actor, booking_id: &str) -> Result<Booking, AppError> {
    policy::authorize(actor, Action::ReopenBooking, None)?;
    let booking = load(conn, booking_id)?;

    match booking.status {
        BookingStatus::Scheduled => {
            return Err(AppError::validation("booking is already scheduled"))
        }
        BookingStatus::Completed | BookingStatus::Cancelled => {}
    }

    queries::reopen_booking(conn, booking_id)?;
    tracing::info!(booking_id = %booking_id, "booking reopened");
    load(conn, booking_id)
}

/// Admin escape hatch: raw status overwrite, no transition guards beyond
/// the role check and the closed status enum. Kept separate from the
/// guarded transitions above on purpose.
pub fn override_status(
    conn: &Connection,
    actor: &Actor,
    booking_id: &str,
    status: &str,
) -> Result<Booking, AppError> {
    policy::authorize(actor, Action::OverrideBookingStatus, None)?;

    let status = BookingStatus::parse(status)
        .ok_or_else(|| AppError::Validation(format!("unknown status: {status}")))?;

    let _ = load(conn, booking_id)?;
    queries::update_booking_status(conn, booking_id, status)?;
    tracing::warn!(booking_id = %booking_id, status = status.as_str(), "status overridden by admin");
    load(conn, booking_id)
}

fn load(conn: &Connection, booking_id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::not_found("booking not found"))
}

fn parse_real_time(s: Option<&str>) -> Result<Option<NaiveDateTime>, AppError> {
    match s {
        None => Ok(None),
        Some(raw) => NaiveDateTime::parse_from_str(raw, REAL_TIME_FMT)
            .map(Some)
            .map_err(|_| AppError::Validation(format!("invalid timestamp format: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Pet, PetSize, Role, User};
    use crate::services::booking::{create, CreateBookingRequest};
    use rust_decimal::Decimal;

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();

        for (id, role) in [("user-123", Role::Customer), ("admin-1", Role::Admin)] {
            let user = User {
                id: id.to_string(),
                name: id.to_string(),
                email: format!("{id}@example.com"),
                password_hash: "x".to_string(),
                role,
                phone: None,
                created_at: Utc::now().naive_utc(),
            };
            queries::create_user(&conn, &user).unwrap();
        }

        let pet = Pet {
            id: "pet-1".to_string(),
            owner_id: "user-123".to_string(),
            name: "Mel".to_string(),
            species: "cat".to_string(),
            breed: None,
            age: None,
            weight: None,
            size: PetSize::Small,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_pet(&conn, &pet).unwrap();

        let job = crate::models::Job {
            id: "job-1".to_string(),
            name: "Bath".to_string(),
            description: String::new(),
            price_small: Decimal::from(40),
            price_medium: Decimal::from(50),
            price_large: Decimal::from(60),
            duration_minutes: 30,
            windows: vec![],
            created_at: Utc::now().naive_utc(),
        };
        queries::create_job(&conn, &job).unwrap();

        conn
    }

    fn owner() -> Actor {
        Actor {
            id: "user-123".to_string(),
            role: Role::Customer,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            role: Role::Admin,
        }
    }

    fn stranger() -> Actor {
        Actor {
            id: "other-user".to_string(),
            role: Role::Customer,
        }
    }

    /// Far-future booking so the cancel time guard passes.
    fn future_booking(conn: &Connection) -> Booking {
        create(
            conn,
            &owner(),
            &CreateBookingRequest {
                pet_id: Some("pet-1".to_string()),
                job_id: Some("job-1".to_string()),
                booking_date: Some("2099-12-31".to_string()),
                booking_time: Some("10:00".to_string()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_owner_cancels_future_booking() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let cancelled = cancel(&conn, &owner(), &booking.id).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_twice_fails() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        cancel(&conn, &owner(), &booking.id).unwrap();
        let err = cancel(&conn, &owner(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_stranger_cannot_cancel() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = cancel(&conn, &stranger(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_cancel_past_booking_fails() {
        let conn = setup_db();
        let booking = create(
            &conn,
            &owner(),
            &CreateBookingRequest {
                pet_id: Some("pet-1".to_string()),
                job_id: Some("job-1".to_string()),
                booking_date: Some("2020-01-01".to_string()),
                booking_time: Some("10:00".to_string()),
            },
        )
        .unwrap();

        let err = cancel(&conn, &owner(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_cancel_completed_booking_fails() {
        let conn = setup_db();
        let booking = future_booking(&conn);
        complete(&conn, &admin(), &booking.id, None, None).unwrap();

        let err = cancel(&conn, &owner(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_cancel_missing_booking_not_found() {
        let conn = setup_db();
        let err = cancel(&conn, &admin(), "nope").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_complete_requires_admin() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = complete(&conn, &owner(), &booking.id, None, None).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_completes_with_real_times() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let done = complete(
            &conn,
            &admin(),
            &booking.id,
            Some("2099-12-31 10:05"),
            Some("2099-12-31 10:35"),
        )
        .unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert!(done.real_start.is_some());
        assert!(done.real_end.is_some());
    }

    #[test]
    fn test_complete_rejects_inverted_real_times() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = complete(
            &conn,
            &admin(),
            &booking.id,
            Some("2099-12-31 11:00"),
            Some("2099-12-31 10:00"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_complete_rejects_bad_timestamp_format() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = complete(&conn, &admin(), &booking.id, Some("31/12/2099 10:00"), None)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_complete_twice_fails() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        complete(&conn, &admin(), &booking.id, None, None).unwrap();
        let err = complete(&conn, &admin(), &booking.id, None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_admin_completes_cancelled_booking() {
        let conn = setup_db();
        let booking = future_booking(&conn);
        cancel(&conn, &owner(), &booking.id).unwrap();

        let done = complete(&conn, &admin(), &booking.id, None, None).unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
    }

    #[test]
    fn test_reopen_resets_real_times() {
        let conn = setup_db();
        let booking = future_booking(&conn);
        complete(
            &conn,
            &admin(),
            &booking.id,
            Some("2099-12-31 10:00"),
            Some("2099-12-31 10:30"),
        )
        .unwrap();

        let reopened = reopen(&conn, &admin(), &booking.id).unwrap();
        assert_eq!(reopened.status, BookingStatus::Scheduled);
        assert!(reopened.real_start.is_none());
        assert!(reopened.real_end.is_none());
    }

    #[test]
    fn test_reopen_requires_admin_and_non_scheduled() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = reopen(&conn, &owner(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = reopen(&conn, &admin(), &booking.id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_override_skips_transition_guards() {
        let conn = setup_db();
        let booking = future_booking(&conn);
        complete(&conn, &admin(), &booking.id, None, None).unwrap();

        // completed -> cancelled is illegal via cancel(), fine via override
        let overridden = override_status(&conn, &admin(), &booking.id, "cancelled").unwrap();
        assert_eq!(overridden.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_override_accepts_legacy_literals_only_from_closed_enum() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let overridden = override_status(&conn, &admin(), &booking.id, "cancelado").unwrap();
        assert_eq!(overridden.status, BookingStatus::Cancelled);

        let err = override_status(&conn, &admin(), &booking.id, "pending").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_override_requires_admin() {
        let conn = setup_db();
        let booking = future_booking(&conn);

        let err = override_status(&conn, &owner(), &booking.id, "completed").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
