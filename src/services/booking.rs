use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::queries::{self, OccupiedSlot};
use crate::errors::AppError;
use crate::models::availability::{parse_date, parse_time, slot_covered};
use crate::models::{Booking, BookingStatus, Job};

#[derive(Debug, Deserialize, Default)]
pub struct CreateBookingRequest {
    pub pet_id: Option<String>,
    pub job_id: Option<String>,
    pub booking_date: Option<String>,
    pub booking_time: Option<String>,
}

/// Creates a booking for the requested (pet, job, date, time) slot.
///
/// The caller must hold the connection lock for the whole call; the
/// duplicate check and the insert are only race-free because a single
/// writer runs them back to back. The partial unique index on the
/// bookings table backstops anything that slips through.
pub fn create(
    conn: &Connection,
    actor: &Actor,
    req: &CreateBookingRequest,
) -> Result<Booking, AppError> {
    let pet_id = required(&req.pet_id, "pet_id")?;
    let job_id = required(&req.job_id, "job_id")?;
    let date_str = required(&req.booking_date, "booking_date")?;
    let time = required(&req.booking_time, "booking_time")?;

    let date = parse_date(date_str).map_err(AppError::Validation)?;
    parse_time(time).map_err(AppError::Validation)?;

    let pet = queries::get_pet_by_id(conn, pet_id)?
        .ok_or_else(|| AppError::not_found("pet not found"))?;

    if pet.owner_id != actor.id && !actor.is_admin() {
        return Err(AppError::validation("pet does not belong to user"));
    }
    // Admins book on behalf of the pet's owner; for customers this is a
    // no-op since ownership was just checked.
    let owner_id = pet.owner_id.clone();

    let job = queries::get_job_by_id(conn, job_id)?
        .ok_or_else(|| AppError::not_found("job not found"))?;

    // Zero windows means the job is always bookable; the advisory listing
    // below deliberately disagrees (see available_jobs).
    if !job.windows.is_empty() && !slot_covered(&job.windows, date, time) {
        return Err(AppError::validation(
            "requested time is outside the job's availability",
        ));
    }

    if queries::find_duplicate(conn, &pet.id, &job.id, &date, time)?.is_some() {
        return Err(AppError::Conflict("duplicate booking".to_string()));
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: owner_id,
        pet_id: pet.id.clone(),
        job_id: job.id.clone(),
        booking_date: date,
        booking_time: time.to_string(),
        status: BookingStatus::Scheduled,
        price: job.price_for(pet.size),
        real_start: None,
        real_end: None,
        created_at: Utc::now().naive_utc(),
    };
    queries::create_booking(conn, &booking)?;

    tracing::info!(
        booking_id = %booking.id,
        pet_id = %booking.pet_id,
        job_id = %booking.job_id,
        "booking created"
    );
    Ok(booking)
}

/// Jobs whose windows cover the given date+time. Jobs without windows are
/// never listed here, even though creation treats them as always bookable.
pub fn available_jobs(conn: &Connection, date_str: &str, time: &str) -> Result<Vec<Job>, AppError> {
    let date = parse_date(date_str).map_err(AppError::Validation)?;
    parse_time(time).map_err(AppError::Validation)?;

    let jobs = queries::list_jobs(conn)?;
    Ok(jobs
        .into_iter()
        .filter(|j| slot_covered(&j.windows, date, time))
        .collect())
}

/// Non-cancelled slots in a date range, for greying out the picker.
pub fn occupied_slots(
    conn: &Connection,
    start_str: &str,
    end_str: &str,
) -> Result<Vec<OccupiedSlot>, AppError> {
    let start = parse_date(start_str).map_err(AppError::Validation)?;
    let end = parse_date(end_str).map_err(AppError::Validation)?;
    if start > end {
        return Err(AppError::validation("start date is after end date"));
    }
    Ok(queries::get_occupied_slots(conn, &start, &end)?)
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    match field.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{AvailabilityWindow, Pet, PetSize, Role, User};
    use rust_decimal::Decimal;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_user(conn: &Connection, id: &str, role: Role) {
        let user = User {
            id: id.to_string(),
            name: format!("user {id}"),
            email: format!("{id}@example.com"),
            password_hash: "x".to_string(),
            role,
            phone: None,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_user(conn, &user).unwrap();
    }

    fn seed_pet(conn: &Connection, id: &str, owner: &str, size: PetSize) {
        let pet = Pet {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: "Rex".to_string(),
            species: "dog".to_string(),
            breed: None,
            age: Some(3),
            weight: Some(12.5),
            size,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_pet(conn, &pet).unwrap();
    }

    fn seed_job(conn: &Connection, id: &str, windows: Vec<AvailabilityWindow>) {
        let job = Job {
            id: id.to_string(),
            name: format!("Grooming {id}"),
            description: String::new(),
            price_small: Decimal::from(50),
            price_medium: Decimal::from(60),
            price_large: Decimal::from(70),
            duration_minutes: 60,
            windows,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_job(conn, &job).unwrap();
    }

    fn monday_window() -> AvailabilityWindow {
        AvailabilityWindow {
            day_of_week: 1,
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
        }
    }

    fn customer(id: &str) -> Actor {
        Actor {
            id: id.to_string(),
            role: Role::Customer,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            role: Role::Admin,
        }
    }

    fn request(pet: &str, job: &str, date: &str, time: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            pet_id: Some(pet.to_string()),
            job_id: Some(job.to_string()),
            booking_date: Some(date.to_string()),
            booking_time: Some(time.to_string()),
        }
    }

    fn seed_all(conn: &Connection, windows: Vec<AvailabilityWindow>) {
        seed_user(conn, "user-1", Role::Customer);
        seed_user(conn, "admin-1", Role::Admin);
        seed_pet(conn, "pet-1", "user-1", PetSize::Large);
        seed_job(conn, "job-1", windows);
    }

    #[test]
    fn test_create_with_no_windows_always_available() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        // Sunday 23:00 would be outside any plausible window
        let booking = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-15", "23:00"),
        )
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Scheduled);
    }

    #[test]
    fn test_create_within_window_succeeds() {
        let conn = setup_db();
        seed_all(&conn, vec![monday_window()]);

        // 2026-02-16 is a Monday
        let booking = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-16", "10:00"),
        )
        .unwrap();
        assert_eq!(booking.booking_time, "10:00");
    }

    #[test]
    fn test_create_outside_window_fails() {
        let conn = setup_db();
        seed_all(&conn, vec![monday_window()]);

        let err = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-16", "19:00"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_wrong_day_fails() {
        let conn = setup_db();
        seed_all(&conn, vec![monday_window()]);

        // 2026-02-17 is a Tuesday
        let err = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-17", "10:00"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_duplicate_booking_conflicts() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        let req = request("pet-1", "job-1", "2026-02-16", "10:00");
        create(&conn, &customer("user-1"), &req).unwrap();
        let err = create(&conn, &customer("user-1"), &req).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_cancelled_booking_frees_the_slot() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        let req = request("pet-1", "job-1", "2026-02-16", "10:00");
        let first = create(&conn, &customer("user-1"), &req).unwrap();
        queries::update_booking_status(&conn, &first.id, BookingStatus::Cancelled).unwrap();

        assert!(create(&conn, &customer("user-1"), &req).is_ok());
    }

    #[test]
    fn test_price_follows_pet_size() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        let booking = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-16", "10:00"),
        )
        .unwrap();
        // Large pet takes the large tier
        assert_eq!(booking.price, Decimal::from(70));
    }

    #[test]
    fn test_other_customer_cannot_book_someone_elses_pet() {
        let conn = setup_db();
        seed_all(&conn, vec![]);
        seed_user(&conn, "user-2", Role::Customer);

        let err = create(
            &conn,
            &customer("user-2"),
            &request("pet-1", "job-1", "2026-02-16", "10:00"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_admin_booking_is_rewritten_to_pet_owner() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        let booking = create(
            &conn,
            &admin(),
            &request("pet-1", "job-1", "2026-02-16", "10:00"),
        )
        .unwrap();
        assert_eq!(booking.user_id, "user-1");
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let conn = setup_db();
        seed_all(&conn, vec![]);
        let actor = customer("user-1");

        let mut req = request("pet-1", "job-1", "2026-02-16", "10:00");
        req.pet_id = None;
        assert!(matches!(
            create(&conn, &actor, &req).unwrap_err(),
            AppError::Validation(_)
        ));

        let req = request("pet-1", "job-1", "16/02/2026", "10:00");
        assert!(matches!(
            create(&conn, &actor, &req).unwrap_err(),
            AppError::Validation(_)
        ));

        let req = request("pet-1", "job-1", "2026-02-16", "10h00");
        assert!(matches!(
            create(&conn, &actor, &req).unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_unknown_pet_and_job_not_found() {
        let conn = setup_db();
        seed_all(&conn, vec![]);
        let actor = customer("user-1");

        let req = request("nope", "job-1", "2026-02-16", "10:00");
        assert!(matches!(
            create(&conn, &actor, &req).unwrap_err(),
            AppError::NotFound(_)
        ));

        let req = request("pet-1", "nope", "2026-02-16", "10:00");
        assert!(matches!(
            create(&conn, &actor, &req).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_available_jobs_excludes_windowless_jobs() {
        let conn = setup_db();
        seed_all(&conn, vec![monday_window()]);
        seed_job(&conn, "job-2", vec![]);

        let jobs = available_jobs(&conn, "2026-02-16", "10:00").unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "job-1");

        let jobs = available_jobs(&conn, "2026-02-16", "19:00").unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_occupied_slots_skips_cancelled() {
        let conn = setup_db();
        seed_all(&conn, vec![]);

        let kept = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-16", "10:00"),
        )
        .unwrap();
        let gone = create(
            &conn,
            &customer("user-1"),
            &request("pet-1", "job-1", "2026-02-17", "11:00"),
        )
        .unwrap();
        queries::update_booking_status(&conn, &gone.id, BookingStatus::Cancelled).unwrap();

        let slots = occupied_slots(&conn, "2026-02-15", "2026-02-20").unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].booking_time, "10:00");
        assert_eq!(slots[0].job_id, kept.job_id);
    }
}
