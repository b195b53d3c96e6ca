use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{AvailabilityWindow, Booking, BookingStatus, Job, Pet, PetSize, Role, User};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.phone,
            user.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, password_hash, role, phone, created_at
         FROM users WHERE id = ?1",
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, password_hash, role, phone, created_at
         FROM users WHERE email = ?1",
        params![email],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role_str: String = row.get(4)?;
    let created_at_str: String = row.get(6)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role_str),
        phone: row.get(5)?,
        created_at: parse_datetime_lenient(&created_at_str),
    })
}

// ── Pets ──

pub fn create_pet(conn: &Connection, pet: &Pet) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO pets (id, owner_id, name, species, breed, age, weight, size, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            pet.id,
            pet.owner_id,
            pet.name,
            pet.species,
            pet.breed,
            pet.age,
            pet.weight,
            pet.size.as_str(),
            pet.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_pet_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Pet>> {
    let result = conn.query_row(
        "SELECT id, owner_id, name, species, breed, age, weight, size, created_at
         FROM pets WHERE id = ?1",
        params![id],
        |row| Ok(parse_pet_row(row)),
    );

    match result {
        Ok(pet) => Ok(Some(pet?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_pets_for_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Pet>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, species, breed, age, weight, size, created_at
         FROM pets WHERE owner_id = ?1 ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![owner_id], |row| Ok(parse_pet_row(row)))?;

    let mut pets = vec![];
    for row in rows {
        pets.push(row??);
    }
    Ok(pets)
}

pub fn get_all_pets(conn: &Connection) -> anyhow::Result<Vec<Pet>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, species, breed, age, weight, size, created_at
         FROM pets ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_pet_row(row)))?;

    let mut pets = vec![];
    for row in rows {
        pets.push(row??);
    }
    Ok(pets)
}

pub fn update_pet(conn: &Connection, pet: &Pet) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE pets SET name = ?1, species = ?2, breed = ?3, age = ?4, weight = ?5, size = ?6
         WHERE id = ?7",
        params![
            pet.name,
            pet.species,
            pet.breed,
            pet.age,
            pet.weight,
            pet.size.as_str(),
            pet.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_pet(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM pets WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_pet_row(row: &rusqlite::Row) -> anyhow::Result<Pet> {
    let size_str: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    Ok(Pet {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        age: row.get(5)?,
        weight: row.get(6)?,
        size: PetSize::parse(&size_str),
        created_at: parse_datetime_lenient(&created_at_str),
    })
}

// ── Jobs ──

pub fn create_job(conn: &Connection, job: &Job) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO jobs (id, name, description, price_small, price_medium, price_large, duration_minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            job.id,
            job.name,
            job.description,
            job.price_small.to_string(),
            job.price_medium.to_string(),
            job.price_large.to_string(),
            job.duration_minutes,
            job.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    replace_windows(conn, &job.id, &job.windows)?;
    Ok(())
}

pub fn update_job(conn: &Connection, job: &Job) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE jobs SET name = ?1, description = ?2, price_small = ?3, price_medium = ?4,
                         price_large = ?5, duration_minutes = ?6
         WHERE id = ?7",
        params![
            job.name,
            job.description,
            job.price_small.to_string(),
            job.price_medium.to_string(),
            job.price_large.to_string(),
            job.duration_minutes,
            job.id,
        ],
    )?;
    if count > 0 {
        replace_windows(conn, &job.id, &job.windows)?;
    }
    Ok(count > 0)
}

pub fn delete_job(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_job_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Job>> {
    let result = conn.query_row(
        "SELECT id, name, description, price_small, price_medium, price_large, duration_minutes, created_at
         FROM jobs WHERE id = ?1",
        params![id],
        |row| Ok(parse_job_row(row)),
    );

    match result {
        Ok(job) => {
            let mut job = job?;
            job.windows = get_windows(conn, &job.id)?;
            Ok(Some(job))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn job_name_exists(
    conn: &Connection,
    name: &str,
    exclude_id: Option<&str>,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE name = ?1 AND id != ?2",
        params![name, exclude_id.unwrap_or("")],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_jobs(conn: &Connection) -> anyhow::Result<Vec<Job>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price_small, price_medium, price_large, duration_minutes, created_at
         FROM jobs ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_job_row(row)))?;

    let mut jobs = vec![];
    for row in rows {
        let mut job = row??;
        job.windows = get_windows(conn, &job.id)?;
        jobs.push(job);
    }
    Ok(jobs)
}

pub fn get_windows(conn: &Connection, job_id: &str) -> anyhow::Result<Vec<AvailabilityWindow>> {
    let mut stmt = conn.prepare(
        "SELECT day_of_week, start_time, end_time
         FROM availability_windows WHERE job_id = ?1
         ORDER BY day_of_week ASC, start_time ASC",
    )?;

    let rows = stmt.query_map(params![job_id], |row| {
        Ok(AvailabilityWindow {
            day_of_week: row.get::<_, i64>(0)? as u8,
            start_time: row.get(1)?,
            end_time: row.get(2)?,
        })
    })?;

    let mut windows = vec![];
    for row in rows {
        windows.push(row?);
    }
    Ok(windows)
}

fn replace_windows(
    conn: &Connection,
    job_id: &str,
    windows: &[AvailabilityWindow],
) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM availability_windows WHERE job_id = ?1",
        params![job_id],
    )?;
    for w in windows {
        conn.execute(
            "INSERT INTO availability_windows (job_id, day_of_week, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![job_id, w.day_of_week as i64, w.start_time, w.end_time],
        )?;
    }
    Ok(())
}

pub fn count_future_bookings_for_job(conn: &Connection, job_id: &str) -> anyhow::Result<i64> {
    let now = Utc::now().naive_utc();
    let today = now.format(DATE_FMT).to_string();
    let time_now = now.format("%H:%M").to_string();

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE job_id = ?1 AND status != 'cancelled'
           AND (booking_date > ?2 OR (booking_date = ?2 AND booking_time > ?3))",
        params![job_id, today, time_now],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_job_row(row: &rusqlite::Row) -> anyhow::Result<Job> {
    let price_small: String = row.get(3)?;
    let price_medium: String = row.get(4)?;
    let price_large: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;

    Ok(Job {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_small: price_small.parse().unwrap_or_default(),
        price_medium: price_medium.parse().unwrap_or_default(),
        price_large: price_large.parse().unwrap_or_default(),
        duration_minutes: row.get(6)?,
        windows: vec![],
        created_at: parse_datetime_lenient(&created_at_str),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.user_id,
            booking.pet_id,
            booking.job_id,
            booking.booking_date.format(DATE_FMT).to_string(),
            booking.booking_time,
            booking.status.as_str(),
            booking.price.to_string(),
            booking.real_start.map(|t| t.format(DATETIME_FMT).to_string()),
            booking.real_end.map(|t| t.format(DATETIME_FMT).to_string()),
            booking.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A live (non-cancelled) booking already holding the exact slot, if any.
pub fn find_duplicate(
    conn: &Connection,
    pet_id: &str,
    job_id: &str,
    date: &NaiveDate,
    time: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at
         FROM bookings
         WHERE pet_id = ?1 AND job_id = ?2 AND booking_date = ?3 AND booking_time = ?4
           AND status != 'cancelled'",
        params![pet_id, job_id, date.format(DATE_FMT).to_string(), time],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at
         FROM bookings WHERE user_id = ?1 ORDER BY booking_date ASC, booking_time ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at \
             FROM bookings WHERE status = ?1 ORDER BY booking_date DESC, booking_time DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, user_id, pet_id, job_id, booking_date, booking_time, status, price, real_start, real_end, created_at \
             FROM bookings ORDER BY booking_date DESC, booking_time DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn complete_booking(
    conn: &Connection,
    id: &str,
    real_start: Option<&NaiveDateTime>,
    real_end: Option<&NaiveDateTime>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'completed', real_start = ?1, real_end = ?2 WHERE id = ?3",
        params![
            real_start.map(|t| t.format(DATETIME_FMT).to_string()),
            real_end.map(|t| t.format(DATETIME_FMT).to_string()),
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn reopen_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'scheduled', real_start = NULL, real_end = NULL WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub struct OccupiedSlot {
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub job_id: String,
}

pub fn get_occupied_slots(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<Vec<OccupiedSlot>> {
    let mut stmt = conn.prepare(
        "SELECT booking_date, booking_time, job_id FROM bookings
         WHERE booking_date >= ?1 AND booking_date <= ?2 AND status != 'cancelled'
         ORDER BY booking_date ASC, booking_time ASC",
    )?;

    let rows = stmt.query_map(
        params![
            start.format(DATE_FMT).to_string(),
            end.format(DATE_FMT).to_string()
        ],
        |row| {
            let date_str: String = row.get(0)?;
            Ok(OccupiedSlot {
                booking_date: parse_date_lenient(&date_str),
                booking_time: row.get(1)?,
                job_id: row.get(2)?,
            })
        },
    )?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(4)?;
    let status_str: String = row.get(6)?;
    let price_str: String = row.get(7)?;
    let real_start_str: Option<String> = row.get(8)?;
    let real_end_str: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        pet_id: row.get(2)?,
        job_id: row.get(3)?,
        booking_date: parse_date_lenient(&date_str),
        booking_time: row.get(5)?,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Scheduled),
        price: price_str.parse().unwrap_or_default(),
        real_start: real_start_str.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).ok()),
        real_end: real_end_str.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).ok()),
        created_at: parse_datetime_lenient(&created_at_str),
    })
}

fn parse_date_lenient(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime_lenient(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}
