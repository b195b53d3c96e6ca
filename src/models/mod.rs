pub mod availability;
pub mod booking;
pub mod job;
pub mod pet;
pub mod user;

pub use availability::AvailabilityWindow;
pub use booking::{Booking, BookingStatus};
pub use job::Job;
pub use pet::{Pet, PetSize};
pub use user::{Role, User};
