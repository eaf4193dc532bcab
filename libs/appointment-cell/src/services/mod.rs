pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod saga;
pub mod store;

pub use booking::BookingEngine;
pub use conflict::ConflictDetectionService;
pub use lifecycle::{valid_transitions, validate_status_transition};
pub use saga::Saga;
pub use store::{AppointmentStore, BookedResource, InMemoryAppointmentStore, SupabaseAppointmentStore};
