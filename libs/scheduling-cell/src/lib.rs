pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod slot;

pub use models::*;
pub use router::scheduling_routes;
pub use services::*;
pub use slot::{parse_scheduled_at, SlotKey};
