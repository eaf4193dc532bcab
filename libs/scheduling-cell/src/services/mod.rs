pub mod availability;
pub mod memory_store;
pub mod store;
pub mod supabase_store;

pub use availability::AvailabilityService;
pub use memory_store::InMemoryAvailabilityStore;
pub use store::AvailabilityStore;
pub use supabase_store::SupabaseAvailabilityStore;
