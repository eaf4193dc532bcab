pub mod directory;
pub mod resolver;

pub use directory::{InMemoryTenantDirectory, SupabaseTenantDirectory, TenantDirectory};
pub use resolver::TenantResolver;
