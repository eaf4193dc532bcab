pub mod middleware;
pub mod models;
pub mod services;

pub use middleware::tenant_context_middleware;
pub use models::*;
pub use services::*;
