//! Response bodies.

mod errors;
mod monitors;

pub use errors::ErrorResponse;
pub use monitors::HealthStatus;
