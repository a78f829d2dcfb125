pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "lease_accounting")]
pub mod lease_accounting;

pub use error::LeaseError;
pub use types::*;

/// Standard result type for all lease calculations
pub type LeaseResult<T> = Result<T, LeaseError>;
