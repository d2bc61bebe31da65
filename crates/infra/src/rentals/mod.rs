//! Rental repository port.
//!
//! The reminder engine only reads: it asks for the outstanding rental set
//! once per scan. What "outstanding" means (not yet returned, active
//! customer, ...) is the repository's business, not the engine's.

use async_trait::async_trait;
use thiserror::Error;

use rentwatch_core::RentalCandidate;

pub mod in_memory;

pub use in_memory::InMemoryRentalRepository;

/// Read access to outstanding rentals.
#[async_trait]
pub trait RentalRepository: Send + Sync {
    /// Fetch every rental the repository considers outstanding.
    async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError>;
}

/// Repository error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached; fatal for the current scan.
    #[error("rental repository unavailable: {0}")]
    Unavailable(String),
    /// Seed data could not be loaded.
    #[error("invalid seed data: {0}")]
    Seed(String),
}
