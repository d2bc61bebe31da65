use std::path::Path;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use rentwatch_core::{RentalCandidate, RentalId};

use super::{RentalRepository, RepositoryError};

/// In-memory rental repository.
///
/// Intended for tests/dev. Every stored rental is considered outstanding;
/// callers remove a rental once it has been returned.
#[derive(Debug, Default)]
pub struct InMemoryRentalRepository {
    rentals: RwLock<Vec<RentalCandidate>>,
}

impl InMemoryRentalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rentals(rentals: impl IntoIterator<Item = RentalCandidate>) -> Self {
        Self {
            rentals: RwLock::new(rentals.into_iter().collect()),
        }
    }

    /// Load rentals from a JSON array of [`RentalCandidate`] records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::Seed(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RepositoryError> {
        let rentals: Vec<RentalCandidate> =
            serde_json::from_str(raw).map_err(|e| RepositoryError::Seed(e.to_string()))?;
        Ok(Self::with_rentals(rentals))
    }

    /// Insert or replace a rental by id.
    pub fn upsert(&self, rental: RentalCandidate) {
        let mut rentals = self.rentals.write().unwrap_or_else(PoisonError::into_inner);
        match rentals.iter_mut().find(|r| r.rental_id == rental.rental_id) {
            Some(existing) => *existing = rental,
            None => rentals.push(rental),
        }
    }

    /// Mark a rental as returned (removes it from the outstanding set).
    pub fn mark_returned(&self, rental_id: RentalId) -> bool {
        let mut rentals = self.rentals.write().unwrap_or_else(PoisonError::into_inner);
        let before = rentals.len();
        rentals.retain(|r| r.rental_id != rental_id);
        rentals.len() != before
    }

    pub fn len(&self) -> usize {
        self.rentals.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RentalRepository for InMemoryRentalRepository {
    async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
        Ok(self
            .rentals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
