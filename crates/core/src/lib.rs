//! `rentwatch-core` — domain building blocks for rental-return reminders.
//!
//! This crate contains **pure domain** code (no IO, no clocks): identifiers,
//! the customer timezone value object, the rental projection and the
//! reminder window evaluator.

pub mod error;
pub mod id;
pub mod rental;
pub mod timezone;
pub mod value_object;
pub mod window;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, RentalId};
pub use rental::{EvaluableRental, RentalCandidate};
pub use timezone::Timezone;
pub use value_object::ValueObject;
pub use window::{ReminderWindow, civil_days_until, classify, evaluate};
