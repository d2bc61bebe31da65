//! Read-only rental projection consumed by the reminder engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{CustomerId, RentalId};
use crate::timezone::Timezone;

/// An outstanding rental joined with the customer fields reminders need.
///
/// The engine never owns or mutates these; the repository hands out fresh
/// copies on every scan. Fields are optional because the underlying records
/// may be incomplete, and incompleteness is a per-rental skip, not a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalCandidate {
    pub rental_id: RentalId,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_timezone: Option<String>,
    #[serde(default)]
    pub customer_contact: Option<String>,
}

/// The evaluable subset of a [`RentalCandidate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluableRental<'a> {
    pub rental_id: RentalId,
    pub return_date: DateTime<Utc>,
    pub timezone: Timezone,
    /// Trimmed, non-blank contact if the record has one.
    pub contact: Option<&'a str>,
}

impl<'a> EvaluableRental<'a> {
    /// The contact to notify. Only required once a reminder is due.
    pub fn require_contact(&self) -> DomainResult<&'a str> {
        self.contact
            .ok_or_else(|| DomainError::missing_field("customer_contact"))
    }
}

impl RentalCandidate {
    pub fn new(rental_id: RentalId) -> Self {
        Self {
            rental_id,
            customer_id: None,
            return_date: None,
            customer_timezone: None,
            customer_contact: None,
        }
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_return_date(mut self, return_date: DateTime<Utc>) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.customer_timezone = Some(tz.into());
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.customer_contact = Some(contact.into());
        self
    }

    /// Check that the fields window classification needs are present and
    /// well-formed.
    ///
    /// Missing return date or timezone ⇒ `MissingField`; an unknown zone ⇒
    /// `InvalidTimezone`. The contact is checked later, by
    /// [`EvaluableRental::require_contact`].
    pub fn evaluable(&self) -> DomainResult<EvaluableRental<'_>> {
        let return_date = self
            .return_date
            .ok_or_else(|| DomainError::missing_field("return_date"))?;
        let timezone = Timezone::parse(self.customer_timezone.as_deref().unwrap_or_default())?;
        let contact = self
            .customer_contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        Ok(EvaluableRental {
            rental_id: self.rental_id,
            return_date,
            timezone,
            contact,
        })
    }
}
