//! Customer timezone value object.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A validated IANA timezone (e.g. `America/New_York`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(Tz);

impl Timezone {
    /// Parse an IANA identifier.
    ///
    /// A blank identifier is a missing field, not an invalid zone: the
    /// customer simply has no timezone on record.
    pub fn parse(id: &str) -> DomainResult<Self> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::missing_field("customer_timezone"));
        }
        Tz::from_str(trimmed)
            .map(Self)
            .map_err(|_| DomainError::invalid_timezone(trimmed))
    }

    pub fn utc() -> Self {
        Self(Tz::UTC)
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Calendar date of `instant` as perceived in this zone.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    /// `instant` expressed in this zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        self.0.from_utc_datetime(&instant.naive_utc())
    }
}

impl ValueObject for Timezone {}

impl core::fmt::Display for Timezone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timezone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
