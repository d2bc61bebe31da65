//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. In this crate a
/// customer's [`Timezone`](crate::Timezone) is a value object: two rentals
/// whose customers live in `Europe/Paris` share the same zone, nothing more.
///
/// The trait requires `Clone`, `PartialEq` and `Debug` so value objects can be
/// copied around freely, compared in tests and logged.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
