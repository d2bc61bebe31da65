//! Rental-return reminder engine.
//!
//! ## Components
//!
//! - `NotificationDispatcher`: renders the J-5/J-3 templates and makes one
//!   send attempt through the `NotificationSender` port
//! - `ReminderScan`: one pass over the outstanding rentals; per-rental
//!   failures are collected in the `ScanReport`, only a repository failure
//!   aborts the pass
//!
//! The scan keeps no "already notified" state. At most one reminder per
//! rental per window per day relies on callers running at most one scan per
//! calendar day (see `jobs::Scheduler`).

pub mod dispatcher;
pub mod scan;

pub use dispatcher::{DispatchError, NotificationDispatcher, ReminderMessage};
pub use scan::{Notified, ReminderScan, ScanError, ScanReport};
