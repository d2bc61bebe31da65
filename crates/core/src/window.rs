//! Reminder windows and the pure window evaluator.
//!
//! The window of a rental is derived, never stored: it is a function of the
//! return instant, the customer's timezone and "now". Both instants are
//! projected onto the customer's calendar and the difference is counted in
//! whole civil days, so daylight-saving shifts never move a rental in or out
//! of a window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;
use crate::timezone::Timezone;

/// A named reminder window.
///
/// "No window" is `Option::None` at the call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReminderWindow {
    /// Return date is exactly 5 civil days ahead (`J-5`).
    FiveDaysOut,
    /// Return date is exactly 3 civil days ahead (`J-3`).
    ThreeDaysOut,
}

impl ReminderWindow {
    pub const ALL: [ReminderWindow; 2] = [ReminderWindow::FiveDaysOut, ReminderWindow::ThreeDaysOut];

    /// Days remaining before the return date for this window.
    pub const fn days_before(&self) -> i64 {
        match self {
            ReminderWindow::FiveDaysOut => 5,
            ReminderWindow::ThreeDaysOut => 3,
        }
    }

    /// Task label used by the status surface (`"J-5"`, `"J-3"`).
    pub const fn label(&self) -> &'static str {
        match self {
            ReminderWindow::FiveDaysOut => "J-5",
            ReminderWindow::ThreeDaysOut => "J-3",
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.days_before() == days)
    }
}

impl core::fmt::Display for ReminderWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole civil days from `now` to `return_date` on the calendar of `tz`.
pub fn civil_days_until(return_date: DateTime<Utc>, tz: &Timezone, now: DateTime<Utc>) -> i64 {
    tz.civil_date(return_date)
        .signed_duration_since(tz.civil_date(now))
        .num_days()
}

/// Classify a return date against `now` in an already-validated zone.
pub fn classify(return_date: DateTime<Utc>, tz: &Timezone, now: DateTime<Utc>) -> Option<ReminderWindow> {
    ReminderWindow::from_days(civil_days_until(return_date, tz, now))
}

/// Evaluate the reminder window for a raw timezone identifier.
///
/// Fails with `InvalidTimezone` for unknown zones and `MissingField` for a
/// blank identifier.
pub fn evaluate(return_date: DateTime<Utc>, timezone: &str, now: DateTime<Utc>) -> DomainResult<Option<ReminderWindow>> {
    let tz = Timezone::parse(timezone)?;
    Ok(classify(return_date, &tz, now))
}
