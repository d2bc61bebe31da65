//! Infrastructure layer: clocks, config, repositories, mail transport,
//! the reminder scan and the task runtime around it.

pub mod clock;
pub mod config;
pub mod jobs;
pub mod mail;
pub mod reminders;
pub mod rentals;
