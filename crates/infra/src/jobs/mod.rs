//! Named reminder tasks and their daily schedule.
//!
//! ## Design
//!
//! - Two tasks, `J-5` and `J-3`, each bound to one reminder window
//! - A task runs at most once at a time; a second trigger is rejected
//! - Status lives in process memory and resets to `Pending` on restart
//!
//! ## Components
//!
//! - `TaskRegistry`: status map, manual triggers, scan timeout
//! - `Scheduler`: fires every task once per day at a configured local time
//! - `SchedulerHandle`: graceful shutdown of the spawned scheduler loop

pub mod registry;
pub mod scheduler;
pub mod types;

pub use registry::{DEFAULT_SCAN_TIMEOUT, TaskOutcome, TaskRegistry};
pub use scheduler::{Scheduler, SchedulerHandle, next_fire_after};
pub use types::{TaskDefinition, TaskError, TaskName, TaskStatus};
