//! Daily trigger for the named reminder tasks.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use rentwatch_core::Timezone;

use super::registry::{TaskOutcome, TaskRegistry};
use super::types::TaskName;

/// Next instant strictly after `now` at which the local clock in `tz` reads `at`.
///
/// A time that falls in a DST gap resolves to the end of the gap (the first
/// wall-clock minute that exists); an ambiguous time resolves to its
/// earliest instant.
pub fn next_fire_after(now: DateTime<Utc>, at: NaiveTime, tz: &Timezone) -> DateTime<Utc> {
    let today = tz.civil_date(now);
    (0..=3u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| resolve_local(tz, date.and_time(at)))
        .find(|candidate| *candidate > now)
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

fn resolve_local(tz: &Timezone, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    let resolved = match tz.tz().from_local_datetime(&local) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let start = local.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(local);
            (1..=24 * 60)
                .map(|m| start + chrono::Duration::minutes(m))
                .find_map(|t| tz.tz().from_local_datetime(&t).earliest())
        }
    };
    resolved.map(|t| t.with_timezone(&Utc))
}

/// Fires every registered task once per day at a fixed local time.
///
/// All tasks share one scan per tick (`TaskRegistry::trigger_many`). The
/// civil date of the last tick is remembered so a second wake-up on the same
/// day is ignored.
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
    tasks: Vec<TaskName>,
    notify_at: NaiveTime,
    timezone: Timezone,
    last_tick: Mutex<Option<NaiveDate>>,
}

impl Scheduler {
    pub fn new(registry: Arc<TaskRegistry>, notify_at: NaiveTime, timezone: Timezone) -> Self {
        let tasks = registry.names();
        Self {
            registry,
            tasks,
            notify_at,
            timezone,
            last_tick: Mutex::new(None),
        }
    }

    pub fn next_fire(&self) -> DateTime<Utc> {
        next_fire_after(self.registry.clock().now(), self.notify_at, &self.timezone)
    }

    /// Run one scheduled tick.
    ///
    /// Returns `None` when a tick already ran on today's date. Task failures
    /// are logged, never propagated: the registry already reflects them.
    pub async fn tick(&self) -> Option<Vec<TaskOutcome>> {
        let now = self.registry.clock().now();
        let today = self.timezone.civil_date(now);
        {
            let mut last = self.last_tick.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == Some(today) {
                debug!(date = %today, "scheduled tick already ran today");
                return None;
            }
            *last = Some(today);
        }

        info!(date = %today, tasks = ?self.tasks, "scheduled reminder tick");
        let names: Vec<&str> = self.tasks.iter().map(TaskName::as_str).collect();
        let outcomes = self.registry.trigger_many(&names).await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(report) => info!(
                    task = %outcome.name,
                    notified = report.notified,
                    skipped = report.skipped.len(),
                    failed = report.failed.len(),
                    "scheduled task completed"
                ),
                Err(err) => error!(task = %outcome.name, error = %err, "scheduled task failed"),
            }
        }
        Some(outcomes)
    }

    /// Spawn the scheduler loop on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let join = tokio::spawn(async move {
            info!(
                notify_at = %self.notify_at,
                timezone = %self.timezone,
                "reminder scheduler started"
            );
            loop {
                let now = self.registry.clock().now();
                let next = next_fire_after(now, self.notify_at, &self.timezone);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                debug!(next_run = %next, "next reminder tick scheduled");

                tokio::select! {
                    _ = signal.notified() => break,
                    _ = tokio::time::sleep(wait) => {
                        self.tick().await;
                    }
                }
            }
            info!("reminder scheduler stopped");
        });

        SchedulerHandle {
            shutdown,
            join: Some(join),
        }
    }
}

/// Handle to stop a spawned [`Scheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Request graceful shutdown and wait for the loop to stop.
    ///
    /// A tick in progress finishes first.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "reminder scheduler task ended abnormally");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
