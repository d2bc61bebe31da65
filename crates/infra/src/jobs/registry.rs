//! Process-wide status tracker for the named reminder tasks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{error, info, warn};

use rentwatch_core::ReminderWindow;

use crate::clock::Clock;
use crate::reminders::{ReminderScan, ScanReport};

use super::types::{TaskDefinition, TaskError, TaskName, TaskStatus};

/// Default soft bound on one scan.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct TaskEntry {
    window: ReminderWindow,
    status: TaskStatus,
}

/// Outcome of one task within a (possibly shared) trigger.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub name: TaskName,
    pub result: Result<ScanReport, TaskError>,
}

/// Owns the status of every named task and runs their scans.
///
/// - Membership is fixed at construction; names are never added or removed.
/// - A task that is `Running` rejects further triggers with `TaskBusy`.
/// - Readers get snapshots; the status map never leaves this type.
pub struct TaskRegistry {
    tasks: Mutex<BTreeMap<TaskName, TaskEntry>>,
    scan: ReminderScan,
    clock: Arc<dyn Clock>,
    scan_timeout: Duration,
}

impl TaskRegistry {
    /// Create a registry with every definition `Pending`.
    pub fn new(
        definitions: impl IntoIterator<Item = TaskDefinition>,
        scan: ReminderScan,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tasks = definitions
            .into_iter()
            .map(|d| {
                (
                    d.name,
                    TaskEntry {
                        window: d.window,
                        status: TaskStatus::Pending,
                    },
                )
            })
            .collect();

        Self {
            tasks: Mutex::new(tasks),
            scan,
            clock,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    /// Registry with the default `J-5`/`J-3` tasks.
    pub fn with_default_tasks(scan: ReminderScan, clock: Arc<dyn Clock>) -> Self {
        Self::new(TaskDefinition::defaults(), scan, clock)
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TaskName, TaskEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status<'n>(&self, names: impl Iterator<Item = &'n TaskName>, status: TaskStatus) {
        let mut tasks = self.lock();
        for name in names {
            if let Some(entry) = tasks.get_mut(name) {
                entry.status = status;
            }
        }
    }

    /// Current status of `name`.
    pub fn status(&self, name: &str) -> Result<TaskStatus, TaskError> {
        self.lock()
            .get(name)
            .map(|e| e.status)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))
    }

    /// Snapshot of every registered task.
    pub fn list_all(&self) -> BTreeMap<TaskName, TaskStatus> {
        self.lock()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.status))
            .collect()
    }

    pub fn names(&self) -> Vec<TaskName> {
        self.lock().keys().cloned().collect()
    }

    /// Run the scan for one task and settle its status.
    ///
    /// Job-level errors are recorded as `Failed` and returned.
    pub async fn trigger(&self, name: &str) -> Result<ScanReport, TaskError> {
        info!(task = %name, "triggering task");
        let mut outcomes = self.trigger_many(&[name]).await;
        // One outcome per requested name, always.
        debug_assert_eq!(outcomes.len(), 1);
        outcomes
            .pop()
            .map(|o| o.result)
            .unwrap_or_else(|| Err(TaskError::UnknownTask(name.to_string())))
    }

    /// Trigger several tasks with a single shared scan.
    ///
    /// Unknown and busy names are rejected up front and get their own
    /// outcome; the remaining tasks are claimed, one scan covers all of their
    /// windows, and every claimed task observes the same result.
    pub async fn trigger_many(&self, names: &[&str]) -> Vec<TaskOutcome> {
        let now = self.clock.now();
        let mut outcomes = Vec::with_capacity(names.len());
        let mut claim = Claim::new(self);

        {
            let mut tasks = self.lock();
            for &name in names {
                match tasks.get_mut(name) {
                    None => {
                        warn!(task = %name, "unknown task");
                        outcomes.push(TaskOutcome {
                            name: TaskName::new(name),
                            result: Err(TaskError::UnknownTask(name.to_string())),
                        });
                    }
                    Some(entry) if entry.status.is_running() => {
                        warn!(task = %name, "task already running");
                        outcomes.push(TaskOutcome {
                            name: TaskName::new(name),
                            result: Err(TaskError::TaskBusy(name.to_string())),
                        });
                    }
                    Some(entry) => {
                        entry.status = TaskStatus::Running;
                        claim.push(TaskName::new(name), entry.window);
                    }
                }
            }
        }

        if claim.is_empty() {
            return outcomes;
        }

        let windows = claim.windows();
        let result = match tokio::time::timeout(self.scan_timeout, self.scan.run_for(now, &windows)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(err)) => Err(TaskError::from(err)),
            Err(_) => Err(TaskError::Timeout(self.scan_timeout)),
        };

        outcomes.extend(claim.settle(&result).into_iter().map(|name| TaskOutcome {
            name,
            result: result.clone(),
        }));
        outcomes
    }
}

/// Tasks moved to `Running` by one trigger.
///
/// Settles them on completion; if the trigger future is dropped mid-scan
/// (caller cancelled), the claimed tasks are marked `Failed` so nothing stays
/// `Running` forever.
struct Claim<'a> {
    registry: &'a TaskRegistry,
    tasks: Vec<(TaskName, ReminderWindow)>,
}

impl<'a> Claim<'a> {
    fn new(registry: &'a TaskRegistry) -> Self {
        Self {
            registry,
            tasks: Vec::new(),
        }
    }

    fn push(&mut self, name: TaskName, window: ReminderWindow) {
        self.tasks.push((name, window));
    }

    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn windows(&self) -> Vec<ReminderWindow> {
        let mut windows: Vec<_> = self.tasks.iter().map(|(_, w)| *w).collect();
        windows.sort();
        windows.dedup();
        windows
    }

    fn settle(mut self, result: &Result<ScanReport, TaskError>) -> Vec<TaskName> {
        let status = match result {
            Ok(_) => TaskStatus::Completed,
            Err(_) => TaskStatus::Failed,
        };
        let tasks = std::mem::take(&mut self.tasks);
        self.registry.set_status(tasks.iter().map(|(n, _)| n), status);

        for (name, _) in &tasks {
            match result {
                Ok(report) => info!(
                    task = %name,
                    scan_id = %report.scan_id,
                    notified = report.notified,
                    "task completed"
                ),
                Err(err) => error!(task = %name, error = %err, "task failed"),
            }
        }
        tasks.into_iter().map(|(n, _)| n).collect()
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for (name, _) in &self.tasks {
            warn!(task = %name, "task run abandoned before completion");
        }
        self.registry
            .set_status(self.tasks.iter().map(|(n, _)| n), TaskStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Notify;

    use rentwatch_core::{RentalCandidate, RentalId};

    use crate::clock::FixedClock;
    use crate::mail::InMemoryMailSender;
    use crate::reminders::NotificationDispatcher;
    use crate::rentals::{InMemoryRentalRepository, RentalRepository, RepositoryError};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 22, 14, 0, 0).unwrap()
    }

    fn registry_over(repo: Arc<dyn RentalRepository>) -> (TaskRegistry, Arc<InMemoryMailSender>) {
        let sender = Arc::new(InMemoryMailSender::new());
        let scan = ReminderScan::new(repo, NotificationDispatcher::new(sender.clone()));
        let registry = TaskRegistry::with_default_tasks(scan, Arc::new(FixedClock::new(now())));
        (registry, sender)
    }

    fn due_in(days: i64, id: i64) -> RentalCandidate {
        RentalCandidate::new(RentalId::new(id))
            .with_return_date(now() + chrono::Duration::days(days))
            .with_timezone("UTC")
            .with_contact(format!("c{id}@example.com"))
    }

    /// Repository that blocks until released.
    #[derive(Default)]
    struct GatedRepository {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RentalRepository for GatedRepository {
        async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![])
        }
    }

    /// Repository that fails until `up` is set, counting calls.
    #[derive(Default)]
    struct FlakyRepository {
        calls: AtomicUsize,
        up: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl RentalRepository for FlakyRepository {
        async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.up.load(Ordering::SeqCst) {
                Ok(vec![due_in(5, 1), due_in(3, 2)])
            } else {
                Err(RepositoryError::Unavailable("db down".into()))
            }
        }
    }

    /// Repository whose first fetch blocks until released; later fetches
    /// return immediately.
    #[derive(Default)]
    struct FirstFetchGated {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RentalRepository for FirstFetchGated {
        async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(vec![due_in(5, 1), due_in(3, 2)])
        }
    }

    struct HangingRepository;

    #[async_trait]
    impl RentalRepository for HangingRepository {
        async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
            std::future::pending().await
        }
    }

    #[test]
    fn starts_with_fixed_pending_tasks() {
        let (registry, _) = registry_over(Arc::new(InMemoryRentalRepository::new()));
        let all = registry.list_all();

        assert_eq!(all.len(), 2);
        assert_eq!(all.get("J-5"), Some(&TaskStatus::Pending));
        assert_eq!(all.get("J-3"), Some(&TaskStatus::Pending));
    }

    #[tokio::test]
    async fn unknown_task_is_rejected() {
        let (registry, _) = registry_over(Arc::new(InMemoryRentalRepository::new()));

        assert_eq!(registry.status("unknown"), Err(TaskError::UnknownTask("unknown".into())));
        assert!(matches!(
            registry.trigger("J-7").await,
            Err(TaskError::UnknownTask(name)) if name == "J-7"
        ));
        assert_eq!(registry.list_all().len(), 2);
    }

    #[tokio::test]
    async fn trigger_only_sends_its_own_window() {
        let repo = InMemoryRentalRepository::with_rentals(vec![due_in(5, 1), due_in(3, 2)]);
        let (registry, sender) = registry_over(Arc::new(repo));

        let report = registry.trigger("J-5").await.unwrap();

        assert_eq!(report.notified, 1);
        assert_eq!(sender.sent_to("c1@example.com").len(), 1);
        assert!(sender.sent_to("c2@example.com").is_empty());
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Completed));
        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Pending));
    }

    #[tokio::test]
    async fn failure_is_recorded_and_next_run_recovers() {
        let repo = Arc::new(FlakyRepository::default());
        let (registry, _) = registry_over(repo.clone());

        let err = registry.trigger("J-3").await.unwrap_err();
        assert!(matches!(err, TaskError::RepositoryUnavailable(_)));
        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Failed));

        repo.up.store(true, Ordering::SeqCst);
        let report = registry.trigger("J-3").await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn concurrent_trigger_observes_busy() {
        let repo = Arc::new(GatedRepository::default());
        let (registry, _) = registry_over(repo.clone());
        let registry = Arc::new(registry);

        let first = tokio::spawn({
            let registry = registry.clone();
            async move { registry.trigger("J-5").await }
        });
        repo.entered.notified().await;
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Running));

        let second = registry.trigger("J-5").await;
        assert_eq!(second.unwrap_err(), TaskError::TaskBusy("J-5".into()));

        repo.release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_scan_times_out_as_failed() {
        let (registry, _) = registry_over(Arc::new(HangingRepository));
        let registry = registry.with_scan_timeout(Duration::from_secs(30));

        let err = registry.trigger("J-5").await.unwrap_err();

        assert_eq!(err, TaskError::Timeout(Duration::from_secs(30)));
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Failed));
    }

    #[tokio::test]
    async fn trigger_many_shares_one_scan() {
        let repo = Arc::new(FlakyRepository::default());
        repo.up.store(true, Ordering::SeqCst);
        let (registry, sender) = registry_over(repo.clone());

        let outcomes = registry.trigger_many(&["J-5", "J-3"]).await;

        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes.len(), 2);
        let ids: Vec<_> = outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().scan_id)
            .collect();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(sender.sent().len(), 2);
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Completed));
        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn shared_trigger_skips_busy_task_and_runs_the_rest() {
        let repo = Arc::new(FirstFetchGated::default());
        let (registry, sender) = registry_over(repo.clone());
        let registry = Arc::new(registry);

        let manual = tokio::spawn({
            let registry = registry.clone();
            async move { registry.trigger("J-5").await }
        });
        repo.entered.notified().await;

        let outcomes = registry.trigger_many(&["J-5", "J-3"]).await;

        assert_eq!(outcomes.len(), 2);
        let j5 = outcomes.iter().find(|o| o.name.as_str() == "J-5").unwrap();
        assert_eq!(j5.result, Err(TaskError::TaskBusy("J-5".into())));
        let j3 = outcomes.iter().find(|o| o.name.as_str() == "J-3").unwrap();
        let report = j3.result.as_ref().unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(report.notified_in(ReminderWindow::ThreeDaysOut), 1);
        assert_eq!(sender.sent_to("c2@example.com").len(), 1);
        assert!(sender.sent_to("c1@example.com").is_empty());
        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Completed));
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Running));

        repo.release.notify_one();
        assert!(manual.await.unwrap().is_ok());
        assert_eq!(registry.status("J-5"), Ok(TaskStatus::Completed));
        assert_eq!(sender.sent_to("c1@example.com").len(), 1);
        assert_eq!(sender.sent().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_trigger_does_not_leave_task_running() {
        let repo = Arc::new(GatedRepository::default());
        let (registry, _) = registry_over(repo.clone());
        let registry = Arc::new(registry);

        let run = tokio::spawn({
            let registry = registry.clone();
            async move { registry.trigger("J-3").await }
        });
        repo.entered.notified().await;
        run.abort();
        let _ = run.await;

        assert_eq!(registry.status("J-3"), Ok(TaskStatus::Failed));
    }
}
