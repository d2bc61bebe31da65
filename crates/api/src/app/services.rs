use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use rentwatch_infra::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    jobs::TaskRegistry,
    mail::{LogMailSender, NotificationSender},
    reminders::{NotificationDispatcher, ReminderScan},
    rentals::{InMemoryRentalRepository, RentalRepository},
};

/// Shared state handed to every handler.
pub struct AppServices {
    pub registry: Arc<TaskRegistry>,
    pub sender: Arc<dyn NotificationSender>,
}

impl AppServices {
    pub fn new(registry: Arc<TaskRegistry>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { registry, sender }
    }

    /// Wire the default runtime: in-memory rentals (optionally seeded),
    /// log-only mail transport and the system clock.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let repository = match &config.seed_file {
            Some(path) => {
                let repo = InMemoryRentalRepository::from_json_file(path)
                    .with_context(|| format!("failed to load rentals from {}", path.display()))?;
                info!(path = %path.display(), rentals = repo.len(), "loaded rental seed");
                repo
            }
            None => InMemoryRentalRepository::new(),
        };
        let repository: Arc<dyn RentalRepository> = Arc::new(repository);
        let sender: Arc<dyn NotificationSender> = Arc::new(LogMailSender::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self::wire(repository, sender, clock, config))
    }

    /// Wire services around caller-provided adapters.
    pub fn wire(
        repository: Arc<dyn RentalRepository>,
        sender: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        let scan = ReminderScan::new(repository, NotificationDispatcher::new(sender.clone()));
        let registry = TaskRegistry::with_default_tasks(scan, clock).with_scan_timeout(config.scan_timeout);
        Self::new(Arc::new(registry), sender)
    }
}
