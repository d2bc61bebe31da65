//! One reminder pass over the outstanding rental set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use rentwatch_core::{DomainError, RentalCandidate, RentalId, ReminderWindow, classify};

use crate::rentals::{RentalRepository, RepositoryError};

use super::dispatcher::{DispatchError, NotificationDispatcher};

/// Job-level scan failure. Per-rental problems never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("rental repository unavailable: {0}")]
    RepositoryUnavailable(String),
}

impl From<RepositoryError> for ScanError {
    fn from(err: RepositoryError) -> Self {
        ScanError::RepositoryUnavailable(err.to_string())
    }
}

/// A rental that was sent a reminder during the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notified {
    pub rental_id: RentalId,
    pub window: ReminderWindow,
    pub message_id: String,
}

/// Outcome of one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Rentals fetched from the repository.
    pub evaluated: usize,
    /// Reminders accepted by the sender.
    pub notified: usize,
    pub notifications: Vec<Notified>,
    /// Rentals that could not be evaluated (missing field, invalid timezone).
    pub skipped: Vec<(RentalId, DomainError)>,
    /// Rentals whose reminder could not be dispatched.
    pub failed: Vec<(RentalId, DispatchError)>,
}

impl ScanReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            scan_id: Uuid::now_v7(),
            started_at,
            evaluated: 0,
            notified: 0,
            notifications: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn notified_in(&self, window: ReminderWindow) -> usize {
        self.notifications.iter().filter(|n| n.window == window).count()
    }
}

/// Orchestrates repository fetch, window evaluation and dispatch.
#[derive(Clone)]
pub struct ReminderScan {
    repository: Arc<dyn RentalRepository>,
    dispatcher: NotificationDispatcher,
}

impl ReminderScan {
    pub fn new(repository: Arc<dyn RentalRepository>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Scan and notify for every reminder window.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ScanReport, ScanError> {
        self.run_for(now, &ReminderWindow::ALL).await
    }

    /// Scan and notify only rentals falling in one of `windows`.
    ///
    /// Rentals in a window outside `windows` are evaluated but left alone.
    /// Only a repository failure aborts the pass.
    pub async fn run_for(
        &self,
        now: DateTime<Utc>,
        windows: &[ReminderWindow],
    ) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::new(now);
        info!(scan_id = %report.scan_id, windows = ?windows, "reminder scan started");

        let rentals = match self.repository.fetch_outstanding().await {
            Ok(rentals) => rentals,
            Err(err) => {
                warn!(scan_id = %report.scan_id, error = %err, "reminder scan aborted");
                return Err(err.into());
            }
        };

        for rental in &rentals {
            report.evaluated += 1;
            self.process(rental, now, windows, &mut report).await;
        }

        info!(
            scan_id = %report.scan_id,
            evaluated = report.evaluated,
            notified = report.notified,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "reminder scan finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        rental: &RentalCandidate,
        now: DateTime<Utc>,
        windows: &[ReminderWindow],
        report: &mut ScanReport,
    ) {
        let evaluable = match rental.evaluable() {
            Ok(e) => e,
            Err(reason) => {
                warn!(
                    scan_id = %report.scan_id,
                    rental_id = %rental.rental_id,
                    reason = %reason,
                    "rental skipped"
                );
                report.skipped.push((rental.rental_id, reason));
                return;
            }
        };

        let Some(window) = classify(evaluable.return_date, &evaluable.timezone, now) else {
            return;
        };
        if !windows.contains(&window) {
            return;
        }
        let contact = match evaluable.require_contact() {
            Ok(c) => c,
            Err(reason) => {
                warn!(
                    scan_id = %report.scan_id,
                    rental_id = %rental.rental_id,
                    window = %window,
                    reason = %reason,
                    "rental skipped"
                );
                report.skipped.push((rental.rental_id, reason));
                return;
            }
        };

        info!(
            scan_id = %report.scan_id,
            rental_id = %evaluable.rental_id,
            window = %window,
            contact = %contact,
            "sending rental reminder"
        );

        let due = evaluable.timezone.localize(evaluable.return_date);
        match self
            .dispatcher
            .dispatch(contact, window, evaluable.rental_id, &due)
            .await
        {
            Ok(ack) => {
                report.notified += 1;
                report.notifications.push(Notified {
                    rental_id: evaluable.rental_id,
                    window,
                    message_id: ack.message_id,
                });
            }
            Err(err) => report.failed.push((evaluable.rental_id, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::InMemoryMailSender;
    use crate::rentals::InMemoryRentalRepository;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    struct DownRepository;

    #[async_trait]
    impl RentalRepository for DownRepository {
        async fn fetch_outstanding(&self) -> Result<Vec<RentalCandidate>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".into()))
        }
    }

    fn ny(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        chrono_tz::America::New_York
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn local(tz: Tz, y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().with_timezone(&Utc)
    }

    fn rental(id: i64, return_date: DateTime<Utc>, tz: &str, contact: &str) -> RentalCandidate {
        RentalCandidate::new(RentalId::new(id))
            .with_return_date(return_date)
            .with_timezone(tz)
            .with_contact(contact)
    }

    fn scan_over(
        rentals: Vec<RentalCandidate>,
    ) -> (ReminderScan, Arc<InMemoryMailSender>) {
        let sender = Arc::new(InMemoryMailSender::new());
        let scan = ReminderScan::new(
            Arc::new(InMemoryRentalRepository::with_rentals(rentals)),
            NotificationDispatcher::new(sender.clone()),
        );
        (scan, sender)
    }

    #[tokio::test]
    async fn five_days_out_is_notified_once() {
        let (scan, sender) = scan_over(vec![rental(
            1,
            ny(2024, 11, 27, 0),
            "America/New_York",
            "mary@example.com",
        )]);

        let report = scan.run(ny(2024, 11, 22, 9)).await.unwrap();

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(report.notifications[0].window, ReminderWindow::FiveDaysOut);
        assert_eq!(sender.sent().len(), 1);
        assert!(sender.sent()[0].subject.contains("5 days"));
    }

    #[tokio::test]
    async fn empty_timezone_is_skipped_without_stopping_the_pass() {
        let (scan, sender) = scan_over(vec![
            rental(1, ny(2024, 11, 25, 12), "America/New_York", "mary@example.com"),
            rental(2, ny(2024, 11, 25, 12), "", "patricia@example.com"),
        ]);

        let report = scan.run(ny(2024, 11, 22, 9)).await.unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.notifications[0].window, ReminderWindow::ThreeDaysOut);
        assert_eq!(
            report.skipped,
            vec![(RentalId::new(2), DomainError::missing_field("customer_timezone"))]
        );
        assert!(report.failed.is_empty());
        assert!(sender.sent_to("patricia@example.com").is_empty());
    }

    #[tokio::test]
    async fn invalid_timezone_and_missing_date_are_skipped() {
        let mut no_date = rental(3, ny(2024, 11, 27, 0), "America/New_York", "c@example.com");
        no_date.return_date = None;

        let (scan, _sender) = scan_over(vec![
            rental(1, ny(2024, 11, 27, 0), "Atlantis/Capital", "a@example.com"),
            no_date,
            rental(4, ny(2024, 11, 27, 0), "America/New_York", "d@example.com"),
        ]);

        let report = scan.run(ny(2024, 11, 22, 9)).await.unwrap();

        assert_eq!(report.notified, 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().any(|(id, e)| *id == RentalId::new(1)
            && matches!(e, DomainError::InvalidTimezone(_))));
        assert!(report.skipped.iter().any(|(id, e)| *id == RentalId::new(3)
            && matches!(e, DomainError::MissingField(_))));
    }

    #[tokio::test]
    async fn missing_contact_only_matters_inside_a_window() {
        let now = ny(2024, 11, 22, 9);
        let mut far = rental(1, ny(2024, 12, 2, 9), "America/New_York", "x");
        far.customer_contact = None;

        let (scan, _sender) = scan_over(vec![far.clone()]);
        let report = scan.run(now).await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.notified, 0);

        let mut due = far;
        due.return_date = Some(ny(2024, 11, 27, 9));
        let (scan, sender) = scan_over(vec![due]);
        let report = scan.run(now).await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(
            report.skipped,
            vec![(RentalId::new(1), DomainError::missing_field("customer_contact"))]
        );
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_contact_outside_requested_windows_is_not_skipped() {
        let mut due = rental(1, ny(2024, 11, 27, 9), "America/New_York", "x");
        due.customer_contact = Some("   ".into());
        let (scan, _sender) = scan_over(vec![due]);

        let report = scan
            .run_for(ny(2024, 11, 22, 9), &[ReminderWindow::ThreeDaysOut])
            .await
            .unwrap();

        assert_eq!(report.evaluated, 1);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_is_recorded_and_pass_continues() {
        let (scan, sender) = scan_over(vec![
            rental(1, ny(2024, 11, 27, 0), "America/New_York", "bounce@example.com"),
            rental(2, ny(2024, 11, 27, 0), "America/New_York", "ok@example.com"),
        ]);
        sender.reject("bounce@example.com");

        let report = scan.run(ny(2024, 11, 22, 9)).await.unwrap();

        assert_eq!(report.notified, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, RentalId::new(1));
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn each_customer_uses_their_own_calendar() {
        // Same absolute "now"; the Tokyo customer is already a day ahead.
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 20, 0, 0).unwrap();
        let (scan, _sender) = scan_over(vec![
            rental(1, local(chrono_tz::Asia::Tokyo, 2024, 6, 16, 10), "Asia/Tokyo", "tokyo@example.com"),
            rental(2, local(chrono_tz::America::Los_Angeles, 2024, 6, 15, 10), "America/Los_Angeles", "la@example.com"),
        ]);

        let report = scan.run(now).await.unwrap();

        assert_eq!(report.notified, 2);
        assert!(report.notifications.iter().all(|n| n.window == ReminderWindow::FiveDaysOut));
    }

    #[tokio::test]
    async fn run_for_only_notifies_requested_windows() {
        let (scan, sender) = scan_over(vec![
            rental(1, ny(2024, 11, 27, 0), "America/New_York", "five@example.com"),
            rental(2, ny(2024, 11, 25, 0), "America/New_York", "three@example.com"),
        ]);

        let report = scan
            .run_for(ny(2024, 11, 22, 9), &[ReminderWindow::ThreeDaysOut])
            .await
            .unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.notified_in(ReminderWindow::ThreeDaysOut), 1);
        assert!(sender.sent_to("five@example.com").is_empty());
    }

    #[tokio::test]
    async fn repository_failure_is_job_level() {
        let scan = ReminderScan::new(
            Arc::new(DownRepository),
            NotificationDispatcher::new(Arc::new(InMemoryMailSender::new())),
        );

        let err = scan.run(Utc::now()).await.unwrap_err();
        assert!(matches!(err, ScanError::RepositoryUnavailable(msg) if msg.contains("connection refused")));
    }
}
