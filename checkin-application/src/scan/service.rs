use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use checkin_domain::{
    loading_view, project, sanitize_text, status_error_view, AttendeeCode, AttendeeRecord,
    AttendeeStore, AttendeeView, IdentitySnapshot, LockLease, Notice, OperatorSession, ScanError,
    ScanEvent, ScanIntent, ScanMode, ScanRequest, ScanSource, UNKNOWN_OPERATOR,
};

use crate::ops::BoardSnapshot;
use crate::{Metrics, ScanBoard, ScanGate};

const MAX_OPERATOR_NAME: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    pub step_timeout: Duration,
    pub lock_safety: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            step_timeout: checkin_domain::DEFAULT_STEP_TIMEOUT,
            lock_safety: checkin_domain::DEFAULT_LOCK_SAFETY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotAttempted,
    Sent,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub code: String,
    pub mode: ScanMode,
    pub intent: ScanIntent,
    pub view: AttendeeView,
    pub record: Option<AttendeeRecord>,
    pub event: Option<ScanEvent>,
    pub submission: SubmissionStatus,
    pub notices: Vec<Notice>,
    pub issues: Vec<ScanError>,
}

impl ScanOutcome {
    fn new(code: &AttendeeCode, mode: ScanMode, intent: ScanIntent) -> Self {
        Self {
            code: code.as_str().to_string(),
            mode,
            intent,
            view: loading_view(code),
            record: None,
            event: None,
            submission: SubmissionStatus::NotAttempted,
            notices: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// Runs the scan pipeline: lock, status, identity, render, submit, unlock.
/// Steps within one run never interleave; runs never overlap.
pub struct ScanService {
    store: Arc<dyn AttendeeStore>,
    gate: ScanGate,
    board: Arc<ScanBoard>,
    metrics: Arc<Metrics>,
    mode: RwLock<ScanMode>,
    session: RwLock<OperatorSession>,
    step_timeout: Duration,
}

impl ScanService {
    pub fn new(
        store: Arc<dyn AttendeeStore>,
        board: Arc<ScanBoard>,
        metrics: Arc<Metrics>,
        settings: ScanSettings,
    ) -> Self {
        let gate = ScanGate::new(settings.lock_safety, Arc::clone(&board), Arc::clone(&metrics));
        Self {
            store,
            gate,
            board,
            metrics,
            mode: RwLock::new(ScanMode::default()),
            session: RwLock::new(OperatorSession::default()),
            step_timeout: settings.step_timeout,
        }
    }

    pub fn mode(&self) -> ScanMode {
        *self.mode.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn set_mode(&self, mode: ScanMode) -> BoardSnapshot {
        *self.mode.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
        info!(mode = %mode, "scan mode switched");
        self.board.update(|board| board.mode = mode).await
    }

    pub fn session(&self) -> OperatorSession {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_operator(&self, user_name: &str, ip: &str) -> OperatorSession {
        let name = sanitize_text(user_name, MAX_OPERATOR_NAME);
        let session = OperatorSession {
            user_name: if name.is_empty() {
                UNKNOWN_OPERATOR.to_string()
            } else {
                name
            },
            ip: ip.to_string(),
        };
        *self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = session.clone();
        session
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_held()
    }

    /// Camera decode callback. Dropped without a trace while a run is active.
    pub fn accept_camera_decode(self: &Arc<Self>, text: String) -> bool {
        if self.gate.is_held() {
            self.metrics.record_drop();
            debug!("camera decode dropped: scan lock held");
            return false;
        }
        self.spawn(ScanRequest::camera(text));
        true
    }

    /// Runs `request` on its own task. Dropping the handle abandons only the
    /// wait; the run still submits and releases the lock.
    pub fn spawn(
        self: &Arc<Self>,
        request: ScanRequest,
    ) -> JoinHandle<Result<ScanOutcome, ScanError>> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.handle(request).await })
    }

    pub async fn handle(&self, request: ScanRequest) -> Result<ScanOutcome, ScanError> {
        let Some(lease) = self.gate.acquire() else {
            self.metrics.record_drop();
            if request.source == ScanSource::Manual {
                info!("manual scan rejected: scan lock held");
                self.board
                    .update(|board| {
                        board.notices.push(Notice::warning(
                            "Please wait, the previous scan is still being processed.",
                        ))
                    })
                    .await;
            } else {
                debug!("camera decode dropped: scan lock held");
            }
            return Err(ScanError::LockBusy);
        };

        let code = match AttendeeCode::parse(&request.text) {
            Ok(code) => code,
            Err(err) => {
                self.gate.release(lease);
                warn!(source = ?request.source, error = %err, "rejected scan input");
                let message = format!("Invalid code: {}", err);
                self.board
                    .update(|board| board.notices = vec![Notice::warning(message)])
                    .await;
                return Err(ScanError::InvalidCode(err.to_string()));
            }
        };

        let outcome = self.run(lease, code, request.intent).await;
        self.finish(lease, &outcome).await;
        Ok(outcome)
    }

    async fn run(&self, lease: LockLease, code: AttendeeCode, intent: ScanIntent) -> ScanOutcome {
        let mode = self.mode();
        let session = self.session();
        self.metrics.record_scan();
        info!(code = %code, mode = %mode, intent = ?intent, operator = %session.user_name, "scan started");

        let mut outcome = ScanOutcome::new(&code, mode, intent);
        let placeholder = outcome.view.clone();
        self.publish(lease, |board| {
            board.view = Some(placeholder);
            board.notices.clear();
            board.scanning = true;
            board.input_enabled = false;
        })
        .await;

        let event = match intent {
            ScanIntent::Lookup => None,
            ScanIntent::Submit if mode == ScanMode::GoodieBag && !code.is_goodie_bag_eligible() => {
                warn!(code = %code, "code not eligible for a goodie bag, showing details only");
                outcome.notices.push(Notice::warning(format!(
                    "Code {} is not eligible for a goodie bag. Showing attendee details only.",
                    code
                )));
                outcome
                    .issues
                    .push(ScanError::IneligibleGoodieBag(code.to_string()));
                None
            }
            ScanIntent::Submit => Some(ScanEvent::new(&code, mode, Utc::now(), &session.user_name)),
        };

        let status = match self.step(self.store.fetch_status(&code)).await {
            Ok(status) => status,
            Err(message) => {
                self.metrics.record_status_error();
                warn!(code = %code, error = %message, "status lookup failed");
                outcome.view = status_error_view(&code, &message);
                outcome.issues.push(ScanError::StatusFetch(message));
                self.render(lease, &outcome.view).await;
                self.submit(event, &mut outcome).await;
                return outcome;
            }
        };

        let identity = match self.step(self.store.fetch_identity(&code)).await {
            Ok(identity) => identity,
            Err(message) => {
                self.metrics.record_identity_error();
                warn!(code = %code, error = %message, "identity lookup failed, using placeholders");
                outcome.issues.push(ScanError::IdentityFetch(message));
                IdentitySnapshot::unknown()
            }
        };

        let record = AttendeeRecord::merge(&code, &identity, &status);
        outcome.view = project(&record);
        outcome.record = Some(record);
        self.render(lease, &outcome.view).await;

        self.submit(event, &mut outcome).await;
        outcome
    }

    async fn submit(&self, event: Option<ScanEvent>, outcome: &mut ScanOutcome) {
        let Some(event) = event else {
            return;
        };
        match self.step(self.store.submit(&event)).await {
            Ok(()) => {
                self.metrics.record_submission(true);
                info!(code = %event.code, mode = %event.mode, "scan event submitted");
                outcome
                    .notices
                    .push(Notice::info(format!("{} recorded for {}", event.mode, event.code)));
                outcome.submission = SubmissionStatus::Sent;
            }
            Err(message) => {
                self.metrics.record_submission(false);
                error!(code = %event.code, mode = %event.mode, error = %message, "scan event submission failed");
                outcome.notices.push(Notice::error(format!(
                    "Failed to record {} for {}: {}",
                    event.mode, event.code, message
                )));
                outcome.issues.push(ScanError::Submission(message.clone()));
                outcome.submission = SubmissionStatus::Failed { message };
            }
        }
        outcome.event = Some(event);
    }

    async fn step<T, F>(&self, operation: F) -> Result<T, String>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match timeout(self.step_timeout, operation).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("timed out after {}s", self.step_timeout.as_secs())),
        }
    }

    async fn render(&self, lease: LockLease, view: &AttendeeView) {
        let view = view.clone();
        self.publish(lease, |board| board.view = Some(view)).await;
    }

    // A run whose lease was force-released must not overwrite a newer run.
    async fn publish<F>(&self, lease: LockLease, apply: F)
    where
        F: FnOnce(&mut BoardSnapshot),
    {
        if self.gate.is_current(lease) {
            self.board.update(apply).await;
        } else {
            debug!(generation = lease.generation(), "stale scan run, board update suppressed");
        }
    }

    async fn finish(&self, lease: LockLease, outcome: &ScanOutcome) {
        let notices = outcome.notices.clone();
        self.publish(lease, |board| {
            board.notices = notices;
            board.scanning = false;
            board.input_enabled = true;
        })
        .await;
        self.gate.release(lease);
        info!(
            code = %outcome.code,
            submission = ?outcome.submission,
            issues = outcome.issues.len(),
            "scan finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use checkin_domain::StatusSnapshot;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeStore {
        status: Option<StatusSnapshot>,
        status_error: Option<String>,
        identity: Option<IdentitySnapshot>,
        submit_error: Option<String>,
        hold: Option<(Arc<Notify>, Arc<Notify>)>,
        never_settle: bool,
        calls: Mutex<Vec<&'static str>>,
        submitted: Mutex<Vec<ScanEvent>>,
    }

    impl FakeStore {
        fn happy() -> Self {
            Self {
                status: Some(StatusSnapshot::default()),
                identity: Some(jane()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn submitted(&self) -> Vec<ScanEvent> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AttendeeStore for FakeStore {
        async fn fetch_status(&self, _code: &AttendeeCode) -> anyhow::Result<StatusSnapshot> {
            self.calls.lock().unwrap().push("status");
            if let Some((entered, release)) = &self.hold {
                entered.notify_one();
                release.notified().await;
            }
            if self.never_settle {
                std::future::pending::<()>().await;
            }
            match (&self.status, &self.status_error) {
                (Some(status), None) => Ok(status.clone()),
                (_, Some(message)) => Err(anyhow!("{}", message)),
                (None, None) => Err(anyhow!("no status")),
            }
        }

        async fn fetch_identity(&self, _code: &AttendeeCode) -> anyhow::Result<IdentitySnapshot> {
            self.calls.lock().unwrap().push("identity");
            self.identity.clone().ok_or_else(|| anyhow!("identity sheet unavailable"))
        }

        async fn submit(&self, event: &ScanEvent) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("submit");
            self.submitted.lock().unwrap().push(event.clone());
            match &self.submit_error {
                Some(message) => Err(anyhow!("{}", message)),
                None => Ok(()),
            }
        }
    }

    fn jane() -> IdentitySnapshot {
        IdentitySnapshot {
            firstname: "Jane".to_string(),
            lastname: "Doe".to_string(),
            email: "j@x.com".to_string(),
            timestamp: "2025-05-06T12:00:00Z".to_string(),
        }
    }

    fn service_with(store: Arc<FakeStore>, settings: ScanSettings) -> Arc<ScanService> {
        Arc::new(ScanService::new(
            store,
            Arc::new(ScanBoard::new()),
            Arc::new(Metrics::default()),
            settings,
        ))
    }

    fn service(store: Arc<FakeStore>) -> Arc<ScanService> {
        service_with(store, ScanSettings::default())
    }

    fn manual(code: &str) -> ScanRequest {
        ScanRequest::manual(code, ScanIntent::Submit)
    }

    #[tokio::test]
    async fn eligible_goodie_bag_scan_renders_and_submits_once() {
        let store = Arc::new(FakeStore::happy());
        let service = service(Arc::clone(&store));
        service.set_mode(ScanMode::GoodieBag).await;

        let outcome = service.handle(manual("A1-GB")).await.expect("outcome");

        assert_eq!(outcome.view.name, "Jane Doe");
        assert_eq!(outcome.view.goodie_bag, "Not received yet");
        assert_eq!(outcome.submission, SubmissionStatus::Sent);
        assert_eq!(store.calls(), vec!["status", "identity", "submit"]);
        let submitted = store.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].mode, ScanMode::GoodieBag);
        assert_eq!(submitted[0].code, "A1-GB");
        assert!(!service.is_locked());

        let board = service.board.snapshot().await;
        assert_eq!(board.view.expect("view").name, "Jane Doe");
        assert!(board.input_enabled);
        assert!(!board.scanning);
    }

    #[tokio::test]
    async fn ineligible_goodie_bag_scan_is_read_only() {
        let store = Arc::new(FakeStore::happy());
        let service = service(Arc::clone(&store));
        service.set_mode(ScanMode::GoodieBag).await;

        let outcome = service.handle(manual("A1")).await.expect("outcome");

        assert_eq!(store.calls(), vec!["status", "identity"]);
        assert!(store.submitted().is_empty());
        assert_eq!(outcome.submission, SubmissionStatus::NotAttempted);
        assert_eq!(outcome.view.name, "Jane Doe");
        assert!(outcome
            .issues
            .contains(&ScanError::IneligibleGoodieBag("A1".to_string())));
        assert!(outcome
            .notices
            .iter()
            .any(|notice| notice.level == checkin_domain::NoticeLevel::Warning));
    }

    #[tokio::test]
    async fn status_failure_skips_identity_but_still_submits() {
        let store = Arc::new(FakeStore {
            status_error: Some("not found".to_string()),
            identity: Some(jane()),
            ..FakeStore::default()
        });
        let service = service(Arc::clone(&store));

        let outcome = service.handle(manual("A1")).await.expect("outcome");

        assert_eq!(outcome.view.check_in, "Error: not found");
        assert_eq!(outcome.view.goodie_bag, "Error: not found");
        assert_eq!(store.calls(), vec!["status", "submit"]);
        assert_eq!(store.submitted()[0].mode, ScanMode::CheckIn);
        assert!(outcome
            .issues
            .contains(&ScanError::StatusFetch("not found".to_string())));
        assert!(!service.is_locked());
    }

    #[tokio::test]
    async fn identity_failure_degrades_to_placeholders() {
        let store = Arc::new(FakeStore {
            status: Some(StatusSnapshot {
                is_checked_in: true,
                check_in_time: Some("09:00".to_string()),
                ..StatusSnapshot::default()
            }),
            ..FakeStore::default()
        });
        let service = service(Arc::clone(&store));

        let outcome = service.handle(manual("A1")).await.expect("outcome");

        assert_eq!(outcome.view.name, "Unknown");
        assert_eq!(outcome.view.email, "Unknown");
        assert_eq!(outcome.view.check_in, "Checked in at 09:00");
        assert_eq!(outcome.submission, SubmissionStatus::Sent);
        assert!(matches!(outcome.issues.as_slice(), [ScanError::IdentityFetch(_)]));
    }

    #[tokio::test]
    async fn submission_failure_reports_error_and_unlocks() {
        let store = Arc::new(FakeStore {
            submit_error: Some("connection reset".to_string()),
            ..FakeStore::happy()
        });
        let service = service(Arc::clone(&store));

        let outcome = service.handle(manual("A1")).await.expect("outcome");

        assert_eq!(
            outcome.submission,
            SubmissionStatus::Failed {
                message: "connection reset".to_string()
            }
        );
        assert!(outcome
            .notices
            .iter()
            .any(|notice| notice.level == checkin_domain::NoticeLevel::Error));
        assert!(!service.is_locked());
    }

    #[tokio::test]
    async fn lookup_never_submits() {
        let store = Arc::new(FakeStore::happy());
        let service = service(Arc::clone(&store));

        let outcome = service
            .handle(ScanRequest::manual("A1-GB", ScanIntent::Lookup))
            .await
            .expect("outcome");

        assert_eq!(store.calls(), vec!["status", "identity"]);
        assert_eq!(outcome.submission, SubmissionStatus::NotAttempted);
    }

    #[tokio::test]
    async fn invalid_code_is_rejected_and_lock_stays_free() {
        let store = Arc::new(FakeStore::happy());
        let service = service(Arc::clone(&store));

        let err = service.handle(manual("  ")).await.expect_err("invalid");
        assert!(matches!(err, ScanError::InvalidCode(_)));
        assert!(store.calls().is_empty());
        assert!(!service.is_locked());
    }

    #[tokio::test]
    async fn second_scan_is_rejected_while_first_is_in_flight() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(FakeStore {
            hold: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..FakeStore::happy()
        });
        let service = service(Arc::clone(&store));

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handle(manual("A1")).await })
        };
        entered.notified().await;

        assert!(service.is_locked());
        assert_eq!(
            service.handle(manual("B2")).await.expect_err("busy"),
            ScanError::LockBusy
        );
        assert!(!service.accept_camera_decode("C3".to_string()));
        assert_eq!(service.metrics.scans_dropped(), 2);

        release.notify_one();
        let outcome = first.await.expect("join").expect("outcome");
        assert_eq!(outcome.code, "A1");
        assert_eq!(store.submitted().len(), 1);
        assert!(!service.is_locked());
    }

    #[tokio::test]
    async fn abandoned_caller_does_not_cut_the_run_short() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(FakeStore {
            hold: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..FakeStore::happy()
        });
        let service = service(Arc::clone(&store));

        let caller = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.spawn(manual("A1")).await })
        };
        entered.notified().await;
        caller.abort();
        assert!(caller.await.expect_err("aborted").is_cancelled());

        release.notify_one();
        for _ in 0..200 {
            if !service.is_locked() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!service.is_locked());
        assert_eq!(store.calls(), vec!["status", "identity", "submit"]);
        assert_eq!(store.submitted().len(), 1);
        let board = service.board.snapshot().await;
        assert!(board.input_enabled);
        assert!(!board.scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn safety_timer_unlocks_unsettled_run() {
        let store = Arc::new(FakeStore {
            never_settle: true,
            ..FakeStore::happy()
        });
        let service = service_with(
            Arc::clone(&store),
            ScanSettings {
                step_timeout: Duration::from_secs(600),
                lock_safety: Duration::from_secs(15),
            },
        );

        let stuck = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handle(manual("A1")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(service.is_locked());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(!service.is_locked());
        assert!(service.board.snapshot().await.input_enabled);
        stuck.abort();
    }

    #[tokio::test]
    async fn operator_name_is_sanitized_and_defaulted() {
        let service = service(Arc::new(FakeStore::happy()));
        assert_eq!(service.set_operator("  <Desk 1> ", "10.0.0.5").user_name, "&lt;Desk 1&gt;");
        assert_eq!(service.set_operator("   ", "10.0.0.5").user_name, UNKNOWN_OPERATOR);
    }
}
