use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    scans_started: AtomicU64,
    scans_dropped: AtomicU64,
    status_errors: AtomicU64,
    identity_errors: AtomicU64,
    submissions: AtomicU64,
    submission_errors: AtomicU64,
    lock_expirations: AtomicU64,
    access_requests: AtomicU64,
}

impl Metrics {
    pub fn record_scan(&self) {
        self.scans_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.scans_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_error(&self) {
        self.status_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_identity_error(&self) {
        self.identity_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission(&self, ok: bool) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.submission_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_lock_expiration(&self) {
        self.lock_expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_access_request(&self) {
        self.access_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scans_started(&self) -> u64 {
        self.scans_started.load(Ordering::Relaxed)
    }

    pub fn scans_dropped(&self) -> u64 {
        self.scans_dropped.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let started = self.scans_started.load(Ordering::Relaxed);
        let dropped = self.scans_dropped.load(Ordering::Relaxed);
        let status_errors = self.status_errors.load(Ordering::Relaxed);
        let identity_errors = self.identity_errors.load(Ordering::Relaxed);
        let submissions = self.submissions.load(Ordering::Relaxed);
        let submission_errors = self.submission_errors.load(Ordering::Relaxed);
        let expirations = self.lock_expirations.load(Ordering::Relaxed);
        let access_requests = self.access_requests.load(Ordering::Relaxed);

        format!(
            "# TYPE checkin_scans_total counter\n\
checkin_scans_total {}\n\
# TYPE checkin_scans_dropped_total counter\n\
checkin_scans_dropped_total {}\n\
# TYPE checkin_status_errors_total counter\n\
checkin_status_errors_total {}\n\
# TYPE checkin_identity_errors_total counter\n\
checkin_identity_errors_total {}\n\
# TYPE checkin_submissions_total counter\n\
checkin_submissions_total {}\n\
# TYPE checkin_submission_errors_total counter\n\
checkin_submission_errors_total {}\n\
# TYPE checkin_lock_expirations_total counter\n\
checkin_lock_expirations_total {}\n\
# TYPE checkin_access_requests_total counter\n\
checkin_access_requests_total {}\n",
            started,
            dropped,
            status_errors,
            identity_errors,
            submissions,
            submission_errors,
            expirations,
            access_requests
        )
    }
}
