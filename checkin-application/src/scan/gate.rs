use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use checkin_domain::{LockLease, Notice, ScanLock};
use tokio::time::sleep;
use tracing::warn;

use crate::{Metrics, ScanBoard};

/// Owns the station's single scan lock and arms the safety timer that
/// force-releases it when a run never settles. The timer does not cancel the
/// run itself.
pub struct ScanGate {
    lock: Arc<Mutex<ScanLock>>,
    safety: Duration,
    board: Arc<ScanBoard>,
    metrics: Arc<Metrics>,
}

impl ScanGate {
    pub fn new(safety: Duration, board: Arc<ScanBoard>, metrics: Arc<Metrics>) -> Self {
        Self {
            lock: Arc::new(Mutex::new(ScanLock::new())),
            safety,
            board,
            metrics,
        }
    }

    fn guard(&self) -> MutexGuard<'_, ScanLock> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_held(&self) -> bool {
        self.guard().is_held()
    }

    pub fn input_enabled(&self) -> bool {
        self.guard().input_enabled()
    }

    pub fn is_current(&self, lease: LockLease) -> bool {
        self.guard().is_current(lease)
    }

    pub fn acquire(&self) -> Option<LockLease> {
        let lease = self.guard().try_acquire()?;
        self.arm_safety_timer(lease);
        Some(lease)
    }

    pub fn release(&self, lease: LockLease) -> bool {
        self.guard().release(lease)
    }

    fn arm_safety_timer(&self, lease: LockLease) {
        let lock = Arc::clone(&self.lock);
        let board = Arc::clone(&self.board);
        let metrics = Arc::clone(&self.metrics);
        let safety = self.safety;
        tokio::spawn(async move {
            sleep(safety).await;
            let expired = lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .expire(lease);
            if !expired {
                return;
            }
            metrics.record_lock_expiration();
            warn!(
                generation = lease.generation(),
                timeout_secs = safety.as_secs(),
                "scan lock force-released by safety timer"
            );
            board
                .update(|snapshot| {
                    snapshot.scanning = false;
                    snapshot.input_enabled = true;
                    snapshot
                        .notices
                        .push(Notice::warning("The previous scan timed out. Scanning is enabled again."));
                })
                .await;
        });
    }
}
