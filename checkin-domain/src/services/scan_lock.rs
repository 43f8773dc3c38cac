// Scan lock
// Single admission flag around the scan pipeline. No queue: a second
// acquire while held simply fails.

use std::time::Duration;

pub const DEFAULT_LOCK_SAFETY: Duration = Duration::from_secs(15);
/// Remote calls per run: status, identity, submission.
pub const PIPELINE_STEPS: u64 = 3;
/// Largest per-step timeout whose full run still fits inside the safety timer.
pub const DEFAULT_STEP_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_LOCK_SAFETY.as_secs() / PIPELINE_STEPS);

/// Proof of one successful acquire. Leases from an older generation can no
/// longer touch the lock once it has been force-released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockLease {
    generation: u64,
}

impl LockLease {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct ScanLock {
    held: bool,
    generation: u64,
    input_enabled: bool,
}

impl Default for ScanLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanLock {
    pub fn new() -> Self {
        Self {
            held: false,
            generation: 0,
            input_enabled: true,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn try_acquire(&mut self) -> Option<LockLease> {
        if self.held {
            return None;
        }
        self.generation += 1;
        self.held = true;
        self.input_enabled = false;
        Some(LockLease {
            generation: self.generation,
        })
    }

    /// True while `lease` is the holder that last acquired the lock.
    pub fn is_current(&self, lease: LockLease) -> bool {
        self.held && self.generation == lease.generation
    }

    /// Clears the flag and re-enables input. A lease that was already
    /// force-released leaves a newer holder untouched.
    pub fn release(&mut self, lease: LockLease) -> bool {
        if self.generation != lease.generation {
            return false;
        }
        let was_held = self.held;
        self.held = false;
        self.input_enabled = true;
        was_held
    }

    /// Safety-timer path: force-release only if `lease` still holds the lock.
    pub fn expire(&mut self, lease: LockLease) -> bool {
        if !self.is_current(lease) {
            return false;
        }
        self.held = false;
        self.input_enabled = true;
        true
    }
}
