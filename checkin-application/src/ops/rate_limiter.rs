use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window limiter keyed by caller (client ip for access requests).
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1) as usize,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hits.retain(|_, window| {
            prune(window, now, self.window);
            !window.is_empty()
        });
        let window = hits.entry(key.to_string()).or_default();
        if window.len() >= self.limit {
            return false;
        }
        window.push_back(now);
        true
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
    while let Some(first) = window.front() {
        if now.duration_since(*first) >= span {
            window.pop_front();
        } else {
            break;
        }
    }
}
