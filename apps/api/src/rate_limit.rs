use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window request limiter keyed by client address.
///
/// In-memory and best effort: counts reset on restart and are not shared between replicas.
/// Constructed once in `main` and shared through `AppState`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a request for `key` and returns whether it is within the cap.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        // A poisoned lock only means another request panicked mid-update; the counts are still usable.
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        // Forget clients whose whole window has expired.
        hits.retain(|_, q| q.back().is_some_and(|last| now.duration_since(*last) < self.window));

        let queue = hits.entry(key.to_string()).or_default();
        while queue
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.max_requests {
            return false;
        }
        queue.push_back(now);
        true
    }
}
