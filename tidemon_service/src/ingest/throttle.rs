/// Per-host request spacing.
///
/// Workers reserve the next free slot for a host under the lock and then
/// sleep outside it, so two workers never wait on the same slot.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct HostThrottle {
    spacing: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostThrottle {
    pub fn new(spacing: Duration) -> Self {
        HostThrottle {
            spacing,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Host part of a URL, lowercased. Unparseable URLs share one bucket.
    pub fn host_of(url: &str) -> String {
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default()
    }

    /// Claims the next slot for `host` and returns how long to wait for it.
    pub fn reserve(&self, host: &str, now: Instant) -> Duration {
        let mut slots = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = match slots.get(host) {
            Some(&next) if next > now => next,
            _ => now,
        };
        slots.insert(host.to_string(), slot + self.spacing);
        slot - now
    }

    /// Blocks until this caller may send a request to the URL's host.
    pub fn wait(&self, url: &str) {
        if self.spacing.is_zero() {
            return;
        }
        let delay = self.reserve(&Self::host_of(url), Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
