//! # Event Deduplication Feature
//!
//! Slack redelivers events on slow acks and a message edit replays the
//! original timestamp, so every inbound event is checked against a
//! process-scoped idempotency cache before any parsing happens.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.4.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Cache keyed by (team, timestamp); timestamps are only unique
//!   within one workspace
//! - 1.1.0: Bounded LRU instead of a grow-forever set
//! - 1.0.0: Initial release

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Default number of events remembered
pub const DEFAULT_CAPACITY: usize = 1024;

/// Fixed-capacity idempotency cache keyed by `(team_id, event_ts)`.
///
/// Process-scoped only; a restart forgets everything, which matches how
/// long Slack keeps retrying.
pub struct EventDeduper {
    seen: Mutex<LruCache<(String, String), ()>>,
}

impl EventDeduper {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        EventDeduper {
            seen: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns true if this event was already handled; marks it either way.
    pub fn check_and_mark(&self, team_id: &str, event_ts: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.put((team_id.to_string(), event_ts.to_string()), ())
            .is_some()
    }
}

impl Default for EventDeduper {
    fn default() -> Self {
        EventDeduper::new(DEFAULT_CAPACITY)
    }
}
