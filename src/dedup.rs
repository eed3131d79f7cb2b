//! Bounded tracking of already-seen events for the live stream.
//!
//! Repeated polls of the same feed return mostly the same events; the
//! stream should only surface ones that are new or have been revised
//! since we last saw them. Tracking is a fixed-size ring keyed on
//! event ID, so memory stays bounded no matter how long the stream
//! runs.

use std::collections::VecDeque;

use crate::models::SeismicEvent;

/// Default ring capacity, sized for roughly a day of feed data at
/// peak activity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// What a poll observed about an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Never seen before
    New,
    /// Seen before, but the feed has revised it since
    Revised,
    /// Seen before with no newer revision
    AlreadySeen,
}

impl Observation {
    /// Whether the live stream should emit this event.
    #[must_use]
    pub fn should_emit(self) -> bool {
        match self {
            Self::New | Self::Revised => true,
            Self::AlreadySeen => false,
        }
    }
}

/// One tracked event: its ID and the last revision stamp we emitted.
#[derive(Debug, Clone)]
struct SeenEntry {
    id: String,
    updated_at_ms: Option<i64>,
}

impl SeenEntry {
    /// Decide whether a refetched revision stamp counts as a revision.
    ///
    /// An event that gains a stamp it previously lacked is revised; an
    /// event that never carries one dedupes purely on ID.
    fn is_revised_by(&self, updated_at_ms: Option<i64>) -> bool {
        match (self.updated_at_ms, updated_at_ms) {
            (Some(old), Some(new)) => new > old,
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }
}

/// Fixed-capacity ring of seen events, oldest evicted first.
#[derive(Debug)]
pub struct SeenRing {
    /// Oldest at front, newest at back
    seen: VecDeque<SeenEntry>,
    capacity: usize,
    /// Total events observed (for stats)
    total_observed: u64,
    /// Total already-seen events skipped
    total_skipped: u64,
}

impl SeenRing {
    /// Create a ring with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            seen: VecDeque::with_capacity(capacity),
            capacity,
            total_observed: 0,
            total_skipped: 0,
        }
    }

    /// Create a ring with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Record one event from a poll and classify it.
    ///
    /// New and revised events are marked so the next poll dedupes
    /// against the emitted state.
    pub fn observe(&mut self, event: &SeismicEvent) -> Observation {
        self.total_observed += 1;

        // Linear search is fast enough at 10k entries (~1-2ms worst case).
        if let Some(pos) = self.seen.iter().position(|e| e.id == event.id) {
            if self.seen[pos].is_revised_by(event.updated_at_ms) {
                self.seen[pos].updated_at_ms = event.updated_at_ms;
                return Observation::Revised;
            }

            self.total_skipped += 1;
            return Observation::AlreadySeen;
        }

        if self.seen.len() >= self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(SeenEntry {
            id: event.id.clone(),
            updated_at_ms: event.updated_at_ms,
        });
        debug_assert!(self.seen.len() <= self.capacity);

        Observation::New
    }

    /// Number of currently tracked events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Fraction of observed events skipped as already seen (0.0 to 1.0).
    #[must_use]
    pub fn skip_rate(&self) -> f64 {
        if self.total_observed == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.total_skipped as f64 / self.total_observed as f64
            }
        }
    }
}

impl Default for SeenRing {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, updated_at_ms: Option<i64>) -> SeismicEvent {
        SeismicEvent {
            id: id.to_string(),
            magnitude: Some(2.5),
            place: Some("Tokyo, Japan".to_string()),
            occurred_at_ms: Some(1000),
            updated_at_ms,
            detail_url: None,
        }
    }

    #[test]
    fn test_first_poll_is_all_new() {
        let mut ring = SeenRing::new(100);

        assert_eq!(ring.observe(&event("quake1", Some(1000))), Observation::New);
        assert_eq!(ring.observe(&event("quake2", Some(2000))), Observation::New);

        assert_eq!(ring.len(), 2);
        assert!((ring.skip_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_repeat_poll_is_already_seen() {
        let mut ring = SeenRing::new(100);

        ring.observe(&event("quake1", Some(1000)));
        assert_eq!(
            ring.observe(&event("quake1", Some(1000))),
            Observation::AlreadySeen
        );
        assert_eq!(
            ring.observe(&event("quake1", Some(900))),
            Observation::AlreadySeen
        );

        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_newer_revision_stamp_is_revised() {
        let mut ring = SeenRing::new(100);

        ring.observe(&event("quake1", Some(1000)));
        assert_eq!(
            ring.observe(&event("quake1", Some(2000))),
            Observation::Revised
        );
        // The emitted revision becomes the new baseline.
        assert_eq!(
            ring.observe(&event("quake1", Some(2000))),
            Observation::AlreadySeen
        );
    }

    #[test]
    fn test_absent_stamp_dedupes_on_id() {
        let mut ring = SeenRing::new(100);

        ring.observe(&event("quake1", None));
        assert_eq!(
            ring.observe(&event("quake1", None)),
            Observation::AlreadySeen
        );

        // A stamp appearing where there was none counts as a revision.
        assert_eq!(
            ring.observe(&event("quake1", Some(500))),
            Observation::Revised
        );

        // Losing the stamp again does not.
        assert_eq!(
            ring.observe(&event("quake1", None)),
            Observation::AlreadySeen
        );
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut ring = SeenRing::new(2);

        ring.observe(&event("quake1", Some(1)));
        ring.observe(&event("quake2", Some(2)));
        ring.observe(&event("quake3", Some(3)));
        assert_eq!(ring.len(), 2);

        // quake1 was evicted, so it reads as new again.
        assert_eq!(ring.observe(&event("quake1", Some(1))), Observation::New);
        // quake3 is still tracked.
        assert_eq!(
            ring.observe(&event("quake3", Some(3))),
            Observation::AlreadySeen
        );
    }

    #[test]
    fn test_skip_rate() {
        let mut ring = SeenRing::new(100);

        ring.observe(&event("quake1", Some(1)));
        ring.observe(&event("quake1", Some(1)));
        ring.observe(&event("quake1", Some(1)));
        ring.observe(&event("quake2", Some(2)));

        // 2 skips out of 4
        assert!((ring.skip_rate() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_should_emit() {
        assert!(Observation::New.should_emit());
        assert!(Observation::Revised.should_emit());
        assert!(!Observation::AlreadySeen.should_emit());
    }
}
