//! User-adjustable dashboard settings.
//!
//! Holds the feed source selection, the simulated detection threshold,
//! and the alert toggles, and reports changes so the driving loop can
//! react (a feed change triggers a refetch). No algorithm lives here.

use crate::client::FeedSource;

/// Default simulated detection threshold (0-100 scale).
const DEFAULT_THRESHOLD: u8 = 50;

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    feed_source: FeedSource,
    detection_threshold: u8,
    sound_alert: bool,
    vibration_alert: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_source: FeedSource::AllHour,
            detection_threshold: DEFAULT_THRESHOLD,
            sound_alert: true,
            vibration_alert: true,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn feed_source(&self) -> FeedSource {
        self.feed_source
    }

    /// Select a feed source. Returns `true` if the selection changed,
    /// which obliges the caller to refetch.
    pub fn set_feed_source(&mut self, source: FeedSource) -> bool {
        if self.feed_source == source {
            return false;
        }
        self.feed_source = source;
        true
    }

    #[must_use]
    pub const fn detection_threshold(&self) -> u8 {
        self.detection_threshold
    }

    /// Set the simulated detection threshold, clamped to 0-100.
    /// Returns `true` if the value changed.
    pub fn set_detection_threshold(&mut self, threshold: u8) -> bool {
        let clamped = threshold.min(100);
        if self.detection_threshold == clamped {
            return false;
        }
        self.detection_threshold = clamped;
        true
    }

    #[must_use]
    pub const fn sound_alert(&self) -> bool {
        self.sound_alert
    }

    pub fn set_sound_alert(&mut self, enabled: bool) -> bool {
        let changed = self.sound_alert != enabled;
        self.sound_alert = enabled;
        changed
    }

    #[must_use]
    pub const fn vibration_alert(&self) -> bool {
        self.vibration_alert
    }

    pub fn set_vibration_alert(&mut self, enabled: bool) -> bool {
        let changed = self.vibration_alert != enabled;
        self.vibration_alert = enabled;
        changed
    }
}
