//! Feed presentation: sorting, severity classification, filtering.
//!
//! Derives a time-descending view over a fetched snapshot without
//! mutating it. Relative-age labels are computed lazily against the
//! wall clock at render time, never cached at fetch time.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{FeedSnapshot, SeismicEvent};

/// Placeholder shown before an age can be computed.
const AGE_PLACEHOLDER: &str = "—";

/// Severity classification derived from magnitude.
///
/// Breakpoints are inclusive on the lower bound of each tier; an
/// absent magnitude classifies as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTier {
    High,
    Medium,
    Low,
}

impl SeverityTier {
    /// Classify a magnitude: >= 4.5 high, >= 2.5 medium, else low.
    #[must_use]
    pub fn from_magnitude(magnitude: Option<f64>) -> Self {
        let mag = magnitude.unwrap_or(0.0);
        if mag >= 4.5 {
            Self::High
        } else if mag >= 2.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Short label for output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// One event prepared for display.
#[derive(Debug, Clone)]
pub struct PresentedEvent {
    pub event: SeismicEvent,
    pub tier: SeverityTier,
}

impl PresentedEvent {
    /// Place label with the standard substitution for absent places.
    #[must_use]
    pub fn place_label(&self) -> &str {
        self.event.place.as_deref().unwrap_or("Unknown location")
    }

    /// Relative age against the given instant.
    ///
    /// Recompute on every render; the label depends on `now`, not on
    /// when the snapshot was fetched. Absent timestamps render a
    /// neutral placeholder.
    #[must_use]
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let Some(ms) = self.event.occurred_at_ms else {
            return AGE_PLACEHOLDER.to_string();
        };
        let Some(time) = Utc.timestamp_millis_opt(ms).single() else {
            return AGE_PLACEHOLDER.to_string();
        };

        let diff = now.signed_duration_since(time);
        if diff.num_minutes() < 1 {
            "just now".to_string()
        } else if diff.num_hours() < 1 {
            format!("{} min ago", diff.num_minutes())
        } else if diff.num_hours() < 24 {
            format!("{} hr ago", diff.num_hours())
        } else {
            format!("{} days ago", diff.num_days())
        }
    }
}

/// Check a country/region filter against an event's place.
///
/// Case-insensitive substring match; an absent place never matches a
/// non-empty filter.
fn matches_country(event: &SeismicEvent, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    event
        .place
        .as_deref()
        .is_some_and(|place| place.to_lowercase().contains(&filter.to_lowercase()))
}

/// Derive the display list for a snapshot.
///
/// Events are classified and sorted by time descending; absent
/// timestamps sort as zero (oldest). The sort is stable, so events
/// with equal timestamps keep their source order. Without a filter the
/// output length equals the snapshot's event count.
#[must_use]
pub fn present(snapshot: &FeedSnapshot, country_filter: Option<&str>) -> Vec<PresentedEvent> {
    let mut presented: Vec<PresentedEvent> = snapshot
        .events
        .iter()
        .filter(|e| country_filter.is_none_or(|f| matches_country(e, f)))
        .map(|e| PresentedEvent {
            tier: SeverityTier::from_magnitude(e.magnitude),
            event: e.clone(),
        })
        .collect();

    presented.sort_by_key(|p| std::cmp::Reverse(p.event.occurred_at_ms.unwrap_or(0)));
    presented
}
