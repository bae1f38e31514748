//! Playback progress tracking
//!
//! Derives the five quartile events from position updates. A single
//! forward-only index walks the quartile table; each update fires at most
//! one event, so a seek past several thresholds reports them on successive
//! updates rather than all at once.

use crate::events::AdEvent;
use serde::{Deserialize, Serialize};

/// A playback milestone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartile {
    /// Percent of the duration that must have played
    pub threshold: f64,
    pub event: AdEvent,
}

/// Milestones in strictly increasing threshold order
pub const QUARTILES: [Quartile; 5] = [
    Quartile { threshold: 0.0, event: AdEvent::AdVideoStart },
    Quartile { threshold: 25.0, event: AdEvent::AdVideoFirstQuartile },
    Quartile { threshold: 50.0, event: AdEvent::AdVideoMidpoint },
    Quartile { threshold: 75.0, event: AdEvent::AdVideoThirdQuartile },
    Quartile { threshold: 100.0, event: AdEvent::AdVideoComplete },
];

/// Percent of `duration` covered by `current_time`.
///
/// NaN when the duration is unknown, or when both values are zero; NaN never
/// satisfies a threshold. A zero duration with a positive position gives
/// +inf, which satisfies every threshold.
pub fn percent_played(current_time: f64, duration: f64) -> f64 {
    current_time * 100.0 / duration
}

/// Forward-only quartile tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackMonitor {
    next: usize,
}

impl PlaybackMonitor {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Feed one position update. Returns the quartile reached, if any,
    /// and advances past it.
    pub fn observe(&mut self, current_time: f64, duration: f64) -> Option<AdEvent> {
        let quartile = QUARTILES.get(self.next)?;
        if percent_played(current_time, duration) >= quartile.threshold {
            self.next += 1;
            Some(quartile.event)
        } else {
            None
        }
    }

    /// Index of the next quartile to report
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// The next quartile to report, `None` once all have fired
    pub fn pending(&self) -> Option<&'static Quartile> {
        QUARTILES.get(self.next)
    }

    pub fn is_complete(&self) -> bool {
        self.next >= QUARTILES.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_strictly_increase() {
        assert!(QUARTILES.windows(2).all(|w| w[0].threshold < w[1].threshold));
    }

    #[test]
    fn test_one_event_per_update() {
        let mut monitor = PlaybackMonitor::new();
        let fired: Vec<_> = [0.0, 0.26, 0.51, 0.76, 1.0]
            .iter()
            .map(|ratio| monitor.observe(ratio * 30.0, 30.0))
            .collect();

        assert_eq!(
            fired,
            vec![
                Some(AdEvent::AdVideoStart),
                Some(AdEvent::AdVideoFirstQuartile),
                Some(AdEvent::AdVideoMidpoint),
                Some(AdEvent::AdVideoThirdQuartile),
                Some(AdEvent::AdVideoComplete),
            ]
        );
        assert!(monitor.is_complete());
        assert_eq!(monitor.observe(30.0, 30.0), None);
        assert_eq!(monitor.next_index(), QUARTILES.len());
    }

    #[test]
    fn test_seek_fires_only_next_threshold() {
        let mut monitor = PlaybackMonitor::new();
        assert_eq!(monitor.observe(0.0, 20.0), Some(AdEvent::AdVideoStart));

        // Jump straight to 80%: only the first quartile is reported
        assert_eq!(monitor.observe(16.0, 20.0), Some(AdEvent::AdVideoFirstQuartile));
        assert_eq!(monitor.observe(16.0, 20.0), Some(AdEvent::AdVideoMidpoint));
        assert_eq!(monitor.observe(16.0, 20.0), Some(AdEvent::AdVideoThirdQuartile));
        assert_eq!(monitor.observe(16.0, 20.0), None);
    }

    #[test]
    fn test_below_threshold_does_not_advance() {
        let mut monitor = PlaybackMonitor::new();
        monitor.observe(0.0, 10.0);
        assert_eq!(monitor.observe(2.4, 10.0), None);
        assert_eq!(monitor.next_index(), 1);
        assert_eq!(monitor.pending().map(|q| q.event), Some(AdEvent::AdVideoFirstQuartile));
    }

    #[test]
    fn test_unknown_duration_never_fires() {
        let mut monitor = PlaybackMonitor::new();
        assert_eq!(monitor.observe(0.0, f64::NAN), None);
        assert_eq!(monitor.observe(0.0, 0.0), None);
        assert_eq!(monitor.next_index(), 0);
    }

    #[test]
    fn test_zero_duration_with_progress_fires_one_per_update() {
        let mut monitor = PlaybackMonitor::new();
        assert_eq!(percent_played(5.0, 0.0), f64::INFINITY);
        assert_eq!(monitor.observe(5.0, 0.0), Some(AdEvent::AdVideoStart));
        assert_eq!(monitor.observe(5.0, 0.0), Some(AdEvent::AdVideoFirstQuartile));
        assert_eq!(monitor.next_index(), 2);
    }

    #[test]
    fn test_non_decreasing_ticks_fire_each_event_at_most_once() {
        let mut monitor = PlaybackMonitor::new();
        let mut fired = Vec::new();
        let mut t = 0.0;
        while t <= 12.0 {
            if let Some(event) = monitor.observe(t, 12.0) {
                fired.push(event);
            }
            t += 0.25;
        }

        let expected: Vec<_> = QUARTILES.iter().map(|q| q.event).collect();
        assert_eq!(fired, expected);
    }
}
