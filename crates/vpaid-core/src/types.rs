//! Core types for the VPAID ad unit

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Protocol version returned from `handshakeVersion`
pub const VPAID_VERSION: &str = "2.0";

/// Unique identifier for an ad unit instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdUnitId(pub Uuid);

impl AdUnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AdUnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ad lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdState {
    /// Constructed, `initAd` not yet called
    Uninitialized,
    /// Media bound and loading, waiting for `startAd`
    Initialized,
    /// Started and playing
    Playing,
    /// Started and paused by the host
    Paused,
    /// Terminal
    Stopped,
}

impl AdState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: AdState) -> bool {
        use AdState::*;
        matches!(
            (self, target),
            (Uninitialized, Initialized) |
            (Initialized, Playing) |
            (Playing, Paused) | (Paused, Playing) |
            // Stop is accepted from every non-terminal state
            (Uninitialized, Stopped) | (Initialized, Stopped) |
            (Playing, Stopped) | (Paused, Stopped)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == AdState::Stopped
    }
}

impl std::fmt::Display for AdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdState::Uninitialized => write!(f, "uninitialized"),
            AdState::Initialized => write!(f, "initialized"),
            AdState::Playing => write!(f, "playing"),
            AdState::Paused => write!(f, "paused"),
            AdState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Ad unit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdConfig {
    /// Delay between `stopAd` and the `AdStopped` dispatch (milliseconds)
    pub stop_delay_ms: u64,
    /// Pause this many seconds before the natural end and rewind on the next play
    pub end_hold: Option<f64>,
    /// Nested dispatches deeper than this are dropped
    pub max_dispatch_depth: u32,
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            stop_delay_ms: 75,
            end_hold: None,
            max_dispatch_depth: 32,
        }
    }
}

impl AdConfig {
    /// Config that holds on the last second of the creative instead of ending
    pub fn hold_last_second() -> Self {
        Self {
            end_hold: Some(1.0),
            ..Default::default()
        }
    }

    pub fn stop_delay(&self) -> Duration {
        Duration::from_millis(self.stop_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_call_order_is_valid() {
        use AdState::*;
        assert!(Uninitialized.can_transition_to(Initialized));
        assert!(Initialized.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Playing));
        assert!(Paused.can_transition_to(Stopped));
    }

    #[test]
    fn test_stop_from_every_active_state() {
        use AdState::*;
        for from in [Uninitialized, Initialized, Playing, Paused] {
            assert!(from.can_transition_to(Stopped), "{from} -> stopped");
        }
    }

    #[test]
    fn test_stopped_is_terminal() {
        use AdState::*;
        for target in [Uninitialized, Initialized, Playing, Paused, Stopped] {
            assert!(!Stopped.can_transition_to(target));
        }
        assert!(Stopped.is_terminal());
    }

    #[test]
    fn test_cannot_skip_start() {
        assert!(!AdState::Uninitialized.can_transition_to(AdState::Playing));
        assert!(!AdState::Initialized.can_transition_to(AdState::Paused));
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: AdConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AdConfig::default());
        assert_eq!(config.stop_delay(), Duration::from_millis(75));
        assert_eq!(AdConfig::hold_last_second().end_hold, Some(1.0));
    }
}
