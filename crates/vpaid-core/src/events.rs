//! Event dispatch
//!
//! One callback slot per event name. Subscribing again under the same name
//! replaces the previous callback; dispatching a name with an empty slot is
//! a silent no-op.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, warn};

/// Standard VPAID events emitted by the ad unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdEvent {
    AdLoaded,
    AdImpression,
    AdStarted,
    AdStopped,
    AdVolumeChange,
    AdSizeChange,
    AdPaused,
    AdResumed,
    AdExpanded,
    AdSkipped,
    AdVideoStart,
    AdVideoFirstQuartile,
    AdVideoMidpoint,
    AdVideoThirdQuartile,
    AdVideoComplete,
    AdClickThru,
}

impl AdEvent {
    pub const ALL: [AdEvent; 16] = [
        AdEvent::AdLoaded,
        AdEvent::AdImpression,
        AdEvent::AdStarted,
        AdEvent::AdStopped,
        AdEvent::AdVolumeChange,
        AdEvent::AdSizeChange,
        AdEvent::AdPaused,
        AdEvent::AdResumed,
        AdEvent::AdExpanded,
        AdEvent::AdSkipped,
        AdEvent::AdVideoStart,
        AdEvent::AdVideoFirstQuartile,
        AdEvent::AdVideoMidpoint,
        AdEvent::AdVideoThirdQuartile,
        AdEvent::AdVideoComplete,
        AdEvent::AdClickThru,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdEvent::AdLoaded => "AdLoaded",
            AdEvent::AdImpression => "AdImpression",
            AdEvent::AdStarted => "AdStarted",
            AdEvent::AdStopped => "AdStopped",
            AdEvent::AdVolumeChange => "AdVolumeChange",
            AdEvent::AdSizeChange => "AdSizeChange",
            AdEvent::AdPaused => "AdPaused",
            AdEvent::AdResumed => "AdResumed",
            AdEvent::AdExpanded => "AdExpanded",
            AdEvent::AdSkipped => "AdSkipped",
            AdEvent::AdVideoStart => "AdVideoStart",
            AdEvent::AdVideoFirstQuartile => "AdVideoFirstQuartile",
            AdEvent::AdVideoMidpoint => "AdVideoMidpoint",
            AdEvent::AdVideoThirdQuartile => "AdVideoThirdQuartile",
            AdEvent::AdVideoComplete => "AdVideoComplete",
            AdEvent::AdClickThru => "AdClickThru",
        }
    }

    /// Returns true for the playback-progress events
    pub fn is_quartile(&self) -> bool {
        matches!(
            self,
            AdEvent::AdVideoStart
                | AdEvent::AdVideoFirstQuartile
                | AdEvent::AdVideoMidpoint
                | AdEvent::AdVideoThirdQuartile
                | AdEvent::AdVideoComplete
        )
    }
}

impl FromStr for AdEvent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AdEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| format!("unknown event: {s}"))
    }
}

impl std::fmt::Display for AdEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host callback. Any context the host needs is captured by the closure.
pub type Callback = Rc<dyn Fn()>;

struct Registry {
    slots: RefCell<HashMap<String, Callback>>,
    depth: Cell<u32>,
    max_depth: u32,
}

/// Shared handle to the event-name → callback registry
///
/// Cloning the handle shares the registry, which lets deferred tasks
/// (the delayed `AdStopped`) dispatch after the call that scheduled them.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Rc<Registry>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_max_depth(32)
    }

    /// Dispatcher that drops dispatches nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            inner: Rc::new(Registry {
                slots: RefCell::new(HashMap::new()),
                depth: Cell::new(0),
                max_depth,
            }),
        }
    }

    /// Register `callback` for `event_name`, replacing any previous one.
    /// Returns true if a callback was replaced.
    pub fn subscribe(&self, event_name: impl Into<String>, callback: impl Fn() + 'static) -> bool {
        let event_name = event_name.into();
        debug!(event = %event_name, "Subscribe");
        self.inner
            .slots
            .borrow_mut()
            .insert(event_name, Rc::new(callback))
            .is_some()
    }

    /// Clear the callback for `event_name`. No-op if none is registered.
    pub fn unsubscribe(&self, event_name: &str) {
        debug!(event = %event_name, "Unsubscribe");
        self.inner.slots.borrow_mut().remove(event_name);
    }

    pub fn is_subscribed(&self, event_name: &str) -> bool {
        self.inner.slots.borrow().contains_key(event_name)
    }

    /// Invoke the callback registered for `event_name`, if any.
    /// Returns true if a callback ran.
    pub fn dispatch(&self, event_name: &str) -> bool {
        // Clone the slot out so the callback may subscribe/unsubscribe freely
        let callback = self.inner.slots.borrow().get(event_name).cloned();
        let Some(callback) = callback else {
            debug!(event = %event_name, "No listener");
            return false;
        };

        let depth = self.inner.depth.get();
        if depth >= self.inner.max_depth {
            warn!(event = %event_name, depth, "Dispatch nesting too deep, dropping event");
            return false;
        }

        debug!(event = %event_name, "Dispatch");
        self.inner.depth.set(depth + 1);
        callback();
        self.inner.depth.set(depth);
        true
    }

    pub fn emit(&self, event: AdEvent) -> bool {
        self.dispatch(event.as_str())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = count.clone();
        (count, move || handle.set(handle.get() + 1))
    }

    #[test]
    fn test_dispatch_invokes_callback() {
        let dispatcher = EventDispatcher::new();
        let (count, callback) = counter();
        dispatcher.subscribe("AdLoaded", callback);

        assert!(dispatcher.emit(AdEvent::AdLoaded));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_last_subscription_wins() {
        let dispatcher = EventDispatcher::new();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        assert!(!dispatcher.subscribe("AdPaused", first_cb));
        assert!(dispatcher.subscribe("AdPaused", second_cb));
        dispatcher.dispatch("AdPaused");

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_unsubscribe_then_dispatch_is_silent() {
        let dispatcher = EventDispatcher::new();
        let (count, callback) = counter();
        dispatcher.subscribe("AdStarted", callback);
        dispatcher.unsubscribe("AdStarted");

        assert!(!dispatcher.dispatch("AdStarted"));
        assert_eq!(count.get(), 0);

        // Unsubscribing an unknown name is fine too
        dispatcher.unsubscribe("AdNeverSeen");
    }

    #[test]
    fn test_callback_may_resubscribe_during_dispatch() {
        let dispatcher = EventDispatcher::new();
        let inner = dispatcher.clone();
        dispatcher.subscribe("AdSkipped", move || {
            inner.unsubscribe("AdSkipped");
        });

        assert!(dispatcher.dispatch("AdSkipped"));
        assert!(!dispatcher.is_subscribed("AdSkipped"));
    }

    #[test]
    fn test_recursive_dispatch_is_bounded() {
        let dispatcher = EventDispatcher::with_max_depth(4);
        let (count, bump) = counter();
        let inner = dispatcher.clone();
        dispatcher.subscribe("AdVolumeChange", move || {
            bump();
            inner.dispatch("AdVolumeChange");
        });

        dispatcher.dispatch("AdVolumeChange");
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AdEvent::AdVideoFirstQuartile.to_string(), "AdVideoFirstQuartile");
        assert_eq!("AdClickThru".parse::<AdEvent>().unwrap(), AdEvent::AdClickThru);
        assert!("AdCollapsed".parse::<AdEvent>().is_err());
        assert!(AdEvent::AdVideoMidpoint.is_quartile());
        assert!(!AdEvent::AdStopped.is_quartile());
    }
}
