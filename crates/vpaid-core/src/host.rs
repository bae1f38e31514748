//! Host collaborators
//!
//! The ad unit never owns the page: the container slot, the media element,
//! timers and the overlay are supplied by whatever embeds it (a browser
//! binding, the headless host, a test).

use crate::creative::CreativeParameters;
use crate::Result;
use std::rc::Rc;
use std::time::Duration;

/// Asynchronous signals a media element reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSignal {
    /// Playback position changed
    TimeUpdate,
    /// End of stream reached
    Ended,
    /// Playback (re)started
    Play,
}

impl MediaSignal {
    /// DOM event name for this signal
    pub fn event_name(&self) -> &'static str {
        match self {
            MediaSignal::TimeUpdate => "timeupdate",
            MediaSignal::Ended => "ended",
            MediaSignal::Play => "play",
        }
    }
}

/// Handler attached to a media signal
pub type SignalHandler = Rc<dyn Fn()>;

/// The video surface the creative plays on
pub trait MediaElement {
    fn set_source(&self, url: &str) -> Result<()>;

    fn set_dimensions(&self, width: u32, height: u32) -> Result<()>;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Total duration in seconds; NaN while unknown
    fn duration(&self) -> f64;

    fn seek(&self, position: f64) -> Result<()>;

    /// Attach `handler` to `signal`
    fn observe(&self, signal: MediaSignal, handler: SignalHandler) -> Result<()>;
}

/// The host container the ad occupies
pub trait AdSlot {
    type Media: MediaElement;

    /// Create a media element inside the slot, used when the host supplied none
    fn create_media_element(&self) -> Result<Self::Media>;

    /// Present the host-designated element fullscreen
    fn request_fullscreen(&self) -> Result<()>;
}

/// Deferred task runner
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

/// Presentation layer built on `startAd`
pub trait Overlay {
    fn build(&self, parameters: &CreativeParameters) -> Result<()>;
}

/// The `environmentVars` argument of `initAd`
pub struct EnvironmentVars<S: AdSlot> {
    pub slot: Option<S>,
    pub video_slot: Option<S::Media>,
}

impl<S: AdSlot> EnvironmentVars<S> {
    pub fn new(slot: S, video_slot: S::Media) -> Self {
        Self {
            slot: Some(slot),
            video_slot: Some(video_slot),
        }
    }

    /// Slot only; the ad unit creates its own media element
    pub fn slot_only(slot: S) -> Self {
        Self {
            slot: Some(slot),
            video_slot: None,
        }
    }
}
