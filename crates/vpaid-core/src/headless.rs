//! Headless host
//!
//! In-memory implementations of the host collaborators so the full ad
//! lifecycle runs without a browser. Every type is a cheap shared handle:
//! clone it, hand one copy to the ad, and drive or inspect it through the
//! other.

use crate::host::{AdSlot, MediaElement, MediaSignal, Scheduler, SignalHandler};
use crate::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

struct VideoState {
    source: Option<String>,
    width: u32,
    height: u32,
    paused: bool,
    current_time: f64,
    duration: f64,
    handlers: HashMap<MediaSignal, Vec<SignalHandler>>,
}

/// Fake media element with a host-driven clock
#[derive(Clone)]
pub struct HeadlessVideo {
    state: Rc<RefCell<VideoState>>,
}

impl HeadlessVideo {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(VideoState {
                source: None,
                width: 0,
                height: 0,
                paused: true,
                current_time: 0.0,
                duration: f64::NAN,
                handlers: HashMap::new(),
            })),
        }
    }

    /// Media with known duration (seconds)
    pub fn with_duration(duration: f64) -> Self {
        let video = Self::new();
        video.set_duration(duration);
        video
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.borrow_mut().duration = duration;
    }

    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Move the clock and report a position update
    pub fn advance_to(&self, current_time: f64) {
        self.state.borrow_mut().current_time = current_time;
        self.fire(MediaSignal::TimeUpdate);
    }

    /// Run to the end and report end of stream
    pub fn finish(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.current_time = state.duration;
            state.paused = true;
        }
        self.fire(MediaSignal::TimeUpdate);
        self.fire(MediaSignal::Ended);
    }

    /// Invoke every handler attached to `signal`
    pub fn fire(&self, signal: MediaSignal) {
        let handlers = self
            .state
            .borrow()
            .handlers
            .get(&signal)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler();
        }
    }
}

impl Default for HeadlessVideo {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for HeadlessVideo {
    fn set_source(&self, url: &str) -> Result<()> {
        self.state.borrow_mut().source = Some(url.to_string());
        Ok(())
    }

    fn set_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
        Ok(())
    }

    fn play(&self) -> Result<()> {
        self.state.borrow_mut().paused = false;
        self.fire(MediaSignal::Play);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.state.borrow_mut().paused = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn seek(&self, position: f64) -> Result<()> {
        self.state.borrow_mut().current_time = position;
        Ok(())
    }

    fn observe(&self, signal: MediaSignal, handler: SignalHandler) -> Result<()> {
        self.state
            .borrow_mut()
            .handlers
            .entry(signal)
            .or_default()
            .push(handler);
        Ok(())
    }
}

#[derive(Default)]
struct SlotState {
    created: Vec<HeadlessVideo>,
    fullscreen_requests: u32,
}

/// Fake host container
#[derive(Clone, Default)]
pub struct HeadlessSlot {
    state: Rc<RefCell<SlotState>>,
    duration: Option<f64>,
}

impl HeadlessSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot whose created media elements report `duration`
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Number of media elements the ad created in this slot
    pub fn created(&self) -> usize {
        self.state.borrow().created.len()
    }

    pub fn fullscreen_requests(&self) -> u32 {
        self.state.borrow().fullscreen_requests
    }
}

impl AdSlot for HeadlessSlot {
    type Media = HeadlessVideo;

    fn create_media_element(&self) -> Result<HeadlessVideo> {
        let video = match self.duration {
            Some(duration) => HeadlessVideo::with_duration(duration),
            None => HeadlessVideo::new(),
        };
        self.state.borrow_mut().created.push(video.clone());
        Ok(video)
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.state.borrow_mut().fullscreen_requests += 1;
        Ok(())
    }
}

struct ScheduledTask {
    delay: Duration,
    task: Box<dyn FnOnce()>,
}

/// Scheduler that holds deferred tasks until the caller runs them
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Vec<ScheduledTask>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Delays of the queued tasks, in scheduling order
    pub fn delays(&self) -> Vec<Duration> {
        self.queue.borrow().iter().map(|t| t.delay).collect()
    }

    /// Run every queued task; returns how many ran
    pub fn run_pending(&self) -> usize {
        let tasks: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let count = tasks.len();
        for scheduled in tasks {
            (scheduled.task)();
        }
        count
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push(ScheduledTask { delay, task });
    }
}
