//! Ad Unit - lifecycle controller for a single linear ad
//!
//! Coordinates:
//! - State machine transitions
//! - Attribute mutations
//! - Quartile tracking from media position updates
//! - Event dispatch to the host
//!
//! All methods take `&self`. Every piece of mutable state sits in its own
//! cell and no borrow is held while a host callback runs, so callbacks may
//! call straight back into the ad (hosts commonly call `startAd` from their
//! `AdLoaded` listener).

use crate::{
    attributes::{AttributeName, AttributeStore, AttributeValue},
    creative::{CreativeData, CreativeParameters},
    events::{AdEvent, EventDispatcher},
    host::{AdSlot, EnvironmentVars, MediaElement, MediaSignal, Overlay, Scheduler, SignalHandler},
    quartile::PlaybackMonitor,
    types::{AdConfig, AdState, AdUnitId, VPAID_VERSION},
    Error, Result,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// A VPAID 2.0 linear ad
pub struct AdUnit<S: AdSlot> {
    /// Unique instance ID
    id: AdUnitId,
    /// Unit configuration
    config: AdConfig,
    /// Current lifecycle state
    state: Cell<AdState>,
    /// Gettable/settable attributes
    attributes: RefCell<AttributeStore>,
    /// Host callback registry
    dispatcher: EventDispatcher,
    /// Quartile progress
    monitor: Cell<PlaybackMonitor>,
    /// Creative parameters, set once by `initAd`
    parameters: RefCell<Option<Rc<CreativeParameters>>>,
    /// Host container
    slot: RefCell<Option<Rc<S>>>,
    /// Media element, host supplied or created
    media: RefCell<Option<Rc<S::Media>>>,
    /// Runs the delayed `AdStopped`
    scheduler: Box<dyn Scheduler>,
    /// Presentation layer
    overlay: Option<Box<dyn Overlay>>,
    /// Rewind to the start on the next play (end hold)
    rewind_armed: Cell<bool>,
}

impl<S: AdSlot + 'static> AdUnit<S> {
    /// Create an uninitialized ad unit
    pub fn new(config: AdConfig, scheduler: impl Scheduler + 'static) -> Self {
        let dispatcher = EventDispatcher::with_max_depth(config.max_dispatch_depth);

        Self {
            id: AdUnitId::new(),
            config,
            state: Cell::new(AdState::Uninitialized),
            attributes: RefCell::new(AttributeStore::new()),
            dispatcher,
            monitor: Cell::new(PlaybackMonitor::new()),
            parameters: RefCell::new(None),
            slot: RefCell::new(None),
            media: RefCell::new(None),
            scheduler: Box::new(scheduler),
            overlay: None,
            rewind_armed: Cell::new(false),
        }
    }

    /// Attach the presentation layer built on `startAd`
    pub fn with_overlay(mut self, overlay: impl Overlay + 'static) -> Self {
        self.overlay = Some(Box::new(overlay));
        self
    }

    pub fn id(&self) -> AdUnitId {
        self.id
    }

    pub fn state(&self) -> AdState {
        self.state.get()
    }

    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    /// Index of the next quartile to report
    pub fn quartile_index(&self) -> usize {
        self.monitor.get().next_index()
    }

    /// Creative parameters, available after `initAd`
    pub fn parameters(&self) -> Option<Rc<CreativeParameters>> {
        self.parameters.borrow().clone()
    }

    /// Bound media element, available after `initAd`
    pub fn media(&self) -> Option<Rc<S::Media>> {
        self.media.borrow().clone()
    }

    /// Supported protocol version; the host's version is ignored
    pub fn handshake_version(&self, _version: &str) -> &'static str {
        VPAID_VERSION
    }

    /// Transition to new state
    fn set_state(&self, target: AdState, operation: &'static str) -> Result<()> {
        let current = self.state.get();

        if !current.can_transition_to(target) {
            warn!(ad = %self.id, from = %current, operation, "Rejected lifecycle call");
            return Err(Error::InvalidStateTransition { from: current, operation });
        }

        self.state.set(target);
        info!(ad = %self.id, from = %current, to = %target, "State transition");

        Ok(())
    }

    /// Reject calls once the ad has stopped
    fn ensure_active(&self, operation: &'static str) -> Result<()> {
        let current = self.state.get();
        if current.is_terminal() {
            warn!(ad = %self.id, operation, "Ad already stopped");
            return Err(Error::InvalidStateTransition { from: current, operation });
        }
        Ok(())
    }

    /// Media element required by `operation`
    fn require_media(&self, operation: &'static str) -> Result<Rc<S::Media>> {
        self.media().ok_or(Error::InvalidStateTransition {
            from: self.state.get(),
            operation,
        })
    }

    fn emit(&self, event: AdEvent) {
        self.dispatcher.emit(event);
    }

    /// Initialize the ad: store the requested geometry, bind the host's
    /// slot and media element, parse creative parameters, and start loading.
    ///
    /// Dispatches `AdLoaded` then `AdImpression`. A malformed ad parameters
    /// payload fails the call and leaves the ad uninitialized.
    pub fn init_ad(
        self: &Rc<Self>,
        width: u32,
        height: u32,
        view_mode: &str,
        desired_bitrate: u32,
        creative_data: &CreativeData,
        environment: EnvironmentVars<S>,
    ) -> Result<()> {
        let current = self.state.get();
        if current != AdState::Uninitialized {
            warn!(ad = %self.id, state = %current, "initAd called twice");
            return Err(Error::InvalidStateTransition { from: current, operation: "initAd" });
        }

        info!(ad = %self.id, width, height, view_mode, desired_bitrate, "Initializing ad");

        {
            let mut attributes = self.attributes.borrow_mut();
            attributes.set(AttributeName::Width, width);
            attributes.set(AttributeName::Height, height);
            attributes.set(AttributeName::ViewMode, view_mode);
            attributes.set(AttributeName::DesiredBitrate, desired_bitrate);
        }

        let parameters = Rc::new(creative_data.parameters()?);

        let EnvironmentVars { slot, video_slot } = environment;
        let media = match video_slot {
            Some(media) => media,
            None => {
                let slot = slot.as_ref().ok_or(Error::MissingSlot)?;
                warn!(ad = %self.id, "No video element passed to ad, creating element");
                slot.create_media_element()?
            }
        };
        let media = Rc::new(media);

        match parameters.video_url.as_deref() {
            Some(url) => media.set_source(url)?,
            None => warn!(ad = %self.id, "Creative parameters carry no videoUrl"),
        }
        media.set_dimensions(width, height)?;
        self.attach_observers(&media)?;

        // Nothing is bound until every fallible media step has succeeded
        *self.slot.borrow_mut() = slot.map(Rc::new);
        *self.media.borrow_mut() = Some(media.clone());
        *self.parameters.borrow_mut() = Some(parameters);
        self.monitor.set(PlaybackMonitor::new());

        self.set_state(AdState::Initialized, "initAd")?;

        self.emit(AdEvent::AdLoaded);
        self.emit(AdEvent::AdImpression);

        if let Err(e) = media.play() {
            warn!(ad = %self.id, error = %e, "Media element refused to play");
        }

        Ok(())
    }

    /// Route the media element's signals back into this ad without keeping it alive.
    /// If any attachment fails, the ones already attached are disarmed.
    fn attach_observers(self: &Rc<Self>, media: &S::Media) -> Result<()> {
        let armed = Rc::new(Cell::new(true));

        let observer = |handle: fn(&Self)| -> SignalHandler {
            let weak = Rc::downgrade(self);
            let armed = armed.clone();
            Rc::new(move || {
                if !armed.get() {
                    return;
                }
                if let Some(ad) = weak.upgrade() {
                    handle(&ad);
                }
            })
        };

        let attached = media
            .observe(MediaSignal::TimeUpdate, observer(Self::handle_time_update))
            .and_then(|()| media.observe(MediaSignal::Ended, observer(Self::handle_ended)))
            .and_then(|()| media.observe(MediaSignal::Play, observer(Self::handle_play)));

        if let Err(e) = attached {
            armed.set(false);
            return Err(e);
        }

        debug!(ad = %self.id, "Media observers attached");
        Ok(())
    }

    /// Start the ad: build the overlay and dispatch `AdStarted`
    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn start_ad(&self) -> Result<()> {
        self.set_state(AdState::Playing, "startAd")?;

        if let (Some(overlay), Some(parameters)) = (&self.overlay, self.parameters()) {
            if let Err(e) = overlay.build(&parameters) {
                warn!(error = %e, "Overlay failed to build");
            }
        }

        self.emit(AdEvent::AdStarted);
        Ok(())
    }

    /// Stop the ad. `AdStopped` is dispatched after the configured delay so
    /// that events already in flight reach the host first.
    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn stop_ad(&self) -> Result<()> {
        self.set_state(AdState::Stopped, "stopAd")?;

        let dispatcher = self.dispatcher.clone();
        self.scheduler.schedule(
            self.config.stop_delay(),
            Box::new(move || {
                dispatcher.emit(AdEvent::AdStopped);
            }),
        );

        Ok(())
    }

    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn pause_ad(&self) -> Result<()> {
        self.ensure_active("pauseAd")?;
        let media = self.require_media("pauseAd")?;

        media.pause()?;
        if self.state.get() == AdState::Playing {
            self.set_state(AdState::Paused, "pauseAd")?;
        }

        self.emit(AdEvent::AdPaused);
        Ok(())
    }

    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn resume_ad(&self) -> Result<()> {
        self.ensure_active("resumeAd")?;
        let media = self.require_media("resumeAd")?;

        media.play()?;
        if self.state.get() == AdState::Paused {
            self.set_state(AdState::Playing, "resumeAd")?;
        }

        self.emit(AdEvent::AdResumed);
        Ok(())
    }

    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn resize_ad(&self, width: u32, height: u32, view_mode: &str) -> Result<()> {
        self.ensure_active("resizeAd")?;

        {
            let mut attributes = self.attributes.borrow_mut();
            attributes.set(AttributeName::Width, width);
            attributes.set(AttributeName::Height, height);
            attributes.set(AttributeName::ViewMode, view_mode);
        }

        if let Some(media) = self.media() {
            media.set_dimensions(width, height)?;
        }

        self.emit(AdEvent::AdSizeChange);
        Ok(())
    }

    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn expand_ad(&self) -> Result<()> {
        self.ensure_active("expandAd")?;
        self.attributes.borrow_mut().set(AttributeName::Expanded, true);

        let slot = self.slot.borrow().clone();
        if let Some(slot) = slot {
            if let Err(e) = slot.request_fullscreen() {
                warn!(error = %e, "Fullscreen request failed");
            }
        }

        self.emit(AdEvent::AdExpanded);
        Ok(())
    }

    /// Clear the expanded flag. Dispatches nothing.
    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn collapse_ad(&self) -> Result<()> {
        self.ensure_active("collapseAd")?;
        self.attributes.borrow_mut().set(AttributeName::Expanded, false);
        Ok(())
    }

    /// Dispatch `AdSkipped` if the ad is currently skippable; otherwise do nothing
    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn skip_ad(&self) -> Result<()> {
        self.ensure_active("skipAd")?;

        if self.get_ad_skippable_state() {
            self.emit(AdEvent::AdSkipped);
        } else {
            debug!("Ad not skippable, ignoring skipAd");
        }
        Ok(())
    }

    /// Store the volume (no clamping) and dispatch `AdVolumeChange`
    #[instrument(skip(self), fields(ad = %self.id))]
    pub fn set_ad_volume(&self, value: f64) -> Result<()> {
        self.ensure_active("setAdVolume")?;
        self.attributes.borrow_mut().set(AttributeName::Volume, value);
        self.emit(AdEvent::AdVolumeChange);
        Ok(())
    }

    /// Toggle between muted and full volume
    pub fn toggle_mute(&self) -> Result<()> {
        self.ensure_active("toggleMute")?;

        let next = if self.get_ad_volume() == 0.0 { 1.0 } else { 0.0 };
        self.attributes.borrow_mut().set(AttributeName::Volume, next);
        debug!(ad = %self.id, volume = next, "Mute toggled");

        self.emit(AdEvent::AdVolumeChange);
        Ok(())
    }

    /// Report a click on the overlay
    pub fn click_thru(&self) -> Result<()> {
        self.ensure_active("clickThru")?;
        self.emit(AdEvent::AdClickThru);
        Ok(())
    }

    /// Register `callback` for `event_name`, replacing any earlier one
    pub fn subscribe(&self, callback: impl Fn() + 'static, event_name: &str) {
        self.dispatcher.subscribe(event_name, callback);
    }

    pub fn unsubscribe(&self, event_name: &str) {
        self.dispatcher.unsubscribe(event_name);
    }

    /// Shared handle to the event registry
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Raw attribute read by VPAID name
    pub fn attribute(&self, name: &str) -> Result<AttributeValue> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Overwrite an attribute without dispatching anything
    pub fn set_attribute(&self, name: AttributeName, value: impl Into<AttributeValue>) {
        self.attributes.borrow_mut().set(name, value);
    }

    pub fn get_ad_width(&self) -> u32 {
        self.attributes.borrow().number(AttributeName::Width) as u32
    }

    pub fn get_ad_height(&self) -> u32 {
        self.attributes.borrow().number(AttributeName::Height) as u32
    }

    pub fn get_ad_view_mode(&self) -> String {
        self.attributes.borrow().text(AttributeName::ViewMode)
    }

    pub fn get_ad_desired_bitrate(&self) -> u32 {
        self.attributes.borrow().number(AttributeName::DesiredBitrate) as u32
    }

    pub fn get_ad_volume(&self) -> f64 {
        self.attributes.borrow().number(AttributeName::Volume)
    }

    pub fn get_ad_remaining_time(&self) -> f64 {
        self.attributes.borrow().number(AttributeName::RemainingTime)
    }

    /// Fails with `UnknownAttribute` until a duration has been set
    pub fn get_ad_duration(&self) -> Result<f64> {
        let attributes = self.attributes.borrow();
        let value = attributes.get_attr(AttributeName::Duration)?;
        value
            .as_f64()
            .ok_or_else(|| Error::UnknownAttribute(AttributeName::Duration.to_string()))
    }

    pub fn get_ad_companions(&self) -> String {
        self.attributes.borrow().text(AttributeName::Companions)
    }

    pub fn get_ad_icons(&self) -> String {
        self.attributes.borrow().text(AttributeName::Icons)
    }

    pub fn get_ad_linear(&self) -> bool {
        self.attributes.borrow().flag(AttributeName::Linear)
    }

    pub fn get_ad_expanded(&self) -> bool {
        self.attributes.borrow().flag(AttributeName::Expanded)
    }

    pub fn get_ad_skippable_state(&self) -> bool {
        self.attributes.borrow().flag(AttributeName::SkippableState)
    }

    /// Position update from the media element
    pub fn handle_time_update(&self) {
        if matches!(self.state.get(), AdState::Uninitialized | AdState::Stopped) {
            return;
        }
        let Some(media) = self.media() else {
            return;
        };

        let current_time = media.current_time();
        let duration = media.duration();

        if let Some(hold) = self.config.end_hold {
            if !self.rewind_armed.get() && current_time + hold >= duration {
                debug!(ad = %self.id, current_time, duration, "Holding before end");
                if let Err(e) = media.pause() {
                    warn!(ad = %self.id, error = %e, "Failed to pause for end hold");
                }
                self.rewind_armed.set(true);
            }
        }

        let mut monitor = self.monitor.get();
        let reached = monitor.observe(current_time, duration);
        self.monitor.set(monitor);

        if let Some(event) = reached {
            debug!(ad = %self.id, %event, current_time, duration, "Quartile reached");
            self.emit(event);
        }
    }

    /// End of stream from the media element
    pub fn handle_ended(&self) {
        if matches!(self.state.get(), AdState::Uninitialized | AdState::Stopped) {
            debug!(ad = %self.id, state = %self.state.get(), "Ended outside playback, ignoring");
            return;
        }
        info!(ad = %self.id, "Media ended");
        if let Err(e) = self.stop_ad() {
            warn!(ad = %self.id, error = %e, "Stop on end of stream failed");
        }
    }

    /// Playback (re)started on the media element
    pub fn handle_play(&self) {
        if !self.rewind_armed.replace(false) {
            return;
        }
        if let Some(media) = self.media() {
            debug!(ad = %self.id, "Rewinding after end hold");
            if let Err(e) = media.seek(0.0) {
                warn!(ad = %self.id, error = %e, "Rewind failed");
            }
        }
    }
}
