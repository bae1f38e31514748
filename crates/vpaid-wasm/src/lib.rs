//! VPAID WASM - VPAID 2.0 ad unit for browser video players
//!
//! Exposes the standard `getVPAIDAd()` entry point. The returned object
//! carries the VPAID 2.0 method set and is backed by `vpaid-core`.
//!
//! ## Integration
//!
//! ```javascript
//! import init, { getVPAIDAd } from './pkg/vpaid_wasm.js';
//!
//! await init();
//! const ad = getVPAIDAd();
//! ad.subscribe(() => ad.startAd(), 'AdLoaded', null);
//! ad.initAd(640, 360, 'normal', 256,
//!           { AdParameters: JSON.stringify({ videoUrl: 'ad.mp4' }) },
//!           { slot: slotDiv, videoSlot: videoElement });
//! ```

use std::rc::Rc;

use vpaid_core::{AdConfig, AdUnit, CreativeData, EnvironmentVars, Error};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlVideoElement};

mod dom;

pub use dom::{JsOverlay, WebSlot, WebVideo, WindowScheduler};

/// VPAID sentinel for "duration not implemented"
pub const DURATION_UNAVAILABLE: f64 = -2.0;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"[VPAID WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Entry point the host player calls to obtain the ad
#[wasm_bindgen(js_name = getVPAIDAd)]
pub fn get_vpaid_ad() -> VpaidAd {
    VpaidAd::new()
}

/// Duration reported to the host; the VPAID sentinel when unknown
fn duration_or_sentinel(duration: vpaid_core::Result<f64>) -> f64 {
    duration.unwrap_or(DURATION_UNAVAILABLE)
}

fn error_message(err: &Error) -> String {
    format!("[{}] {}", err.error_code(), err)
}

/// Log a failed call; VPAID hosts do not expect lifecycle methods to throw
fn report(operation: &str, result: vpaid_core::Result<()>) {
    if let Err(e) = result {
        web_sys::console::warn_1(&format!("[VPAID WASM] {operation}: {}", error_message(&e)).into());
    }
}

/// Look up an optional DOM reference on the `environmentVars` object
fn env_field<T: JsCast>(environment: &JsValue, key: &str) -> Option<T> {
    js_sys::Reflect::get(environment, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.dyn_into::<T>().ok())
}

/// VPAID 2.0 ad object
#[wasm_bindgen]
pub struct VpaidAd {
    ad: Rc<AdUnit<WebSlot>>,
    overlay: JsOverlay,
}

#[wasm_bindgen]
impl VpaidAd {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let overlay = JsOverlay::default();
        let ad = AdUnit::new(AdConfig::default(), WindowScheduler).with_overlay(overlay.clone());
        Self {
            ad: Rc::new(ad),
            overlay,
        }
    }

    #[wasm_bindgen(js_name = handshakeVersion)]
    pub fn handshake_version(&self, version: String) -> String {
        self.ad.handshake_version(&version).to_string()
    }

    /// Throws if the ad parameters are not valid JSON or no slot was supplied
    #[wasm_bindgen(js_name = initAd)]
    pub fn init_ad(
        &self,
        width: u32,
        height: u32,
        view_mode: String,
        desired_bitrate: u32,
        creative_data: JsValue,
        environment_vars: JsValue,
    ) -> Result<(), JsError> {
        let creative_data: CreativeData = if creative_data.is_undefined() || creative_data.is_null() {
            CreativeData::default()
        } else {
            serde_wasm_bindgen::from_value(creative_data)
                .map_err(|e| JsError::new(&format!("[INVALID_CREATIVE_DATA] {e}")))?
        };

        let environment = EnvironmentVars {
            slot: env_field::<Element>(&environment_vars, "slot").map(WebSlot::new),
            video_slot: env_field::<HtmlVideoElement>(&environment_vars, "videoSlot").map(WebVideo::new),
        };

        self.ad
            .init_ad(width, height, &view_mode, desired_bitrate, &creative_data, environment)
            .map_err(|e| JsError::new(&error_message(&e)))
    }

    #[wasm_bindgen(js_name = startAd)]
    pub fn start_ad(&self) {
        report("startAd", self.ad.start_ad());
    }

    #[wasm_bindgen(js_name = stopAd)]
    pub fn stop_ad(&self) {
        report("stopAd", self.ad.stop_ad());
    }

    #[wasm_bindgen(js_name = pauseAd)]
    pub fn pause_ad(&self) {
        report("pauseAd", self.ad.pause_ad());
    }

    #[wasm_bindgen(js_name = resumeAd)]
    pub fn resume_ad(&self) {
        report("resumeAd", self.ad.resume_ad());
    }

    #[wasm_bindgen(js_name = resizeAd)]
    pub fn resize_ad(&self, width: u32, height: u32, view_mode: String) {
        report("resizeAd", self.ad.resize_ad(width, height, &view_mode));
    }

    #[wasm_bindgen(js_name = expandAd)]
    pub fn expand_ad(&self) {
        report("expandAd", self.ad.expand_ad());
    }

    #[wasm_bindgen(js_name = collapseAd)]
    pub fn collapse_ad(&self) {
        report("collapseAd", self.ad.collapse_ad());
    }

    #[wasm_bindgen(js_name = skipAd)]
    pub fn skip_ad(&self) {
        report("skipAd", self.ad.skip_ad());
    }

    #[wasm_bindgen(js_name = setAdVolume)]
    pub fn set_ad_volume(&self, value: f64) {
        report("setAdVolume", self.ad.set_ad_volume(value));
    }

    #[wasm_bindgen(js_name = getAdVolume)]
    pub fn get_ad_volume(&self) -> f64 {
        self.ad.get_ad_volume()
    }

    /// Called by the overlay when the creative is clicked
    #[wasm_bindgen(js_name = clickThru)]
    pub fn click_thru(&self) {
        report("clickThru", self.ad.click_thru());
    }

    /// Called by the overlay's mute button
    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) {
        report("toggleMute", self.ad.toggle_mute());
    }

    /// Register the function that builds the overlay on `startAd`.
    /// It receives the creative parameters as a plain object.
    #[wasm_bindgen(js_name = setOverlay)]
    pub fn set_overlay(&self, builder: js_sys::Function) {
        self.overlay.set_builder(builder);
    }

    /// Register `callback` for `event_name`, bound to `context`
    #[wasm_bindgen]
    pub fn subscribe(&self, callback: js_sys::Function, event_name: String, context: JsValue) {
        let bound = callback.bind(&context);
        let name = event_name.clone();
        self.ad.subscribe(
            move || {
                if let Err(e) = bound.call0(&JsValue::NULL) {
                    web_sys::console::error_2(&format!("[VPAID WASM] {name} listener threw:").into(), &e);
                }
            },
            &event_name,
        );
    }

    #[wasm_bindgen]
    pub fn unsubscribe(&self, event_name: String) {
        self.ad.unsubscribe(&event_name);
    }

    #[wasm_bindgen(js_name = getAdWidth)]
    pub fn get_ad_width(&self) -> u32 {
        self.ad.get_ad_width()
    }

    #[wasm_bindgen(js_name = getAdHeight)]
    pub fn get_ad_height(&self) -> u32 {
        self.ad.get_ad_height()
    }

    #[wasm_bindgen(js_name = getAdRemainingTime)]
    pub fn get_ad_remaining_time(&self) -> f64 {
        self.ad.get_ad_remaining_time()
    }

    #[wasm_bindgen(js_name = getAdDuration)]
    pub fn get_ad_duration(&self) -> f64 {
        duration_or_sentinel(self.ad.get_ad_duration())
    }

    #[wasm_bindgen(js_name = getAdCompanions)]
    pub fn get_ad_companions(&self) -> String {
        self.ad.get_ad_companions()
    }

    #[wasm_bindgen(js_name = getAdIcons)]
    pub fn get_ad_icons(&self) -> String {
        self.ad.get_ad_icons()
    }

    #[wasm_bindgen(js_name = getAdLinear)]
    pub fn get_ad_linear(&self) -> bool {
        self.ad.get_ad_linear()
    }

    #[wasm_bindgen(js_name = getAdExpanded)]
    pub fn get_ad_expanded(&self) -> bool {
        self.ad.get_ad_expanded()
    }

    #[wasm_bindgen(js_name = getAdSkippableState)]
    pub fn get_ad_skippable_state(&self) -> bool {
        self.ad.get_ad_skippable_state()
    }
}

impl Default for VpaidAd {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_sentinel() {
        assert_eq!(duration_or_sentinel(Ok(30.0)), 30.0);
        assert_eq!(
            duration_or_sentinel(Err(Error::UnknownAttribute("duration".into()))),
            DURATION_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_message_carries_code() {
        let err = Error::MissingSlot;
        assert_eq!(error_message(&err), "[MISSING_SLOT] No slot or video slot supplied by the host");
    }
}
