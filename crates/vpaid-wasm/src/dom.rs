//! DOM bindings for the host collaborators
//!
//! The page's slot `<div>`, its `<video>` element, `window.setTimeout`, and
//! an optional JS overlay builder, wrapped so the core ad unit can drive them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use vpaid_core::{
    AdSlot, CreativeParameters, Error, MediaElement, MediaSignal, Overlay, Result, Scheduler,
    SignalHandler,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlVideoElement};

/// Best-effort text for a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| js_sys::JSON::stringify(value).ok().map(String::from))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn media_error(context: &str, value: JsValue) -> Error {
    Error::media(format!("{context}: {}", describe(&value)))
}

/// `<video>` element the creative plays on
pub struct WebVideo {
    element: HtmlVideoElement,
    /// Attached listeners, detached again on drop
    listeners: RefCell<Vec<(&'static str, Closure<dyn FnMut()>)>>,
}

impl WebVideo {
    pub fn new(element: HtmlVideoElement) -> Self {
        Self {
            element,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl MediaElement for WebVideo {
    fn set_source(&self, url: &str) -> Result<()> {
        self.element
            .set_attribute("src", url)
            .map_err(|e| media_error("set src", e))
    }

    fn set_dimensions(&self, width: u32, height: u32) -> Result<()> {
        self.element.set_width(width);
        self.element.set_height(height);
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let promise = self.element.play().map_err(|e| media_error("play", e))?;

        // Autoplay policies reject the promise asynchronously
        let on_reject = Closure::once(|reason: JsValue| {
            web_sys::console::warn_2(&"[VPAID WASM] play() rejected:".into(), &reason);
        });
        let _ = promise.catch(&on_reject);
        on_reject.forget();

        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.element.pause().map_err(|e| media_error("pause", e))
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn seek(&self, position: f64) -> Result<()> {
        self.element.set_current_time(position);
        Ok(())
    }

    fn observe(&self, signal: MediaSignal, handler: SignalHandler) -> Result<()> {
        let event_name = signal.event_name();
        let closure = Closure::<dyn FnMut()>::new(move || handler());
        self.element
            .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())
            .map_err(|e| media_error("addEventListener", e))?;
        self.listeners.borrow_mut().push((event_name, closure));
        Ok(())
    }
}

impl Drop for WebVideo {
    fn drop(&mut self) {
        for (event_name, closure) in self.listeners.get_mut().drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
        }
    }
}

/// Host container `<div>`; also the fullscreen target for `expandAd`
pub struct WebSlot {
    element: Element,
}

impl WebSlot {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl AdSlot for WebSlot {
    type Media = WebVideo;

    fn create_media_element(&self) -> Result<WebVideo> {
        let document = self
            .element
            .owner_document()
            .or_else(|| web_sys::window().and_then(|w| w.document()))
            .ok_or_else(|| Error::media("no document to create a video element in"))?;

        let video = document
            .create_element("video")
            .map_err(|e| media_error("createElement", e))?
            .dyn_into::<HtmlVideoElement>()
            .map_err(|_| Error::media("created element is not a video"))?;

        self.element
            .append_child(&video)
            .map_err(|e| media_error("appendChild", e))?;

        Ok(WebVideo::new(video))
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.element
            .request_fullscreen()
            .map_err(|e| media_error("requestFullscreen", e))
    }
}

/// `window.setTimeout` scheduler
pub struct WindowScheduler;

impl Scheduler for WindowScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let Some(window) = web_sys::window() else {
            web_sys::console::warn_1(&"[VPAID WASM] No window, running deferred task now".into());
            task();
            return;
        };

        let callback = Closure::once_into_js(move || task());
        let timeout = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout)
        {
            web_sys::console::error_2(&"[VPAID WASM] setTimeout failed:".into(), &e);
        }
    }
}

/// Overlay built by a JS function receiving the creative parameters
#[derive(Clone, Default)]
pub struct JsOverlay {
    builder: Rc<RefCell<Option<js_sys::Function>>>,
}

impl JsOverlay {
    pub fn set_builder(&self, builder: js_sys::Function) {
        *self.builder.borrow_mut() = Some(builder);
    }
}

impl Overlay for JsOverlay {
    fn build(&self, parameters: &CreativeParameters) -> Result<()> {
        let Some(builder) = self.builder.borrow().clone() else {
            return Ok(());
        };

        let value = parameters
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| Error::media(format!("overlay parameters: {e}")))?;
        builder
            .call1(&JsValue::NULL, &value)
            .map(|_| ())
            .map_err(|e| media_error("overlay builder", e))
    }
}
