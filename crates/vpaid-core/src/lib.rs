//! VPAID Core - Linear Video Ad Unit
//!
//! This crate provides the behavioral core of a VPAID 2.0 ad unit:
//! - Attribute storage with VPAID defaults
//! - Single-listener event dispatch to the host
//! - Quartile tracking from media position updates
//! - Lifecycle state machine (init, start, pause/resume, resize, stop)
//! - A headless host for running the lifecycle outside a browser
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          VPAID Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   host ──────────────► ┌──────────────┐                         │
//! │   (VPAID calls)        │    AdUnit    │ ◄───── MediaElement     │
//! │                        │  (lifecycle) │   (timeupdate, ended)   │
//! │                        └──┬────────┬──┘                         │
//! │                           │        │                            │
//! │               ┌───────────┴──┐  ┌──┴─────────────┐              │
//! │               │  Attribute   │  │    Playback    │              │
//! │               │    Store     │  │    Monitor     │              │
//! │               └──────────────┘  └──┬─────────────┘              │
//! │                           │        │                            │
//! │                        ┌──┴────────┴──┐                         │
//! │                        │    Event     │ ──────► host callbacks  │
//! │                        │  Dispatcher  │                         │
//! │                        └──────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use vpaid_core::{AdConfig, AdUnit, CreativeData, EnvironmentVars, EventRecorder};
//! use vpaid_core::headless::{HeadlessSlot, HeadlessVideo, ManualScheduler};
//!
//! let ad = Rc::new(AdUnit::<HeadlessSlot>::new(AdConfig::default(), ManualScheduler::new()));
//! let recorder = EventRecorder::attach(ad.dispatcher());
//!
//! let video = HeadlessVideo::with_duration(30.0);
//! let data = CreativeData::new(r#"{"videoUrl":"a.mp4"}"#);
//! ad.init_ad(640, 480, "normal", 256, &data, EnvironmentVars::new(HeadlessSlot::new(), video))
//!     .unwrap();
//!
//! assert_eq!(recorder.len(), 2);
//! assert_eq!(ad.get_ad_width(), 640);
//! ```

pub mod error;
pub mod types;
pub mod attributes;
pub mod events;
pub mod quartile;
pub mod creative;
pub mod host;
pub mod ad_unit;
pub mod recorder;
pub mod headless;

pub use error::{Error, Result};
pub use types::*;
pub use attributes::{AttributeName, AttributeStore, AttributeValue};
pub use events::{AdEvent, Callback, EventDispatcher};
pub use quartile::{PlaybackMonitor, Quartile, QUARTILES};
pub use creative::{CreativeData, CreativeParameters};
pub use host::{AdSlot, EnvironmentVars, MediaElement, MediaSignal, Overlay, Scheduler, SignalHandler};
pub use ad_unit::AdUnit;
pub use recorder::{EventRecord, EventRecorder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, protocol = VPAID_VERSION, "VPAID Core initialized");
}
