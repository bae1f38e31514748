//! Event recording
//!
//! Subscribes to every standard event and keeps an ordered transcript of
//! what the host would have seen.

use crate::events::{AdEvent, EventDispatcher};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A dispatched event with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Sequence number, starting at 1
    pub sequence: u64,
    /// Wall-clock dispatch time
    pub timestamp: DateTime<Utc>,
    pub event: AdEvent,
}

/// Transcript of dispatched events
#[derive(Clone, Default)]
pub struct EventRecorder {
    records: Rc<RefCell<Vec<EventRecord>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every standard event on `dispatcher`.
    /// Replaces whatever callbacks were registered for those names.
    pub fn attach(dispatcher: &EventDispatcher) -> Self {
        let recorder = Self::new();
        for event in AdEvent::ALL {
            let sink = recorder.clone();
            dispatcher.subscribe(event.as_str(), move || sink.record(event));
        }
        recorder
    }

    pub fn record(&self, event: AdEvent) {
        let mut records = self.records.borrow_mut();
        let sequence = records.len() as u64 + 1;
        records.push(EventRecord {
            sequence,
            timestamp: Utc::now(),
            event,
        });
    }

    /// Recorded events in dispatch order
    pub fn events(&self) -> Vec<AdEvent> {
        self.records.borrow().iter().map(|r| r.event).collect()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.borrow().clone()
    }

    pub fn count(&self, event: AdEvent) -> usize {
        self.records.borrow().iter().filter(|r| r.event == event).count()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}
