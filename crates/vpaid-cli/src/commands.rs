//! CLI command implementations

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{JoinHandle, LocalSet};
use vpaid_core::headless::{HeadlessSlot, HeadlessVideo};
use vpaid_core::{
    AdConfig, AdState, AdUnit, AttributeName, CreativeData, EnvironmentVars, EventRecord,
    EventRecorder, Scheduler, VPAID_VERSION,
};

use crate::output;

/// `initAd` arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitArgs {
    pub width: u32,
    pub height: u32,
    pub view_mode: String,
    pub desired_bitrate: u32,
}

impl Default for InitArgs {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            view_mode: "normal".to_string(),
            desired_bitrate: 256,
        }
    }
}

/// One host action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    StartAd,
    StopAd,
    PauseAd,
    ResumeAd,
    ResizeAd {
        width: u32,
        height: u32,
        #[serde(default = "default_view_mode")]
        view_mode: String,
    },
    ExpandAd,
    CollapseAd,
    SkipAd,
    SetAdVolume { value: f64 },
    ClickThru,
    ToggleMute,
    /// Media position update
    Tick { current_time: f64 },
    /// Media runs to its end
    Ended,
    SetSkippable { value: bool },
    /// Let real time pass so deferred tasks can run
    Wait { ms: u64 },
}

fn default_view_mode() -> String {
    "normal".to_string()
}

fn default_media_duration() -> f64 {
    30.0
}

/// Scripted host session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: AdConfig,
    #[serde(default)]
    pub init: InitArgs,
    #[serde(default)]
    pub creative_data: CreativeData,
    /// Duration of the headless media element (seconds)
    #[serde(default = "default_media_duration")]
    pub media_duration: f64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Start, tick every `step` seconds up to `duration`, then end
    pub fn playthrough(duration: f64, step: f64) -> Self {
        let mut steps = vec![Step::StartAd];
        let mut t = step;
        while t < duration {
            steps.push(Step::Tick { current_time: t });
            t += step;
        }
        steps.push(Step::Ended);

        Self {
            config: AdConfig::default(),
            init: InitArgs::default(),
            creative_data: CreativeData::new(r#"{"videoUrl":"headless://playthrough.mp4"}"#),
            media_duration: duration,
            steps,
        }
    }
}

/// A host call the ad unit rejected
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Index into the scenario steps; `None` for `initAd`
    pub step: Option<usize>,
    pub action: String,
    pub code: String,
    pub message: String,
}

/// Result of running a scenario
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub ad_id: String,
    pub final_state: AdState,
    pub events: Vec<EventRecord>,
    pub rejections: Vec<Rejection>,
}

impl Transcript {
    pub fn quartiles(&self) -> Vec<&EventRecord> {
        self.events.iter().filter(|r| r.event.is_quartile()).collect()
    }
}

/// Scheduler backed by tokio timers on the current `LocalSet`
#[derive(Clone, Default)]
struct TokioScheduler {
    handles: Rc<RefCell<Vec<JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Wait for every scheduled task to finish
    async fn drain(&self) {
        loop {
            let handles: Vec<_> = self.handles.borrow_mut().drain(..).collect();
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "Deferred task failed");
                }
            }
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Scheduling deferred task");
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        self.handles.borrow_mut().push(handle);
    }
}

fn step_name(step: &Step) -> String {
    serde_json::to_value(step)
        .ok()
        .and_then(|v| v.get("action").and_then(|a| a.as_str()).map(String::from))
        .unwrap_or_else(|| format!("{step:?}"))
}

fn apply(ad: &AdUnit<HeadlessSlot>, video: &HeadlessVideo, step: &Step) -> vpaid_core::Result<()> {
    match step {
        Step::StartAd => ad.start_ad(),
        Step::StopAd => ad.stop_ad(),
        Step::PauseAd => ad.pause_ad(),
        Step::ResumeAd => ad.resume_ad(),
        Step::ResizeAd { width, height, view_mode } => ad.resize_ad(*width, *height, view_mode),
        Step::ExpandAd => ad.expand_ad(),
        Step::CollapseAd => ad.collapse_ad(),
        Step::SkipAd => ad.skip_ad(),
        Step::SetAdVolume { value } => ad.set_ad_volume(*value),
        Step::ClickThru => ad.click_thru(),
        Step::ToggleMute => ad.toggle_mute(),
        Step::Tick { current_time } => {
            video.advance_to(*current_time);
            Ok(())
        }
        Step::Ended => {
            video.finish();
            Ok(())
        }
        Step::SetSkippable { value } => {
            ad.set_attribute(AttributeName::SkippableState, *value);
            Ok(())
        }
        // Handled by the async driver
        Step::Wait { .. } => Ok(()),
    }
}

/// Run a scenario against a headless ad unit
pub async fn run_scenario(scenario: Scenario) -> anyhow::Result<Transcript> {
    let local = LocalSet::new();
    local.run_until(drive(scenario)).await
}

async fn drive(scenario: Scenario) -> anyhow::Result<Transcript> {
    let scheduler = TokioScheduler::default();
    let ad = Rc::new(AdUnit::<HeadlessSlot>::new(scenario.config.clone(), scheduler.clone()));
    let recorder = EventRecorder::attach(ad.dispatcher());
    let video = HeadlessVideo::with_duration(scenario.media_duration);
    let slot = HeadlessSlot::new();
    let mut rejections = Vec::new();

    tracing::info!(ad = %ad.id(), steps = scenario.steps.len(), "Running scenario");

    let init = &scenario.init;
    if let Err(e) = ad.init_ad(
        init.width,
        init.height,
        &init.view_mode,
        init.desired_bitrate,
        &scenario.creative_data,
        EnvironmentVars::new(slot, video.clone()),
    ) {
        tracing::warn!(error = %e, "initAd rejected");
        rejections.push(Rejection {
            step: None,
            action: "initAd".to_string(),
            code: e.error_code().to_string(),
            message: e.to_string(),
        });
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        if let Step::Wait { ms } = step {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            continue;
        }

        if let Err(e) = apply(&ad, &video, step) {
            tracing::warn!(step = index, error = %e, "Host call rejected");
            rejections.push(Rejection {
                step: Some(index),
                action: step_name(step),
                code: e.error_code().to_string(),
                message: e.to_string(),
            });
        }
    }

    scheduler.drain().await;

    Ok(Transcript {
        ad_id: ad.id().to_string(),
        final_state: ad.state(),
        events: recorder.records(),
        rejections,
    })
}

/// Run a scenario file and print the transcript
pub async fn run(path: &Path, format: &str) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(path)?;
    let transcript = run_scenario(scenario).await?;
    output::print_transcript(&transcript, format)
}

/// Linear playthrough, printing the quartile events
pub async fn playthrough(duration: f64, step: f64, format: &str) -> anyhow::Result<()> {
    anyhow::ensure!(duration.is_finite() && duration > 0.0, "duration must be positive and finite");
    anyhow::ensure!(step.is_finite() && step > 0.0, "step must be positive and finite");

    let transcript = run_scenario(Scenario::playthrough(duration, step)).await?;
    output::print_quartiles(&transcript, format)
}

/// Print the protocol version the ad unit negotiates
pub fn handshake(format: &str) -> anyhow::Result<()> {
    let ad = AdUnit::<HeadlessSlot>::new(AdConfig::default(), TokioScheduler::default());
    let version = ad.handshake_version(VPAID_VERSION);
    output::print_handshake(version, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpaid_core::AdEvent;

    fn events(transcript: &Transcript) -> Vec<AdEvent> {
        transcript.events.iter().map(|r| r.event).collect()
    }

    #[test]
    fn test_scenario_parsing() {
        let json = r#"{
            "init": { "width": 320, "height": 240 },
            "creative_data": { "AdParameters": "{\"videoUrl\":\"a.mp4\"}" },
            "steps": [
                { "action": "startAd" },
                { "action": "tick", "current_time": 1.5 },
                { "action": "resizeAd", "width": 800, "height": 600, "view_mode": "fullscreen" },
                { "action": "setSkippable", "value": true },
                { "action": "wait", "ms": 100 }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.init.width, 320);
        assert_eq!(scenario.init.view_mode, "normal");
        assert_eq!(scenario.media_duration, 30.0);
        assert_eq!(scenario.config, AdConfig::default());
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.steps[1], Step::Tick { current_time: 1.5 });
        assert_eq!(step_name(&scenario.steps[2]), "resizeAd");
    }

    #[test]
    fn test_unknown_action_rejected() {
        let json = r#"{ "steps": [ { "action": "rewindAd" } ] }"#;
        assert!(serde_json::from_str::<Scenario>(json).is_err());
    }

    #[test]
    fn test_playthrough_steps() {
        let scenario = Scenario::playthrough(4.0, 1.0);
        assert_eq!(scenario.steps.first(), Some(&Step::StartAd));
        assert_eq!(scenario.steps.last(), Some(&Step::Ended));
        assert_eq!(scenario.steps.len(), 5);
    }

    #[tokio::test]
    async fn test_playthrough_rejects_unbounded_input() {
        assert!(playthrough(f64::INFINITY, 1.0, "json").await.is_err());
        assert!(playthrough(f64::NAN, 1.0, "json").await.is_err());
        assert!(playthrough(10.0, 0.0, "json").await.is_err());
        assert!(playthrough(10.0, f64::INFINITY, "json").await.is_err());
    }

    #[tokio::test]
    async fn test_playthrough_emits_quartiles_and_stop() {
        let transcript = run_scenario(Scenario::playthrough(20.0, 0.5)).await.unwrap();

        assert_eq!(transcript.final_state, AdState::Stopped);
        assert!(transcript.rejections.is_empty());
        assert_eq!(
            transcript.quartiles().iter().map(|r| r.event).collect::<Vec<_>>(),
            vec![
                AdEvent::AdVideoStart,
                AdEvent::AdVideoFirstQuartile,
                AdEvent::AdVideoMidpoint,
                AdEvent::AdVideoThirdQuartile,
                AdEvent::AdVideoComplete,
            ]
        );
        assert_eq!(events(&transcript).last(), Some(&AdEvent::AdStopped));
    }

    #[tokio::test]
    async fn test_rejections_are_recorded() {
        let scenario = Scenario {
            steps: vec![Step::PauseAd, Step::StopAd, Step::StartAd],
            ..Scenario::playthrough(10.0, 1.0)
        };

        let transcript = run_scenario(scenario).await.unwrap();

        // pauseAd is accepted once media is bound; startAd after stop is not
        assert_eq!(transcript.rejections.len(), 1);
        assert_eq!(transcript.rejections[0].step, Some(2));
        assert_eq!(transcript.rejections[0].action, "startAd");
        assert_eq!(transcript.rejections[0].code, "INVALID_STATE");
        assert_eq!(events(&transcript).last(), Some(&AdEvent::AdStopped));
    }

    #[tokio::test]
    async fn test_malformed_parameters_reject_init() {
        let scenario = Scenario {
            creative_data: CreativeData::new("{not json"),
            steps: vec![Step::StartAd],
            ..Scenario::playthrough(10.0, 1.0)
        };

        let transcript = run_scenario(scenario).await.unwrap();

        assert_eq!(transcript.final_state, AdState::Uninitialized);
        assert!(transcript.events.is_empty());
        assert_eq!(transcript.rejections.len(), 2);
        assert_eq!(transcript.rejections[0].action, "initAd");
        assert_eq!(transcript.rejections[0].code, "MALFORMED_CREATIVE_PARAMETERS");
    }

    #[tokio::test]
    async fn test_wait_lets_deferred_stop_fire() {
        let scenario = Scenario {
            steps: vec![Step::StartAd, Step::StopAd, Step::Wait { ms: 200 }, Step::ClickThru],
            ..Scenario::playthrough(10.0, 1.0)
        };

        let transcript = run_scenario(scenario).await.unwrap();

        assert_eq!(
            events(&transcript),
            vec![
                AdEvent::AdLoaded,
                AdEvent::AdImpression,
                AdEvent::AdStarted,
                AdEvent::AdStopped,
            ]
        );
        assert_eq!(transcript.rejections.len(), 1);
        assert_eq!(transcript.rejections[0].action, "clickThru");
    }
}
