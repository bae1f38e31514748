//! Headless playthrough example
//!
//! Drives an ad through a full linear playthrough without a browser and
//! prints every event the host would receive.
//!
//! Run with: cargo run -p vpaid-core --example playthrough

use std::rc::Rc;

use vpaid_core::headless::{HeadlessSlot, ManualScheduler};
use vpaid_core::{AdConfig, AdUnit, CreativeData, EnvironmentVars, EventRecorder};

fn main() -> vpaid_core::Result<()> {
    println!("VPAID Core - Headless Playthrough");
    println!("=================================\n");

    let scheduler = ManualScheduler::new();
    let ad = Rc::new(AdUnit::new(AdConfig::default(), scheduler.clone()));
    let recorder = EventRecorder::attach(ad.dispatcher());

    println!("Handshake: {}", ad.handshake_version("2.0"));

    // No video slot: the ad creates its own element in the slot
    let slot = HeadlessSlot::with_duration(30.0);
    let data = CreativeData::new(r#"{"videoUrl":"https://cdn.example.com/ad.mp4"}"#);
    ad.init_ad(640, 480, "normal", 256, &data, EnvironmentVars::slot_only(slot.clone()))?;
    ad.start_ad()?;

    let video = ad.media().ok_or(vpaid_core::Error::MissingSlot)?;
    let mut t = 0.0;
    while t < 30.0 {
        video.advance_to(t);
        t += 0.5;
    }
    video.finish();
    scheduler.run_pending();

    println!("\nEvents:");
    println!("-------");
    for record in recorder.records() {
        println!("  #{:<3} {}", record.sequence, record.event);
    }

    println!("\nFinal state: {}", ad.state());
    Ok(())
}
