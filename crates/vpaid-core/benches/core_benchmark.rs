//! Benchmark tests for vpaid-core operations
//!
//! Run with: cargo bench -p vpaid-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::rc::Rc;

use vpaid_core::headless::{HeadlessSlot, HeadlessVideo, ManualScheduler};
use vpaid_core::{
    AdConfig, AdEvent, AdUnit, AttributeStore, CreativeData, CreativeParameters,
    EnvironmentVars, EventDispatcher, PlaybackMonitor,
};

// ============================================================================
// Helpers
// ============================================================================

/// Creative parameters with `extra_fields` overlay entries besides the video URL
fn generate_parameters(extra_fields: usize) -> String {
    let mut fields = vec![r#""videoUrl":"https://cdn.example.com/ad.mp4""#.to_string()];
    for i in 0..extra_fields {
        fields.push(format!(r#""field_{i}":"https://cdn.example.com/img/{i}.png""#));
    }
    format!("{{{}}}", fields.join(","))
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Event Dispatch");

    let dispatcher = EventDispatcher::new();
    for event in AdEvent::ALL {
        dispatcher.subscribe(event.as_str(), || {});
    }

    group.bench_function("emit subscribed", |b| {
        b.iter(|| black_box(dispatcher.emit(black_box(AdEvent::AdVideoMidpoint))))
    });

    group.bench_function("dispatch unsubscribed", |b| {
        b.iter(|| black_box(dispatcher.dispatch(black_box("AdUserClose"))))
    });

    group.finish();
}

// ============================================================================
// Quartile Benchmarks
// ============================================================================

fn bench_quartile_observation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quartile Observation");

    // timeupdate fires roughly every 250ms
    for &duration in &[15.0f64, 30.0, 120.0] {
        group.bench_with_input(
            BenchmarkId::new("full playthrough", duration as u64),
            &duration,
            |b, &duration| {
                b.iter(|| {
                    let mut monitor = PlaybackMonitor::new();
                    let mut t = 0.0;
                    while t <= duration {
                        black_box(monitor.observe(t, duration));
                        t += 0.25;
                    }
                    monitor
                });
            },
        );
    }

    group.finish();
}

fn bench_headless_lifecycle(c: &mut Criterion) {
    let data = CreativeData::new(generate_parameters(4));

    c.bench_function("init + 30s playthrough + stop", |b| {
        b.iter(|| {
            let scheduler = ManualScheduler::new();
            let ad = Rc::new(AdUnit::<HeadlessSlot>::new(AdConfig::default(), scheduler.clone()));
            let video = HeadlessVideo::with_duration(30.0);
            ad.init_ad(640, 480, "normal", 256, &data, EnvironmentVars::new(HeadlessSlot::new(), video.clone()))
                .unwrap();
            ad.start_ad().unwrap();

            let mut t = 0.0;
            while t < 30.0 {
                video.advance_to(t);
                t += 0.25;
            }
            video.finish();
            scheduler.run_pending()
        });
    });
}

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_parameter_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Creative Parameters");

    for &fields in &[0usize, 10, 100] {
        let raw = generate_parameters(fields);
        group.bench_with_input(BenchmarkId::new("parse", fields), &raw, |b, raw| {
            b.iter(|| CreativeParameters::parse(black_box(raw)).unwrap());
        });
    }

    group.finish();
}

fn bench_attribute_reads(c: &mut Criterion) {
    let store = AttributeStore::new();
    c.bench_function("attribute get by name", |b| {
        b.iter(|| black_box(store.get(black_box("remainingTime")).is_ok()))
    });
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_quartile_observation,
    bench_headless_lifecycle,
    bench_parameter_parsing,
    bench_attribute_reads,
);
criterion_main!(benches);
