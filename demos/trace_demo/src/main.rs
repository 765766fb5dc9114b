// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated page session that exercises the tracing and diagnostics pipeline.
//!
//! Plays a scripted brightness sequence (a dark scene, a flash, a strobe near
//! the threshold, a cross-origin stretch and a second video taking over)
//! through a [`Scenario`], printing events with a
//! [`PrettyPrintSink`](flashguard_debug::pretty::PrettyPrintSink) while a
//! [`RecorderSink`](flashguard_debug::recorder::RecorderSink) captures them,
//! then exports a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use flashguard_core::monitor::MonitorConfig;
use flashguard_core::settings::{SettingsChange, StoredSettings};
use flashguard_core::trace::{
    CaptureFallbackEvent, DimChangeEvent, LifecycleEvent, SettingsEvent, TickEvent, TraceSink,
    TrackEvent,
};
use flashguard_debug::pretty::PrettyPrintSink;
use flashguard_debug::recorder::RecorderSink;
use flashguard_harness::Scenario;

/// Forwards every event to both sinks.
#[derive(Debug)]
struct Tee {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_tick(&mut self, e: &TickEvent) {
        self.pretty.on_tick(e);
        self.recorder.on_tick(e);
    }

    fn on_track(&mut self, e: &TrackEvent) {
        self.pretty.on_track(e);
        self.recorder.on_track(e);
    }

    fn on_capture_fallback(&mut self, e: &CaptureFallbackEvent) {
        self.pretty.on_capture_fallback(e);
        self.recorder.on_capture_fallback(e);
    }

    fn on_dim_change(&mut self, e: &DimChangeEvent) {
        self.pretty.on_dim_change(e);
        self.recorder.on_dim_change(e);
    }

    fn on_settings(&mut self, e: &SettingsEvent) {
        self.pretty.on_settings(e);
        self.recorder.on_settings(e);
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.pretty.on_lifecycle(e);
        self.recorder.on_lifecycle(e);
    }
}

fn main() {
    let sinks = Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: RecorderSink::new(),
    };
    let mut scenario = Scenario::with_sink(MonitorConfig::gradual(), sinks);

    // -- page --------------------------------------------------------------
    let first = scenario.add_video();
    let second = scenario.add_unloaded_video();
    scenario.load_settings(&StoredSettings {
        enabled: Some(true),
        dim_level: Some(0.6),
        brightness_threshold: Some(0.6),
        policy: None,
    });
    scenario.start();

    // -- dark scene, then a flash -------------------------------------------
    first.set_scene(0.1);
    scenario.run(30);
    first.set_scene(0.95);
    scenario.run(15);

    // -- strobe around the threshold -----------------------------------------
    for i in 0..30 {
        let b = if i % 2 == 0 { 0.62 } else { 0.57 };
        scenario.capture_mut().push_frame(b);
    }
    scenario.run(30);

    // -- readback refused -----------------------------------------------------
    first.set_cross_origin(true);
    scenario.run(10);
    first.set_cross_origin(false);
    first.set_scene(0.2);
    scenario.run(10);

    // -- a second video takes over --------------------------------------------
    first.pause();
    second.set_ready_state(4);
    second.set_current_time(0.1);
    second.set_scene(0.8);
    scenario.run(15);

    // -- the user switches dimming off, then leaves the page ------------------
    scenario.change_settings(&[SettingsChange::Enabled(Some(false))]);
    scenario.run(5);
    scenario.teardown();

    let ticks = scenario.monitor().tick_count();
    let sinks = scenario.into_sink();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    flashguard_debug::chrome::export(sinks.recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({ticks} ticks)");
}
