// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A whole page session on a virtual clock.

use alloc::rc::Rc;
use alloc::vec::Vec;

use flashguard_core::cadence::{CadenceConfig, Lifecycle, TickSource};
use flashguard_core::monitor::{Monitor, MonitorConfig, TickOutcome};
use flashguard_core::settings::{SettingsChange, StoredSettings};
use flashguard_core::time::HostTime;
use flashguard_core::trace::{LifecycleEvent, LifecyclePhase, NoopSink, TraceSink, Tracer};

use crate::capture::ScriptedCapture;
use crate::ticker::ManualTicker;
use crate::video::{FakeVideo, FilterLog, FilterOp};

/// A monitor, its lifecycle and a fake page, driven step by step.
///
/// Each [`step`](Self::step) advances the clock by one cadence period and
/// delivers a tick if the cadence is running. Events go to the sink `S`.
#[derive(Debug)]
pub struct Scenario<S: TraceSink = NoopSink> {
    monitor: Monitor<FakeVideo, ScriptedCapture>,
    lifecycle: Lifecycle<ManualTicker>,
    videos: Vec<FakeVideo>,
    log: FilterLog,
    clock: HostTime,
    next_id: u32,
    sink: S,
}

impl Scenario {
    /// Creates an empty page with default settings, not yet started.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_sink(config, NoopSink)
    }
}

impl<S: TraceSink> Scenario<S> {
    /// Creates an empty page that reports events to `sink`.
    #[must_use]
    pub fn with_sink(config: MonitorConfig, sink: S) -> Self {
        Self {
            monitor: Monitor::new(config, ScriptedCapture::new()),
            lifecycle: Lifecycle::new(ManualTicker::new(), CadenceConfig::web()),
            videos: Vec::new(),
            log: FilterLog::default(),
            clock: HostTime(0),
            next_id: 1,
            sink,
        }
    }

    /// Appends a playing video to the page and returns a handle to it.
    pub fn add_video(&mut self) -> FakeVideo {
        let video = FakeVideo::playing(self.next_id, &self.log);
        self.next_id += 1;
        self.videos.push(video.clone());
        video
    }

    /// Appends a video that has not loaded yet.
    pub fn add_unloaded_video(&mut self) -> FakeVideo {
        let video = FakeVideo::unloaded(self.next_id, &self.log);
        self.next_id += 1;
        self.videos.push(video.clone());
        video
    }

    /// Removes a video from the page. Its style is left as is.
    pub fn remove_video(&mut self, video: &FakeVideo) {
        self.videos.retain(|v| v != video);
    }

    /// Starts the cadence. Returns `true` if this call started it.
    pub fn start(&mut self) -> bool {
        let started = self.lifecycle.start();
        if started {
            self.trace_lifecycle(LifecyclePhase::Started);
        }
        started
    }

    /// Runs a startup probe: reapplies `stored` and starts the cadence if
    /// it is not running.
    pub fn probe(&mut self, stored: &StoredSettings) -> bool {
        self.trace_lifecycle(LifecyclePhase::Probe);
        self.load_settings(stored);
        self.lifecycle.start()
    }

    /// Advances the clock one period and ticks if the cadence is running.
    pub fn step(&mut self) -> Option<TickOutcome> {
        self.clock = self.clock + self.lifecycle.config().period;
        if !self.lifecycle.source().is_running() {
            return None;
        }
        let mut tracer = Tracer::new(&mut self.sink);
        Some(self.monitor.tick(self.clock, &self.videos, &mut tracer))
    }

    /// Steps `n` times and returns the outcome of each delivered tick.
    pub fn run(&mut self, n: usize) -> Vec<TickOutcome> {
        (0..n).filter_map(|_| self.step()).collect()
    }

    /// Replaces the settings as if freshly read from the store.
    pub fn load_settings(&mut self, stored: &StoredSettings) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor.apply_settings(stored, self.clock, &mut tracer);
    }

    /// Delivers a store change notification.
    pub fn change_settings(&mut self, changes: &[SettingsChange]) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor.apply_changes(changes, self.clock, &mut tracer);
    }

    /// Reports a DOM mutation. Returns `true` if the cadence was restarted.
    pub fn mutate_dom(&mut self) -> bool {
        let restarted = self
            .lifecycle
            .on_dom_mutation(self.monitor.settings().enabled(), self.videos.len());
        if restarted {
            self.trace_lifecycle(LifecyclePhase::Restarted);
        }
        restarted
    }

    /// Unloads the page. Returns `false` if it was already unloaded.
    pub fn teardown(&mut self) -> bool {
        if !self.lifecycle.teardown() {
            return false;
        }
        let mut tracer = Tracer::new(&mut self.sink);
        self.monitor.teardown(self.clock, &mut tracer);
        self.trace_lifecycle(LifecyclePhase::TornDown);
        true
    }

    /// The monitor under test.
    #[must_use]
    pub fn monitor(&self) -> &Monitor<FakeVideo, ScriptedCapture> {
        &self.monitor
    }

    /// The capture, for scripting frames.
    pub fn capture_mut(&mut self) -> &mut ScriptedCapture {
        self.monitor.capture_mut()
    }

    /// The page lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle<ManualTicker> {
        &self.lifecycle
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock
    }

    /// Every filter mutation so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<FilterOp> {
        self.log.borrow().clone()
    }

    /// The shared filter log.
    #[must_use]
    pub fn log(&self) -> FilterLog {
        Rc::clone(&self.log)
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the scenario and returns the trace sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn trace_lifecycle(&mut self, phase: LifecyclePhase) {
        Tracer::new(&mut self.sink).lifecycle(&LifecycleEvent {
            now: self.clock,
            phase,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashguard_core::cadence::Phase;
    use flashguard_core::controller::RELEASE_HOLD;
    use flashguard_core::luma::CaptureError;
    use flashguard_core::policy::DimPolicy;
    use flashguard_core::trace::{
        CaptureFallbackEvent, DimChangeEvent, SettingsEvent, TickEvent, TrackChange, TrackEvent,
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn applied_levels(outcomes: &[TickOutcome]) -> Vec<f32> {
        outcomes
            .iter()
            .filter_map(|o| match *o {
                TickOutcome::Applied { level, .. } => Some(level),
                _ => None,
            })
            .collect()
    }

    #[derive(Debug, Default)]
    struct Counter {
        ticks: u32,
        tracks: Vec<TrackChange>,
        fallbacks: u32,
        dims: u32,
        settings: u32,
        lifecycle: Vec<LifecyclePhase>,
    }

    impl TraceSink for Counter {
        fn on_tick(&mut self, _e: &TickEvent) {
            self.ticks += 1;
        }
        fn on_track(&mut self, e: &TrackEvent) {
            self.tracks.push(e.change);
        }
        fn on_capture_fallback(&mut self, _e: &CaptureFallbackEvent) {
            self.fallbacks += 1;
        }
        fn on_dim_change(&mut self, _e: &DimChangeEvent) {
            self.dims += 1;
        }
        fn on_settings(&mut self, _e: &SettingsEvent) {
            self.settings += 1;
        }
        fn on_lifecycle(&mut self, e: &LifecycleEvent) {
            self.lifecycle.push(e.phase);
        }
    }

    #[test]
    fn bright_scene_is_dimmed_under_threshold_policy() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.8);
        s.start();

        let outcome = s.step().unwrap();
        assert!(matches!(outcome, TickOutcome::Applied { level, .. } if close(level, 0.5)));
        let filter = video.filter().unwrap();
        assert!(close(filter.brightness, 0.6));
        assert_eq!(filter.css_filter(), "brightness(0.600)");
        assert_eq!(filter.css_transition(), "filter 100ms ease-out");
    }

    #[test]
    fn dim_scene_below_ramp_is_left_alone_under_gradual_policy() {
        let mut s = Scenario::new(MonitorConfig::gradual());
        let video = s.add_video();
        video.set_scene(0.45);
        s.start();

        let outcomes = s.run(10);
        assert_eq!(outcomes.len(), 10);
        assert!(applied_levels(&outcomes).is_empty());
        assert!(video.filter().is_none());
        assert!(s.ops().is_empty());
    }

    #[test]
    fn disabling_removes_filter_at_once() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();
        assert!(video.filter().is_some());

        s.change_settings(&[SettingsChange::Enabled(Some(false))]);
        assert!(video.filter().is_none());
        assert_eq!(s.ops().last(), Some(&FilterOp::Clear { video: 1 }));
        assert_eq!(s.monitor().current_level(), 0.0);

        // The cadence keeps running while disabled; ticks do nothing.
        assert_eq!(s.step(), Some(TickOutcome::Disabled { released: false }));
        assert_eq!(s.ops().len(), 2);

        s.change_settings(&[SettingsChange::Enabled(Some(true))]);
        s.step();
        assert!(video.filter().is_some());
    }

    #[test]
    fn loading_disabled_settings_removes_filter() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();

        s.load_settings(&StoredSettings {
            enabled: Some(false),
            ..StoredSettings::default()
        });
        assert!(video.filter().is_none());
        assert!(s.monitor().tracked().is_none());
    }

    #[test]
    fn switching_videos_clears_old_before_dimming_new() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let first = s.add_video();
        let second = s.add_video();
        first.set_scene(0.9);
        second.set_scene(0.9);
        s.start();
        s.step();
        assert_eq!(s.monitor().tracked(), Some(&first));

        first.pause();
        s.step();
        assert_eq!(s.monitor().tracked(), Some(&second));
        assert!(first.filter().is_none());
        assert!(second.filter().is_some());

        let videos: Vec<(u32, bool)> = s
            .ops()
            .iter()
            .map(|op| (op.video(), matches!(op, FilterOp::Apply { .. })))
            .collect();
        assert_eq!(videos, [(1, true), (1, false), (2, true)]);
    }

    #[test]
    fn tracking_survives_a_tick_with_no_eligible_video() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();

        video.pause();
        assert_eq!(s.step(), Some(TickOutcome::NoVideo));
        assert_eq!(s.monitor().tracked(), Some(&video));
        assert!(video.filter().is_some());

        video.play();
        assert!(matches!(s.step(), Some(TickOutcome::Unchanged { .. })));
        assert_eq!(s.ops().len(), 1);
    }

    #[test]
    fn unloaded_videos_are_skipped() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let pending = s.add_unloaded_video();
        let playing = s.add_video();
        pending.set_scene(0.9);
        playing.set_scene(0.9);
        s.start();
        s.step();
        assert_eq!(s.monitor().tracked(), Some(&playing));

        pending.set_ready_state(4);
        pending.set_current_time(0.5);
        s.step();
        assert_eq!(s.monitor().tracked(), Some(&pending));
        assert!(playing.filter().is_none());
    }

    #[test]
    fn teardown_clears_once() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();

        assert!(s.teardown());
        assert!(!s.teardown());
        let clears = s
            .ops()
            .iter()
            .filter(|op| matches!(op, FilterOp::Clear { .. }))
            .count();
        assert_eq!(clears, 1);
        assert!(video.filter().is_none());
        assert_eq!(s.step(), None);
        assert!(!s.start());
    }

    #[test]
    fn oscillation_near_threshold_applies_once() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        s.add_video();
        for b in [0.62, 0.58, 0.63, 0.57, 0.62, 0.58, 0.61, 0.59] {
            s.capture_mut().push_frame(b);
        }
        s.start();

        let outcomes = s.run(8);
        assert_eq!(applied_levels(&outcomes).len(), 1);
        assert_eq!(s.ops().len(), 1);
    }

    #[test]
    fn scene_settling_just_below_threshold_releases() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();
        assert!(close(s.monitor().current_level(), 0.5));

        video.set_scene(0.58);
        let held = s.run(RELEASE_HOLD as usize);
        assert!(applied_levels(&held).is_empty(), "a short dip keeps dimming");

        let levels = applied_levels(&s.run(60));
        assert_eq!(levels, [0.0]);
        assert_eq!(s.monitor().current_level(), 0.0);
    }

    #[test]
    fn gradual_levels_rise_with_brightness() {
        let mut s = Scenario::new(MonitorConfig::gradual());
        let video = s.add_video();
        video.set_scene(1.0);
        let mut b = 0.3_f32;
        while b <= 1.0 {
            s.capture_mut().push_frame(b);
            b += 0.05;
        }
        s.start();

        let levels = applied_levels(&s.run(20));
        assert!(!levels.is_empty());
        assert!(levels.windows(2).all(|w| w[0] <= w[1]), "{levels:?}");
        assert!(close(*levels.last().unwrap(), 0.5));
    }

    #[test]
    fn cadence_lifecycle() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        assert_eq!(s.step(), None);

        // No video yet: a mutation does not start anything.
        assert!(!s.mutate_dom());
        s.add_video();
        assert!(s.mutate_dom());
        assert_eq!(s.lifecycle().phase(), Phase::Running);
        assert!(!s.mutate_dom());
        assert!(!s.start());
        assert_eq!(s.lifecycle().source().starts(), 1);

        s.change_settings(&[SettingsChange::Enabled(Some(false))]);
        assert!(s.lifecycle().source().is_running());
        assert!(s.step().is_some());

        s.teardown();
        assert!(!s.lifecycle().source().is_running());
        assert_eq!(s.lifecycle().source().stops(), 1);
        s.change_settings(&[SettingsChange::Enabled(Some(true))]);
        assert!(!s.mutate_dom());
    }

    #[test]
    fn probes_start_idempotently() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        s.add_video();
        let stored = StoredSettings {
            enabled: Some(true),
            dim_level: Some(0.3),
            ..StoredSettings::default()
        };
        assert!(s.probe(&stored));
        assert!(!s.probe(&stored));
        assert_eq!(s.lifecycle().source().starts(), 1);
        assert!(close(s.monitor().settings().dim_level(), 0.3));
    }

    #[test]
    fn capture_failure_reuses_last_reading() {
        let mut s = Scenario::with_sink(MonitorConfig::threshold(), Counter::default());
        let video = s.add_video();
        video.set_scene(0.8);
        s.start();
        s.step();

        video.set_cross_origin(true);
        let outcome = s.step().unwrap();
        assert!(matches!(outcome, TickOutcome::Unchanged { brightness } if close(brightness, 0.8)));
        assert!(video.filter().is_some());
        assert_eq!(s.sink().fallbacks, 1);
    }

    #[test]
    fn cross_origin_from_the_start_yields_no_reading() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_cross_origin(true);
        s.capture_mut().push_error(CaptureError::Readback);
        s.start();
        assert_eq!(s.step(), Some(TickOutcome::NoReading));
        assert_eq!(s.step(), Some(TickOutcome::NoReading));
        assert!(s.ops().is_empty());
    }

    #[test]
    fn teardown_reports_the_released_video() {
        let mut s = Scenario::with_sink(MonitorConfig::threshold(), Counter::default());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.run(2);
        s.teardown();
        s.teardown();

        assert_eq!(
            s.sink().tracks,
            [
                TrackChange::Adopted { switched: false },
                TrackChange::Released
            ]
        );
    }

    #[test]
    fn events_reach_the_sink() {
        let mut s = Scenario::with_sink(MonitorConfig::threshold(), Counter::default());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.run(3);
        s.change_settings(&[SettingsChange::Enabled(Some(false))]);
        s.teardown();

        let sink = s.sink();
        assert_eq!(sink.ticks, 3);
        assert_eq!(
            sink.tracks,
            [
                TrackChange::Adopted { switched: false },
                TrackChange::Released
            ]
        );
        assert_eq!(sink.dims, 1);
        assert_eq!(sink.settings, 1);
        assert_eq!(
            sink.lifecycle,
            [LifecyclePhase::Started, LifecyclePhase::TornDown]
        );
    }

    #[test]
    fn policy_from_settings_and_fallback() {
        let mut s = Scenario::new(MonitorConfig::gradual());
        s.load_settings(&StoredSettings {
            policy: Some(DimPolicy::Threshold),
            dim_level: Some(0.0),
            ..StoredSettings::default()
        });
        assert_eq!(s.monitor().policy(), DimPolicy::Threshold);
        assert!(close(s.monitor().settings().dim_level(), 0.5));

        s.change_settings(&[SettingsChange::Policy(None)]);
        assert_eq!(s.monitor().policy(), DimPolicy::Gradual);
    }

    #[test]
    fn policy_change_removes_dimming() {
        let mut s = Scenario::new(MonitorConfig::threshold());
        let video = s.add_video();
        video.set_scene(0.9);
        s.start();
        s.step();
        assert!(video.filter().is_some());

        s.change_settings(&[SettingsChange::Policy(Some(DimPolicy::Gradual))]);
        assert!(video.filter().is_none());
        s.step();
        let filter = video.filter().unwrap();
        assert_eq!(filter.css_transition(), "filter 300ms ease-in-out");
    }
}
