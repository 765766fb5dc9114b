// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.
//!
//! Tick events are the bulk of the stream at ~30 Hz; they are skipped unless
//! [`with_ticks`](PrettyPrintSink::with_ticks) is set.

use std::io::Write;

use flashguard_core::time::HostTime;
use flashguard_core::trace::{
    CaptureFallbackEvent, DimChangeEvent, LifecycleEvent, LifecyclePhase, SettingsEvent,
    TickEvent, TraceSink, TrackChange, TrackEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    ticks: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            ticks: false,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            ticks: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            ticks: false,
        }
    }

    /// Also prints a line for every tick.
    #[must_use]
    pub fn with_ticks(mut self, ticks: bool) -> Self {
        self.ticks = ticks;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.as_millis_f64()
}

fn lifecycle_name(phase: LifecyclePhase) -> &'static str {
    match phase {
        LifecyclePhase::Started => "started",
        LifecyclePhase::Probe => "probe",
        LifecyclePhase::Restarted => "restarted",
        LifecyclePhase::TornDown => "torn-down",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        if !self.ticks {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[tick] #{} at {:.1}ms videos={} enabled={}",
            e.tick_index,
            ms(e.now),
            e.video_count,
            e.enabled,
        );
    }

    fn on_track(&mut self, e: &TrackEvent) {
        let what = match e.change {
            TrackChange::Adopted { switched: true } => "switched to new video",
            TrackChange::Adopted { switched: false } => "tracking video",
            TrackChange::Released => "released video",
        };
        let _ = writeln!(
            self.writer,
            "[track] #{} at {:.1}ms {what}",
            e.tick_index,
            ms(e.now),
        );
    }

    fn on_capture_fallback(&mut self, e: &CaptureFallbackEvent) {
        let _ = match e.fallback {
            Some(b) => writeln!(
                self.writer,
                "[capture] #{} {}; reusing brightness {b:.3}",
                e.tick_index, e.cause,
            ),
            None => writeln!(
                self.writer,
                "[capture] #{} {}; no reading",
                e.tick_index, e.cause,
            ),
        };
    }

    fn on_dim_change(&mut self, e: &DimChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[dim] #{} at {:.1}ms brightness={:.3} level {:.3} -> {:.3} (visible {:.3})",
            e.tick_index,
            ms(e.now),
            e.brightness,
            e.previous,
            e.level,
            e.visible_brightness,
        );
    }

    fn on_settings(&mut self, e: &SettingsEvent) {
        let _ = writeln!(
            self.writer,
            "[settings] at {:.1}ms enabled={} dim={:.2} threshold={:.2} policy={}",
            ms(e.now),
            e.settings.enabled(),
            e.settings.dim_level(),
            e.settings.brightness_threshold(),
            e.policy.as_str(),
        );
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let _ = writeln!(
            self.writer,
            "[lifecycle] at {:.1}ms {}",
            ms(e.now),
            lifecycle_name(e.phase),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashguard_core::luma::CaptureError;
    use flashguard_core::policy::DimPolicy;
    use flashguard_core::settings::Settings;

    fn tick() -> TickEvent {
        TickEvent {
            tick_index: 3,
            now: HostTime(99_000),
            video_count: 1,
            enabled: true,
        }
    }

    #[test]
    fn ticks_are_quiet_by_default() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_tick(&tick());
        assert!(sink.writer.is_empty());

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_ticks(true);
        sink.on_tick(&tick());
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[tick] #3 at 99.0ms"), "got: {output}");
    }

    #[test]
    fn pretty_print_dim_change() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_dim_change(&DimChangeEvent {
            tick_index: 12,
            now: HostTime(396_000),
            brightness: 0.8,
            previous: 0.0,
            level: 0.5,
            visible_brightness: 0.6,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.starts_with("[dim] #12"), "got: {output}");
        assert!(output.contains("level 0.000 -> 0.500"), "got: {output}");
        assert!(output.contains("(visible 0.600)"), "got: {output}");
    }

    #[test]
    fn pretty_print_fallback_and_settings() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_capture_fallback(&CaptureFallbackEvent {
            tick_index: 1,
            now: HostTime(0),
            cause: CaptureError::Readback,
            fallback: Some(0.25),
        });
        sink.on_settings(&SettingsEvent {
            now: HostTime(0),
            settings: Settings::default(),
            policy: DimPolicy::Gradual,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("reusing brightness 0.250"), "got: {output}");
        assert!(output.contains("policy=gradual"), "got: {output}");
    }
}
