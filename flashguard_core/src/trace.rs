// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the monitor loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! monitor calls at each stage of a tick. All method bodies default to no-ops,
//! so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::luma::CaptureError;
use crate::policy::DimPolicy;
use crate::settings::Settings;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How tracking changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackChange {
    /// A video became the tracked one. `switched` is set when another video
    /// was tracked before and has had its filter removed.
    Adopted {
        /// Whether a previous video was released first.
        switched: bool,
    },
    /// The tracked video was released and nothing replaced it.
    Released,
}

/// Page lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// The cadence was started.
    Started,
    /// A startup probe fired.
    Probe,
    /// A DOM mutation restarted the cadence.
    Restarted,
    /// The page is going away; everything was stopped and cleared.
    TornDown,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of every tick.
#[derive(Clone, Copy, Debug)]
pub struct TickEvent {
    /// Monotonic tick counter.
    pub tick_index: u64,
    /// Host time of the tick.
    pub now: HostTime,
    /// Number of video elements on the page.
    pub video_count: usize,
    /// Whether dimming is enabled.
    pub enabled: bool,
}

/// Emitted when the tracked video changes.
#[derive(Clone, Copy, Debug)]
pub struct TrackEvent {
    /// Tick counter.
    pub tick_index: u64,
    /// Host time of the change.
    pub now: HostTime,
    /// What happened.
    pub change: TrackChange,
}

/// Emitted when a frame could not be captured.
#[derive(Clone, Copy, Debug)]
pub struct CaptureFallbackEvent {
    /// Tick counter.
    pub tick_index: u64,
    /// Host time of the attempt.
    pub now: HostTime,
    /// Why capture failed.
    pub cause: CaptureError,
    /// Brightness reused instead, if any.
    pub fallback: Option<f32>,
}

/// Emitted whenever a new intensity is applied.
#[derive(Clone, Copy, Debug)]
pub struct DimChangeEvent {
    /// Tick counter.
    pub tick_index: u64,
    /// Host time of the change.
    pub now: HostTime,
    /// Brightness reading that triggered the change.
    pub brightness: f32,
    /// Intensity before the change.
    pub previous: f32,
    /// Intensity after the change.
    pub level: f32,
    /// Resulting CSS brightness multiplier.
    pub visible_brightness: f32,
}

/// Emitted when settings are loaded or changed.
#[derive(Clone, Copy, Debug)]
pub struct SettingsEvent {
    /// Host time the settings took effect.
    pub now: HostTime,
    /// Normalized settings now in effect.
    pub settings: Settings,
    /// Active policy.
    pub policy: DimPolicy,
}

/// Emitted on page lifecycle transitions.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleEvent {
    /// Host time of the transition.
    pub now: HostTime,
    /// Which transition.
    pub phase: LifecyclePhase,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the monitor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of each tick.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when the tracked video changes.
    fn on_track(&mut self, e: &TrackEvent) {
        _ = e;
    }

    /// Called when frame capture fails.
    fn on_capture_fallback(&mut self, e: &CaptureFallbackEvent) {
        _ = e;
    }

    /// Called when a new intensity is applied.
    fn on_dim_change(&mut self, e: &DimChangeEvent) {
        _ = e;
    }

    /// Called when settings take effect.
    fn on_settings(&mut self, e: &SettingsEvent) {
        _ = e;
    }

    /// Called on lifecycle transitions.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick(&mut self, e: &TickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TrackEvent`].
    #[inline]
    pub fn track(&mut self, e: &TrackEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_track(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CaptureFallbackEvent`].
    #[inline]
    pub fn capture_fallback(&mut self, e: &CaptureFallbackEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_capture_fallback(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DimChangeEvent`].
    #[inline]
    pub fn dim_change(&mut self, e: &DimChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dim_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SettingsEvent`].
    #[inline]
    pub fn settings(&mut self, e: &SettingsEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_settings(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LifecycleEvent`].
    #[inline]
    pub fn lifecycle(&mut self, e: &LifecycleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_lifecycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            tick_index: 42,
            now: HostTime(1_386_000),
            video_count: 2,
            enabled: true,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick(&sample_tick());
        sink.on_dim_change(&DimChangeEvent {
            tick_index: 42,
            now: HostTime(0),
            brightness: 0.8,
            previous: 0.0,
            level: 0.5,
            visible_brightness: 0.6,
        });
        sink.on_lifecycle(&LifecycleEvent {
            now: HostTime(0),
            phase: LifecyclePhase::TornDown,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.tick(&sample_tick());
        tracer.track(&TrackEvent {
            tick_index: 42,
            now: HostTime(0),
            change: TrackChange::Released,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            ticks: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_tick(&mut self, e: &TickEvent) {
                self.ticks.push(e.tick_index);
            }
        }

        let mut sink = RecordingSink { ticks: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.tick(&sample_tick());
        drop(tracer);
        assert_eq!(sink.ticks, &[42]);
    }
}
