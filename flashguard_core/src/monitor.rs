// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-page monitor.
//!
//! A [`Monitor`] owns all state of one monitoring session: the settings cache,
//! the tracked video, the frame sampler and the dim controller. The platform
//! calls [`Monitor::tick`] on every cadence tick with the page's current list
//! of videos; each tick performs at most one filter mutation.
//!
//! # Tick
//!
//! 1. If dimming is disabled, remove any dimming and stop.
//! 2. Select the first eligible video. If none, stop; tracking is kept.
//! 3. If it differs from the tracked video, clear the old video's filter and
//!    start fresh on the new one (no intensity or history carries over).
//! 4. Sample the frame, falling back to the last good reading.
//! 5. Ask the controller for a new intensity; apply it if there is one.
//!
//! Every failure is absorbed here: a tick always returns a [`TickOutcome`].

use crate::controller::{DimController, RELEASE_HOLD, RELEASE_MARGIN, UPDATE_GATE};
use crate::filter::{DimFilter, FilterTarget};
use crate::luma::{FrameCapture, FrameSampler, Sample};
use crate::policy::DimPolicy;
use crate::settings::{Settings, SettingsChange, StoredSettings};
use crate::time::HostTime;
use crate::trace::{
    CaptureFallbackEvent, DimChangeEvent, SettingsEvent, TickEvent, TrackChange, TrackEvent,
    Tracer,
};
use crate::tracker::{Track, VideoElement, VideoTracker};

/// Configuration for a [`Monitor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Policy used until settings name one.
    pub policy: DimPolicy,
    /// Minimum intensity change worth applying.
    pub update_gate: f32,
    /// Brightness credit applied while a release is held.
    pub release_margin: f32,
    /// Consecutive lowering readings held before the policy target applies.
    pub release_hold: u32,
}

impl MonitorConfig {
    /// Binary threshold dimming.
    #[must_use]
    pub const fn threshold() -> Self {
        Self {
            policy: DimPolicy::Threshold,
            update_gate: UPDATE_GATE,
            release_margin: RELEASE_MARGIN,
            release_hold: RELEASE_HOLD,
        }
    }

    /// Proportional dimming with a ramp below the threshold.
    #[must_use]
    pub const fn gradual() -> Self {
        Self {
            policy: DimPolicy::Gradual,
            update_gate: UPDATE_GATE,
            release_margin: RELEASE_MARGIN,
            release_hold: RELEASE_HOLD,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::threshold()
    }
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Dimming is disabled. `released` is set if an effect was lifted.
    Disabled {
        /// Whether a filter was removed on this tick.
        released: bool,
    },
    /// No eligible video on the page.
    NoVideo,
    /// Capture failed and no earlier reading exists.
    NoReading,
    /// The filter was left as is.
    Unchanged {
        /// Brightness the decision was based on.
        brightness: f32,
    },
    /// A new intensity was applied.
    Applied {
        /// Brightness the decision was based on.
        brightness: f32,
        /// The applied intensity.
        level: f32,
    },
}

/// A monitoring session for one page.
#[derive(Debug)]
pub struct Monitor<V, C> {
    config: MonitorConfig,
    settings: Settings,
    controller: DimController,
    tracker: VideoTracker<V>,
    sampler: FrameSampler<C>,
    tick_index: u64,
}

impl<V, C> Monitor<V, C>
where
    V: VideoElement + FilterTarget,
    C: FrameCapture<V>,
{
    /// Creates a monitor with default settings and nothing tracked.
    pub fn new(config: MonitorConfig, capture: C) -> Self {
        Self {
            config,
            settings: Settings::default(),
            controller: DimController::with_gate(
                config.policy,
                config.update_gate,
                config.release_margin,
                config.release_hold,
            ),
            tracker: VideoTracker::new(),
            sampler: FrameSampler::new(capture),
            tick_index: 0,
        }
    }

    /// Runs one cadence tick over the page's videos, in document order.
    pub fn tick(&mut self, now: HostTime, videos: &[V], tracer: &mut Tracer<'_>) -> TickOutcome {
        let tick_index = self.tick_index;
        self.tick_index += 1;
        tracer.tick(&TickEvent {
            tick_index,
            now,
            video_count: videos.len(),
            enabled: self.settings.enabled(),
        });

        if !self.settings.enabled() {
            let previous = self.controller.current();
            let released = self.release(tick_index, now, tracer);
            if previous > 0.0 {
                tracer.dim_change(&DimChangeEvent {
                    tick_index,
                    now,
                    brightness: 0.0,
                    previous,
                    level: 0.0,
                    visible_brightness: 1.0,
                });
            }
            return TickOutcome::Disabled { released };
        }

        let Some(video) = VideoTracker::select(videos.iter().cloned()) else {
            return TickOutcome::NoVideo;
        };

        if let Track::Adopted { previous } = self.tracker.track(video.clone()) {
            let switched = previous.is_some();
            if let Some(previous) = previous {
                previous.clear_filter();
            }
            self.controller.reset();
            self.sampler.reset();
            tracer.track(&TrackEvent {
                tick_index,
                now,
                change: TrackChange::Adopted { switched },
            });
        }

        let sample = self.sampler.sample(&video);
        match sample {
            Sample::Fresh(_) => {}
            Sample::Fallback { brightness, cause } => {
                tracer.capture_fallback(&CaptureFallbackEvent {
                    tick_index,
                    now,
                    cause,
                    fallback: Some(brightness),
                });
            }
            Sample::Unavailable { cause } => {
                tracer.capture_fallback(&CaptureFallbackEvent {
                    tick_index,
                    now,
                    cause,
                    fallback: None,
                });
            }
        }
        let Some(brightness) = sample.brightness() else {
            return TickOutcome::NoReading;
        };

        let Some(level) = self.controller.decide(brightness, &self.settings) else {
            return TickOutcome::Unchanged { brightness };
        };
        let previous = self.controller.current();
        self.controller.commit(level);
        let filter = DimFilter::for_intensity(self.controller.policy(), level);
        video.apply_filter(&filter);
        tracer.dim_change(&DimChangeEvent {
            tick_index,
            now,
            brightness,
            previous,
            level,
            visible_brightness: filter.brightness,
        });
        TickOutcome::Applied { brightness, level }
    }

    /// Replaces the settings cache with a freshly loaded record.
    ///
    /// An absent policy falls back to the configured one. If the result is
    /// disabled, dimming is removed right away.
    pub fn apply_settings(
        &mut self,
        stored: &StoredSettings,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        self.settings = Settings::from_stored(stored);
        self.set_policy(stored.policy.unwrap_or(self.config.policy), now, tracer);
        if !self.settings.enabled() {
            self.remove_dimming(now, tracer);
        }
        self.trace_settings(now, tracer);
    }

    /// Applies change notifications from the settings store.
    ///
    /// Switching dimming off removes the filter immediately instead of
    /// waiting for the next tick.
    pub fn apply_changes(
        &mut self,
        changes: &[SettingsChange],
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        if changes.is_empty() {
            return;
        }
        let was_enabled = self.settings.enabled();
        for change in changes {
            match *change {
                SettingsChange::Policy(policy) => {
                    self.set_policy(policy.unwrap_or(self.config.policy), now, tracer);
                }
                _ => self.settings.apply(change),
            }
        }
        if was_enabled && !self.settings.enabled() {
            self.remove_dimming(now, tracer);
        }
        self.trace_settings(now, tracer);
    }

    /// Switches the dimming policy.
    ///
    /// A change of policy removes the current filter; the next tick
    /// recomputes it under the new policy.
    pub fn set_policy(&mut self, policy: DimPolicy, now: HostTime, tracer: &mut Tracer<'_>) {
        if policy == self.controller.policy() {
            return;
        }
        self.remove_dimming(now, tracer);
        self.controller.set_policy(policy);
    }

    /// Clears the tracked video's filter, releases it and resets the
    /// intensity. Safe to call any number of times.
    ///
    /// Returns `true` if there was anything to remove.
    pub fn remove_dimming(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> bool {
        self.release(self.tick_index.saturating_sub(1), now, tracer)
    }

    /// Ends the session: the filter is removed and nothing stays tracked.
    pub fn teardown(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.remove_dimming(now, tracer);
        self.sampler.reset();
    }

    /// Intensity currently applied.
    #[must_use]
    pub fn current_level(&self) -> f32 {
        self.controller.current()
    }

    /// The tracked video, if any.
    #[must_use]
    pub fn tracked(&self) -> Option<&V> {
        self.tracker.active()
    }

    /// The settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> DimPolicy {
        self.controller.policy()
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_index
    }

    /// The frame sampler, for hosts that need to inspect the capture.
    #[must_use]
    pub fn sampler(&self) -> &FrameSampler<C> {
        &self.sampler
    }

    /// The capture backend, mutably.
    pub fn capture_mut(&mut self) -> &mut C {
        self.sampler.capture_mut()
    }

    fn release(&mut self, tick_index: u64, now: HostTime, tracer: &mut Tracer<'_>) -> bool {
        let had_level = self.controller.current() > 0.0;
        let released = self.tracker.release();
        if let Some(video) = &released {
            video.clear_filter();
            tracer.track(&TrackEvent {
                tick_index,
                now,
                change: TrackChange::Released,
            });
        }
        self.controller.reset();
        had_level || released.is_some()
    }

    fn trace_settings(&self, now: HostTime, tracer: &mut Tracer<'_>) {
        tracer.settings(&SettingsEvent {
            now,
            settings: self.settings,
            policy: self.controller.policy(),
        });
    }
}
