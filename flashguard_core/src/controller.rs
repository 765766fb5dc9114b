// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dim level control with update gating.
//!
//! The [`DimController`] turns a brightness reading into a new dim intensity
//! to apply, or `None` when the filter should be left alone. Two rules keep
//! the filter from flickering on noisy input:
//!
//! - **Update gate**: a new target is applied only if it differs from the
//!   current intensity by more than [`UPDATE_GATE`].
//! - **Release hold**: for up to [`RELEASE_HOLD`] consecutive readings that
//!   would lower the intensity, the reading is credited with
//!   [`RELEASE_MARGIN`] of extra brightness. A brief dip just below the
//!   threshold therefore does not undo dimming, while a sustained reading
//!   settles on the policy's own target once the hold runs out.
//!
//! Two exceptions bypass the gate: when dimming is disabled, and when the
//! target is exactly zero. Both must always lift an existing effect.

use crate::policy::DimPolicy;
use crate::settings::Settings;

/// Minimum change in intensity worth applying.
pub const UPDATE_GATE: f32 = 0.05;

/// Extra brightness a reading is credited with while a release is held.
pub const RELEASE_MARGIN: f32 = 0.05;

/// Consecutive lowering readings held back before the margin stops applying.
///
/// Three readings span about 100 ms at the web cadence.
pub const RELEASE_HOLD: u32 = 3;

/// Tracks the applied intensity and decides on updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DimController {
    policy: DimPolicy,
    update_gate: f32,
    release_margin: f32,
    release_hold: u32,
    current: f32,
    lowering: u32,
}

impl DimController {
    /// Creates a controller with the default gate and release hold.
    #[must_use]
    pub const fn new(policy: DimPolicy) -> Self {
        Self::with_gate(policy, UPDATE_GATE, RELEASE_MARGIN, RELEASE_HOLD)
    }

    /// Creates a controller with an explicit gate and release hold.
    #[must_use]
    pub const fn with_gate(
        policy: DimPolicy,
        update_gate: f32,
        release_margin: f32,
        release_hold: u32,
    ) -> Self {
        Self {
            policy,
            update_gate,
            release_margin,
            release_hold,
            current: 0.0,
            lowering: 0,
        }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> DimPolicy {
        self.policy
    }

    /// Switches policy. The applied intensity is left as is.
    pub fn set_policy(&mut self, policy: DimPolicy) {
        self.policy = policy;
    }

    /// Returns the intensity last committed.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Computes the policy's target intensity, before holding and gating.
    #[must_use]
    pub fn target(&self, brightness: f32, settings: &Settings) -> f32 {
        if !settings.enabled() {
            return 0.0;
        }
        self.policy.target_intensity(brightness, settings)
    }

    /// Returns the new intensity to apply, or `None` to leave the filter as
    /// it is.
    ///
    /// Each call counts towards the release hold, so feed it one reading per
    /// tick.
    #[must_use]
    pub fn decide(&mut self, brightness: f32, settings: &Settings) -> Option<f32> {
        let mut target = self.target(brightness, settings);
        if target < self.current && settings.enabled() {
            self.lowering = self.lowering.saturating_add(1);
            if self.lowering <= self.release_hold {
                let held = self
                    .policy
                    .target_intensity(brightness + self.release_margin, settings);
                target = target.max(held.min(self.current));
            }
        } else {
            self.lowering = 0;
        }
        if target == 0.0 {
            return (self.current > 0.0).then_some(0.0);
        }
        ((target - self.current).abs() > self.update_gate).then_some(target)
    }

    /// Records that `level` has been applied.
    pub fn commit(&mut self, level: f32) {
        self.current = level.clamp(0.0, 1.0);
        self.lowering = 0;
    }

    /// Forgets the applied intensity, e.g. after the filter was removed.
    pub fn reset(&mut self) {
        self.current = 0.0;
        self.lowering = 0;
    }
}
