// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Last known good brightness.

/// Remembers the most recent successfully computed brightness.
///
/// When a frame cannot be read back (typically a cross-origin video), the
/// sampler reports this value instead of zero so that a read failure is not
/// mistaken for the scene going dark.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrightnessHistory {
    last: Option<f32>,
}

impl BrightnessHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Records a fresh reading. Non-finite values are ignored.
    pub fn record(&mut self, brightness: f32) {
        if brightness.is_finite() {
            self.last = Some(brightness.clamp(0.0, 1.0));
        }
    }

    /// Returns the last recorded reading, if any.
    #[must_use]
    pub const fn last(&self) -> Option<f32> {
        self.last
    }

    /// Forgets the recorded reading.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
