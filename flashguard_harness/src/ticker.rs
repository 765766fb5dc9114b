// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tick source driven by hand.

use core::cell::Cell;

use flashguard_core::cadence::TickSource;

/// Tick source that only records whether it is running.
///
/// The harness delivers ticks itself; a tick is delivered only while the
/// ticker is running.
#[derive(Debug, Default)]
pub struct ManualTicker {
    running: Cell<bool>,
    starts: Cell<u32>,
    stops: Cell<u32>,
}

impl ManualTicker {
    /// Creates a stopped ticker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the ticker went from stopped to running.
    #[must_use]
    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    /// Number of times the ticker went from running to stopped.
    #[must_use]
    pub fn stops(&self) -> u32 {
        self.stops.get()
    }
}

impl TickSource for ManualTicker {
    fn start(&self) {
        if !self.running.replace(true) {
            self.starts.set(self.starts.get() + 1);
        }
    }

    fn stop(&self) {
        if self.running.replace(false) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }
}
