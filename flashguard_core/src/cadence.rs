// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick cadence and page lifecycle.
//!
//! The monitor runs on a fixed-period timer that is independent of rendering.
//! The timer itself is a [`TickSource`] supplied by the platform (an interval
//! timer on the web, a manual ticker in tests). [`Lifecycle`] owns the source
//! and tracks the page-level state around it:
//!
//! ```text
//!   Idle ──start()──► Running ──teardown()──► TornDown
//!     ▲                  │
//!     └──── (source stopped externally) ─ on_dom_mutation() restarts
//! ```
//!
//! Starting is idempotent: startup probes and DOM mutations may call
//! [`Lifecycle::start`] any number of times and only the first call that
//! finds the source stopped starts it. Once torn down, nothing restarts.

use crate::time::Duration;

/// Timing configuration for the monitor cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CadenceConfig {
    /// Period between ticks.
    pub period: Duration,
    /// Delays after document ready at which startup is retried, for videos
    /// that load late.
    pub startup_probes: [Duration; 2],
}

impl CadenceConfig {
    /// Default configuration for browser content scripts (~30 Hz).
    #[must_use]
    pub const fn web() -> Self {
        Self {
            period: Duration::from_millis(33),
            startup_probes: [Duration::from_millis(1000), Duration::from_millis(3000)],
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// A periodic tick generator.
///
/// Methods take `&self` because platform sources share their state with the
/// callback they schedule.
pub trait TickSource {
    /// Starts ticking. No-op if already running.
    fn start(&self);

    /// Stops ticking. No-op if not running.
    fn stop(&self);

    /// Returns `true` while ticks are being delivered.
    fn is_running(&self) -> bool;
}

/// Lifecycle state of a page session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Created but the cadence has not been started.
    Idle,
    /// The cadence has been started.
    Running,
    /// The page is gone. Terminal.
    TornDown,
}

/// Owns the tick source and the page lifecycle state.
#[derive(Debug)]
pub struct Lifecycle<T> {
    source: T,
    config: CadenceConfig,
    phase: Phase,
}

impl<T: TickSource> Lifecycle<T> {
    /// Wraps a stopped tick source.
    pub fn new(source: T, config: CadenceConfig) -> Self {
        Self {
            source,
            config,
            phase: Phase::Idle,
        }
    }

    /// Starts the cadence if it is not already running.
    ///
    /// Returns `true` if this call started it.
    pub fn start(&mut self) -> bool {
        if self.phase == Phase::TornDown || self.source.is_running() {
            return false;
        }
        self.source.start();
        self.phase = Phase::Running;
        true
    }

    /// Reacts to a change in the page's DOM.
    ///
    /// Restarts the cadence when dimming is enabled, the page has at least
    /// one video and the cadence is not running. Returns `true` if the
    /// cadence was started.
    pub fn on_dom_mutation(&mut self, enabled: bool, video_count: usize) -> bool {
        if !enabled || video_count == 0 {
            return false;
        }
        self.start()
    }

    /// Stops the cadence for good.
    ///
    /// Returns `false` if the session was already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.phase == Phase::TornDown {
            return false;
        }
        self.source.stop();
        self.phase = Phase::TornDown;
        true
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the cadence configuration.
    #[must_use]
    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    /// Returns the tick source.
    #[must_use]
    pub fn source(&self) -> &T {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[derive(Debug, Default)]
    struct Flag {
        running: Cell<bool>,
        starts: Cell<u32>,
    }

    impl TickSource for Flag {
        fn start(&self) {
            if !self.running.replace(true) {
                self.starts.set(self.starts.get() + 1);
            }
        }
        fn stop(&self) {
            self.running.set(false);
        }
        fn is_running(&self) -> bool {
            self.running.get()
        }
    }

    #[test]
    fn web_preset() {
        let c = CadenceConfig::web();
        assert_eq!(c.period.as_millis(), 33);
        assert_eq!(c.startup_probes[0].as_millis(), 1000);
        assert_eq!(c.startup_probes[1].as_millis(), 3000);
    }

    #[test]
    fn probes_start_only_once() {
        let mut l = Lifecycle::new(Flag::default(), CadenceConfig::web());
        assert_eq!(l.phase(), Phase::Idle);
        assert!(l.start());
        assert!(!l.start(), "document-ready probe");
        assert!(!l.start(), "+1s probe");
        assert_eq!(l.source().starts.get(), 1);
        assert_eq!(l.phase(), Phase::Running);
    }

    #[test]
    fn dom_mutation_restarts_stopped_cadence() {
        let mut l = Lifecycle::new(Flag::default(), CadenceConfig::web());
        assert!(!l.on_dom_mutation(true, 0), "no videos yet");
        assert!(!l.on_dom_mutation(false, 3), "disabled");
        assert!(l.on_dom_mutation(true, 1));
        assert!(!l.on_dom_mutation(true, 1), "already running");

        l.source().stop();
        assert!(l.on_dom_mutation(true, 2));
        assert_eq!(l.source().starts.get(), 2);
    }

    #[test]
    fn teardown_is_terminal() {
        let mut l = Lifecycle::new(Flag::default(), CadenceConfig::web());
        l.start();
        assert!(l.teardown());
        assert!(!l.source().is_running());
        assert!(!l.teardown());
        assert!(!l.start());
        assert!(!l.on_dom_mutation(true, 5));
        assert_eq!(l.phase(), Phase::TornDown);
    }
}
