// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for flashguard.
//!
//! This crate provides integration with browser and extension APIs:
//!
//! - [`IntervalLoop`]: `setInterval` tick source for the monitor cadence
//! - [`Timeout`]: one-shot delayed callbacks (startup probes)
//! - [`DomVideo`]: `<video>` handle implementing the core video and filter
//!   traits
//! - [`CanvasCapture`]: 64×36 offscreen canvas frame capture
//! - [`DomObserver`]: `MutationObserver` for videos added after load
//! - [`SettingsStore`] / [`SettingsSubscription`]: `chrome.storage.sync`
//!   reads, writes and change notifications
//! - [`runtime`]: install and message events for the background worker

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

mod canvas;
mod interval;
mod observer;
pub mod runtime;
pub mod storage;
mod video;

pub use canvas::CanvasCapture;
pub use interval::{IntervalLoop, Timeout};
pub use observer::DomObserver;
pub use storage::{SettingsStore, SettingsSubscription};
pub use video::{DomVideo, collect_videos, video_count};

use flashguard_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microseconds.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(interval::performance_now())
}
