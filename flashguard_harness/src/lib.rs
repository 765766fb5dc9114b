// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic fakes for running flashguard sessions without a browser.
//!
//! - [`FakeVideo`]: a video element whose readiness, playback and scene
//!   brightness are set by hand, and which logs every filter mutation
//! - [`ScriptedCapture`]: frame capture that paints uniform grey frames
//!   from a script or from the video's scene
//! - [`ManualTicker`]: a tick source the caller steps explicitly
//! - [`Scenario`]: a monitor, lifecycle, page and clock wired together

#![no_std]

extern crate alloc;

mod capture;
mod scenario;
mod ticker;
mod video;

pub use capture::ScriptedCapture;
pub use scenario::Scenario;
pub use ticker::ManualTicker;
pub use video::{FakeVideo, FilterLog, FilterOp};
