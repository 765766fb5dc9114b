// Copyright 2026 the FlashGuard Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brightness sampling and dimming control for video content.
//!
//! `flashguard_core` holds everything that decides *whether* and *how much*
//! to darken a playing video. It is `no_std` compatible (with `alloc`) and
//! knows nothing about the DOM: platform crates supply the video handles, the
//! frame capture and the tick source through small traits.
//!
//! # Architecture
//!
//! A monitor session turns a fixed-cadence tick into at most one filter
//! mutation on one tracked video:
//!
//! ```text
//!   TickSource (fixed cadence)
//!       │
//!       ▼
//!   Monitor::tick() ──► VideoTracker::select() ──► tracked video
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼
//!   FrameSampler::sample() ──► luminance ──► DimController::decide()
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼
//!   DimFilter::for_intensity() ──► FilterTarget::apply_filter()
//! ```
//!
//! **[`settings`]** — User configuration, normalization of stored values,
//! change deltas and install-time defaults.
//!
//! **[`luma`]** — Fixed-size analysis surface, the [`FrameCapture`] trait and
//! the perceptual luminance estimate.
//!
//! **[`history`]** — Last known good brightness, used when readback fails.
//!
//! **[`policy`]** — Threshold and gradual dimming policies, and the mapping
//! from dim intensity to visible brightness.
//!
//! **[`controller`]** — Applies a policy with an update gate and a release
//! margin so that noisy readings do not make the filter flicker.
//!
//! **[`tracker`]** — Eligibility predicate and single-active-video tracking.
//!
//! **[`filter`]** — The [`FilterTarget`] trait that platform video handles
//! implement, and the CSS values for a given intensity.
//!
//! **[`cadence`]** — Tick-source abstraction and the page lifecycle state
//! (startup probes, DOM mutation restarts, teardown).
//!
//! **[`monitor`]** — The per-page monitor instance tying everything together.
//!
//! **[`message`]** — Request/response protocol spoken with the settings popup.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! **[`time`]** — Microsecond host time used for cadence and trace stamps.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//!
//! [`FrameCapture`]: luma::FrameCapture
//! [`FilterTarget`]: filter::FilterTarget

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cadence;
pub mod controller;
pub mod filter;
pub mod history;
pub mod luma;
pub mod message;
pub mod monitor;
pub mod policy;
pub mod settings;
pub mod time;
pub mod trace;
pub mod tracker;
